//! Bounded polling of read operations.

use std::time::Duration;

use tracing::debug;

use super::provider::{OcrError, ReadOperation, ReadOutcome, ReadProvider, ReadStatus};

/// How often and how long to poll a pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

/// Poll `operation` until it leaves the pending state.
///
/// Returns `OcrError::Timeout` once `max_attempts` polls have all come back
/// pending.
pub async fn poll_until_complete(
    provider: &dyn ReadProvider,
    operation: &ReadOperation,
    policy: &PollPolicy,
) -> Result<ReadOutcome, OcrError> {
    for attempt in 1..=policy.max_attempts {
        match provider.poll(operation).await? {
            ReadStatus::Succeeded(pages) => return Ok(ReadOutcome::Succeeded(pages)),
            ReadStatus::Failed => return Ok(ReadOutcome::Unreadable),
            ReadStatus::Pending => {
                debug!(
                    "{}: operation {} pending (poll {}/{})",
                    provider.name(),
                    operation.id(),
                    attempt,
                    policy.max_attempts
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    Err(OcrError::Timeout {
        attempts: policy.max_attempts,
    })
}

/// Submit an image and wait for its terminal outcome.
pub async fn read_image(
    provider: &dyn ReadProvider,
    image_url: &str,
    policy: &PollPolicy,
) -> Result<ReadOutcome, OcrError> {
    let operation = provider.submit(image_url).await?;
    debug!(
        "{}: submitted {} as operation {}",
        provider.name(),
        image_url,
        operation.id()
    );
    poll_until_complete(provider, &operation, policy).await
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ocr::provider::{RecognizedLine, RecognizedPage};

    /// Provider that replays a fixed sequence of poll statuses.
    struct ScriptedProvider {
        statuses: Mutex<VecDeque<ReadStatus>>,
        polls: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(statuses: Vec<ReadStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                polls: Mutex::new(0),
            }
        }

        fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ReadProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn submit(&self, image_url: &str) -> Result<ReadOperation, OcrError> {
            if image_url.is_empty() {
                return Err(OcrError::Permanent("empty image url".into()));
            }
            Ok(ReadOperation::new("ops/1"))
        }

        async fn poll(&self, _operation: &ReadOperation) -> Result<ReadStatus, OcrError> {
            *self.polls.lock().unwrap() += 1;
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ReadStatus::Pending))
        }
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_polls_until_succeeded() {
        let pages = vec![RecognizedPage {
            page: 1,
            lines: vec![RecognizedLine::new("12345")],
        }];
        let provider = ScriptedProvider::new(vec![
            ReadStatus::Pending,
            ReadStatus::Pending,
            ReadStatus::Succeeded(pages.clone()),
        ]);

        let outcome = read_image(&provider, "https://img/1.jpg", &fast_policy(10))
            .await
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Succeeded(pages));
        assert_eq!(provider.polls(), 3);
    }

    #[tokio::test]
    async fn test_failed_status_is_unreadable() {
        let provider = ScriptedProvider::new(vec![ReadStatus::Pending, ReadStatus::Failed]);
        let outcome = read_image(&provider, "https://img/1.jpg", &fast_policy(10))
            .await
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Unreadable);
    }

    #[tokio::test]
    async fn test_times_out_after_max_attempts() {
        let provider = ScriptedProvider::new(vec![]);
        let err = read_image(&provider, "https://img/1.jpg", &fast_policy(4))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Timeout { attempts: 4 }));
        assert_eq!(provider.polls(), 4);
    }

    #[tokio::test]
    async fn test_submit_error_skips_polling() {
        let provider = ScriptedProvider::new(vec![ReadStatus::Failed]);
        let err = read_image(&provider, "", &fast_policy(4)).await.unwrap_err();
        assert!(matches!(err, OcrError::Permanent(_)));
        assert_eq!(provider.polls(), 0);
    }
}
