//! Backoff for rate-limited OCR requests.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::warn;

use super::provider::OcrError;

/// Retries on 429 before giving up.
const MAX_RETRIES: u32 = 5;

/// Longest wait between attempts.
const MAX_WAIT: Duration = Duration::from_secs(60);

/// Wait requested by a `Retry-After` header given in seconds, capped at a minute.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    header_value?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_WAIT))
}

/// Exponential backoff for the given attempt, capped at a minute.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(base_ms.saturating_mul(factor)).min(MAX_WAIT)
}

/// Run `make_request` until it returns something other than 429.
///
/// Network failures surface as `OcrError::Transient`. Once the retries are
/// spent on 429s the result is `OcrError::RateLimited`.
pub async fn retry_on_rate_limit<F, Fut>(service: &str, make_request: F) -> Result<Response, OcrError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let response = make_request()
            .await
            .map_err(|e| OcrError::Transient(format!("{service}: {e}")))?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if attempt >= MAX_RETRIES {
            return Err(OcrError::RateLimited {
                service: service.to_string(),
                retry_after_secs: retry_after.as_deref().and_then(|s| s.trim().parse().ok()),
            });
        }

        let wait = parse_retry_after(retry_after.as_deref())
            .unwrap_or_else(|| backoff_delay(attempt, 1000));
        warn!(
            "{} rate limited (attempt {}), waiting {:?}",
            service,
            attempt + 1,
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}
