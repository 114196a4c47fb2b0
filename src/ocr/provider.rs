//! Read provider abstraction: submit an image, poll for the recognized text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from OCR providers.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Network failure or server-side error; the same request may succeed later.
    #[error("OCR service unavailable: {0}")]
    Transient(String),

    /// The image itself was rejected (bad URL, unsupported or corrupt image).
    #[error("OCR request rejected: {0}")]
    Permanent(String),

    /// The service refused the credentials (401/403).
    #[error("OCR service refused credentials: {0}")]
    Unauthorized(String),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?}s")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("OCR operation still pending after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("Unexpected OCR response: {0}")]
    InvalidResponse(String),
}

impl OcrError {
    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OcrError::Permanent(_) | OcrError::Unauthorized(_))
    }

    /// Whether the error is about the photo rather than the service, so the
    /// photo counts as read but unmatched.
    pub fn rejects_image(&self) -> bool {
        matches!(self, OcrError::Permanent(_))
    }
}

/// One line of recognized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl AsRef<str> for RecognizedLine {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Lines recognized on one page of an image, in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedPage {
    pub page: u32,
    pub lines: Vec<RecognizedLine>,
}

/// Handle for a submitted read operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOperation {
    /// URL to poll for the result.
    pub location: String,
}

impl ReadOperation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Operation ID (last path segment of the location).
    pub fn id(&self) -> &str {
        self.location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.location)
    }
}

/// Status of a read operation at one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    Pending,
    Succeeded(Vec<RecognizedPage>),
    /// The provider could not process the image.
    Failed,
}

/// Terminal outcome of a read operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Succeeded(Vec<RecognizedPage>),
    Unreadable,
}

impl ReadOutcome {
    /// All recognized lines across pages, in order.
    pub fn lines(&self) -> impl Iterator<Item = &RecognizedLine> {
        let pages: &[RecognizedPage] = match self {
            ReadOutcome::Succeeded(pages) => pages,
            ReadOutcome::Unreadable => &[],
        };
        pages.iter().flat_map(|p| p.lines.iter())
    }
}

/// A remote OCR service with an asynchronous submit/poll contract.
#[async_trait]
pub trait ReadProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Submit an image URL for recognition.
    async fn submit(&self, image_url: &str) -> Result<ReadOperation, OcrError>;

    /// Check the status of a submitted operation.
    async fn poll(&self, operation: &ReadOperation) -> Result<ReadStatus, OcrError>;
}
