//! Remote text recognition.
//!
//! Photos are read by a [`ReadProvider`] with a submit/poll contract. The
//! bundled provider is [`AzureReadClient`]; tests substitute in-memory fakes.

mod azure;
mod poll;
mod provider;
mod retry;

pub use azure::AzureReadClient;
pub use poll::{poll_until_complete, read_image, PollPolicy};
pub use provider::{
    OcrError, ReadOperation, ReadOutcome, ReadProvider, ReadStatus, RecognizedLine,
    RecognizedPage,
};
pub use retry::{backoff_delay, parse_retry_after};
