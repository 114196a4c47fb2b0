//! Service layer.
//!
//! Domain logic separated from the CLI, driven through the store and OCR
//! traits so it can run against fakes in tests.

pub mod reconcile;

pub use reconcile::{
    PassOptions, PassSummary, ReconcileError, ReconcileEvent, ReconcileService, RecordOutcome,
    SkipReason, UsageRateEstimate,
};
