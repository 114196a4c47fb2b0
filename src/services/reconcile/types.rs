//! Reconciliation outcomes and events.

use thiserror::Error;

use crate::models::MatchAuditRecord;
use crate::ocr::OcrError;
use crate::repository::StoreError;

/// Per-record failure. The record is left unprocessed for the next pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Why a record was not sent to OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No earlier verified inspection to compare against.
    NoPriorRecord,
    /// The prior inspection has the same (or a later) date.
    ZeroElapsedDays,
    /// Usage rate at or above the limit.
    UsagePlausible,
    /// No photos, or no reference plate.
    InsufficientData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPriorRecord => "no prior record",
            Self::ZeroElapsedDays => "zero elapsed days",
            Self::UsagePlausible => "usage plausible",
            Self::InsufficientData => "insufficient data",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one record in a pass.
#[derive(Debug)]
pub enum RecordOutcome {
    Skipped(SkipReason),
    /// Photos were read and an audit record was produced.
    Recorded(MatchAuditRecord),
    Failed(ReconcileError),
}

/// Counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub recorded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Recorded records where both odometer and plate matched.
    pub fully_matched: usize,
}

impl PassSummary {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Recorded(audit) => {
                self.recorded += 1;
                if audit.fully_matched() {
                    self.fully_matched += 1;
                }
            }
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.recorded + self.skipped + self.failed
    }
}

/// Progress events emitted during a pass.
#[derive(Debug, Clone)]
pub enum ReconcileEvent {
    PassStarted {
        candidates: usize,
    },
    RecordSkipped {
        record_id: i32,
        reason: SkipReason,
    },
    RecordRecorded {
        record_id: i32,
        odo_matched: bool,
        plate_matched: bool,
    },
    RecordFailed {
        record_id: i32,
        error: String,
    },
    PassComplete {
        summary: PassSummary,
    },
}

impl ReconcileEvent {
    pub fn for_outcome(record_id: i32, outcome: &RecordOutcome) -> Self {
        match outcome {
            RecordOutcome::Skipped(reason) => Self::RecordSkipped {
                record_id,
                reason: *reason,
            },
            RecordOutcome::Recorded(audit) => Self::RecordRecorded {
                record_id,
                odo_matched: audit.odo_matched,
                plate_matched: audit.plate_matched,
            },
            RecordOutcome::Failed(error) => Self::RecordFailed {
                record_id,
                error: error.to_string(),
            },
        }
    }
}
