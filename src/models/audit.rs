//! Match audit records, the persisted output of a reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PhotoCategory;
use crate::matching::ExtractionResult;

/// Summary of OCR verification for one inspection, covering both categories.
///
/// A category with no photo, or whose photo could not be read, keeps empty
/// strings and `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAuditRecord {
    pub record_id: i32,
    pub odo_result: String,
    pub odo_raw_text: String,
    pub odo_matched: bool,
    pub plate_result: String,
    pub plate_raw_text: String,
    pub plate_matched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchAuditRecord {
    /// Create an empty audit record for an inspection.
    pub fn new(record_id: i32) -> Self {
        let now = Utc::now();
        Self {
            record_id,
            odo_result: String::new(),
            odo_raw_text: String::new(),
            odo_matched: false,
            plate_result: String::new(),
            plate_raw_text: String::new(),
            plate_matched: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold one photo's extraction into the record.
    ///
    /// If a category has several photos, the last one processed wins unless
    /// an earlier one already matched.
    pub fn apply(&mut self, extraction: &ExtractionResult) {
        let (result, raw, matched) = match extraction.category {
            PhotoCategory::Odometer => (
                &mut self.odo_result,
                &mut self.odo_raw_text,
                &mut self.odo_matched,
            ),
            PhotoCategory::Plate => (
                &mut self.plate_result,
                &mut self.plate_raw_text,
                &mut self.plate_matched,
            ),
        };

        if *matched {
            return;
        }
        result.clone_from(&extraction.aggregated_digits);
        raw.clone_from(&extraction.raw_text);
        *matched = extraction.matched;
    }

    /// Both the odometer and the plate were confirmed.
    pub fn fully_matched(&self) -> bool {
        self.odo_matched && self.plate_matched
    }
}
