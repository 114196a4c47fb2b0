//! The persistence seam used by reconciliation.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{InspectionRecord, MatchAuditRecord, PhotoReference};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection failed: {0}")]
    Connection(String),
}

/// Reads inspections and records verification outcomes.
#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Verified, active, not deleted inspections that have not been processed
    /// yet, ordered by id. Rows that cannot be read are logged and left out.
    async fn fetch_candidate_records(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<InspectionRecord>, StoreError>;

    /// The latest earlier inspection of the same assignment with a positive
    /// odometer reading that was itself verified.
    async fn fetch_prior_record(
        &self,
        record_id: i32,
        sequence_number: i32,
    ) -> Result<Option<InspectionRecord>, StoreError>;

    /// Odometer and plate photos of an inspection.
    async fn fetch_photos(&self, record_id: i32) -> Result<Vec<PhotoReference>, StoreError>;

    /// License number of the vehicle currently assigned to the inspection.
    async fn fetch_reference_plate(&self, record_id: i32) -> Result<Option<String>, StoreError>;

    async fn write_audit_record(&self, record: &MatchAuditRecord) -> Result<(), StoreError>;

    /// Stamp the inspection as handled by this job. Safe to repeat.
    async fn mark_processed(&self, record_id: i32) -> Result<(), StoreError>;

    /// Stamp the inspection as confirmed by OCR.
    async fn mark_ocr_verified(&self, record_id: i32) -> Result<(), StoreError>;
}
