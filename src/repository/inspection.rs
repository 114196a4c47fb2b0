//! Diesel-backed inspection store.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use super::models::{AuditLogRow, InspectionRow, NewAuditLog, PhotoRow};
use super::pool::DbPool;
use super::store::{InspectionStore, StoreError};
use super::{parse_date, parse_datetime};
use crate::models::{InspectionRecord, MatchAuditRecord, PhotoCategory, PhotoReference};
use crate::schema::{
    assignments, auto_verify_logs, inspection_photos, inspections, vehicle_ownerships, vehicles,
};
use crate::with_conn;

/// `inspections.status` of a live inspection.
const STATUS_ACTIVE: i32 = 1;

impl TryFrom<InspectionRow> for InspectionRecord {
    type Error = diesel::result::Error;

    fn try_from(row: InspectionRow) -> Result<Self, Self::Error> {
        let start_date = parse_date(&row.start_date).ok_or_else(|| {
            diesel::result::Error::DeserializationError(
                format!(
                    "Invalid start_date '{}' on inspection {}",
                    row.start_date, row.id
                )
                .into(),
            )
        })?;

        Ok(InspectionRecord {
            id: row.id,
            odometer_reading: row.odometer,
            sequence_number: row.sequence_number,
            start_date,
        })
    }
}

impl From<AuditLogRow> for MatchAuditRecord {
    fn from(row: AuditLogRow) -> Self {
        MatchAuditRecord {
            record_id: row.inspection_id,
            odo_result: row.odo_result,
            odo_raw_text: row.odo_raw,
            odo_matched: row.odo_match != 0,
            plate_result: row.plate_result,
            plate_raw_text: row.plate_raw,
            plate_matched: row.plate_match != 0,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

fn photo_reference(row: PhotoRow) -> Option<PhotoReference> {
    Some(PhotoReference {
        record_id: row.inspection_id,
        category: PhotoCategory::from_position_code(row.position_code)?,
        image_url: row.image_url,
    })
}

/// Inspection store over the relational tables.
#[derive(Clone)]
pub struct DieselInspectionRepository {
    pool: DbPool,
}

impl DieselInspectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Audit log rows written for an inspection, oldest first.
    pub async fn audit_records_for(
        &self,
        record_id: i32,
    ) -> Result<Vec<MatchAuditRecord>, StoreError> {
        with_conn!(self.pool, conn => {
            let rows = auto_verify_logs::table
                .filter(auto_verify_logs::inspection_id.eq(record_id))
                .order(auto_verify_logs::id.asc())
                .select(AuditLogRow::as_select())
                .load(&mut conn)
                .await?;
            Ok(rows.into_iter().map(MatchAuditRecord::from).collect())
        })
    }
}

#[async_trait]
impl InspectionStore for DieselInspectionRepository {
    async fn fetch_candidate_records(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        // Malformed rows are dropped before the limit applies.
        let rows: Vec<InspectionRow> = with_conn!(self.pool, conn => {
            inspections::table
                .filter(inspections::deleted_at.is_null())
                .filter(inspections::verified_at.is_not_null())
                .filter(inspections::status.eq(STATUS_ACTIVE))
                .filter(inspections::processed_at.is_null())
                .order(inspections::id.asc())
                .select(InspectionRow::as_select())
                .load(&mut conn)
                .await?
        });

        Ok(rows
            .into_iter()
            .filter_map(|row| match InspectionRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping candidate: {}", e);
                    None
                }
            })
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn fetch_prior_record(
        &self,
        record_id: i32,
        sequence_number: i32,
    ) -> Result<Option<InspectionRecord>, StoreError> {
        with_conn!(self.pool, conn => {
            let assignment_id: Option<i32> = inspections::table
                .find(record_id)
                .select(inspections::assignment_id)
                .first(&mut conn)
                .await
                .optional()?;
            let Some(assignment_id) = assignment_id else {
                return Ok(None);
            };

            let row = inspections::table
                .filter(inspections::assignment_id.eq(assignment_id))
                .filter(inspections::sequence_number.lt(sequence_number))
                .filter(inspections::deleted_at.is_null())
                .filter(inspections::status.eq(STATUS_ACTIVE))
                .filter(inspections::odometer.gt(0i64))
                .filter(inspections::verified_at.is_not_null())
                .order(inspections::sequence_number.desc())
                .select(InspectionRow::as_select())
                .first(&mut conn)
                .await
                .optional()?;
            row.map(InspectionRecord::try_from)
                .transpose()
                .map_err(StoreError::from)
        })
    }

    async fn fetch_photos(&self, record_id: i32) -> Result<Vec<PhotoReference>, StoreError> {
        let codes = [
            PhotoCategory::Odometer.position_code(),
            PhotoCategory::Plate.position_code(),
        ];

        with_conn!(self.pool, conn => {
            let rows = inspection_photos::table
                .filter(inspection_photos::inspection_id.eq(record_id))
                .filter(inspection_photos::deleted_at.is_null())
                .filter(inspection_photos::position_code.eq_any(codes))
                .order(inspection_photos::id.asc())
                .select(PhotoRow::as_select())
                .load(&mut conn)
                .await?;
            Ok(rows.into_iter().filter_map(photo_reference).collect())
        })
    }

    async fn fetch_reference_plate(&self, record_id: i32) -> Result<Option<String>, StoreError> {
        with_conn!(self.pool, conn => {
            let plate = inspections::table
                .inner_join(
                    assignments::table
                        .inner_join(vehicle_ownerships::table.inner_join(vehicles::table)),
                )
                .filter(inspections::id.eq(record_id))
                .filter(inspections::deleted_at.is_null())
                .filter(assignments::deleted_at.is_null())
                .filter(vehicle_ownerships::active.eq(1))
                .filter(vehicle_ownerships::deleted_at.is_null())
                .filter(vehicles::deleted_at.is_null())
                .select(vehicles::license_number)
                .first::<String>(&mut conn)
                .await
                .optional()?;
            Ok(plate)
        })
    }

    async fn write_audit_record(&self, record: &MatchAuditRecord) -> Result<(), StoreError> {
        let created_at = record.created_at.to_rfc3339();
        let updated_at = record.updated_at.to_rfc3339();
        let row = NewAuditLog {
            inspection_id: record.record_id,
            odo_result: &record.odo_result,
            odo_raw: &record.odo_raw_text,
            odo_match: i32::from(record.odo_matched),
            plate_result: &record.plate_result,
            plate_raw: &record.plate_raw_text,
            plate_match: i32::from(record.plate_matched),
            created_at: &created_at,
            updated_at: &updated_at,
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(auto_verify_logs::table)
                .values(&row)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    async fn mark_processed(&self, record_id: i32) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        with_conn!(self.pool, conn => {
            diesel::update(
                inspections::table
                    .filter(inspections::id.eq(record_id))
                    .filter(inspections::processed_at.is_null()),
            )
            .set(inspections::processed_at.eq(&now))
            .execute(&mut conn)
            .await?;
            Ok(())
        })
    }

    async fn mark_ocr_verified(&self, record_id: i32) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        with_conn!(self.pool, conn => {
            diesel::update(inspections::table.find(record_id))
                .set(inspections::ocr_verified_at.eq(&now))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }
}
