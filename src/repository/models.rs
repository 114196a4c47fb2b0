//! Row types for the inspection tables.

use diesel::prelude::*;

use crate::schema;

/// The columns of `inspections` that reconciliation reads.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::inspections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InspectionRow {
    pub id: i32,
    pub odometer: i64,
    pub sequence_number: i32,
    pub start_date: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::inspection_photos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PhotoRow {
    pub inspection_id: i32,
    pub position_code: i32,
    pub image_url: String,
}

/// Audit log row as stored.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::auto_verify_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditLogRow {
    pub id: i32,
    pub inspection_id: i32,
    pub odo_result: String,
    pub odo_raw: String,
    pub odo_match: i32,
    pub plate_result: String,
    pub plate_raw: String,
    pub plate_match: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New audit log row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::auto_verify_logs)]
pub struct NewAuditLog<'a> {
    pub inspection_id: i32,
    pub odo_result: &'a str,
    pub odo_raw: &'a str,
    pub odo_match: i32,
    pub plate_result: &'a str,
    pub plate_raw: &'a str,
    pub plate_match: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
