//! Repository layer for database persistence.
//!
//! All database access goes through Diesel's query builder. SQLite is the
//! default backend; PostgreSQL is available with the `postgres` feature.

pub mod context;
pub mod inspection;
pub mod models;
pub mod pool;
pub mod store;

pub use context::DbContext;
pub use inspection::DieselInspectionRepository;
pub use pool::{redact_url_password, DbPool};
pub use store::{InspectionStore, StoreError};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a stored RFC3339 timestamp, falling back to the epoch.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse a stored date. Accepts a bare date, an RFC3339 timestamp, or a
/// `YYYY-MM-DD HH:MM:SS` datetime.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
