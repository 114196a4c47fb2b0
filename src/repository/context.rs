//! Database context: owns the pool, hands out repositories, creates tables.

use diesel_async::SimpleAsyncConnection;

use super::inspection::DieselInspectionRepository;
use super::pool::DbPool;
use super::store::StoreError;
use crate::with_conn_split;

/// Entry point for database access. Create one per command.
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Connect to a SQLite path or a `postgres://` URL.
    pub fn from_url(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool: DbPool::from_url(database_url)?,
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn inspections(&self) -> DieselInspectionRepository {
        DieselInspectionRepository::new(self.pool.clone())
    }

    /// Create the inspection and audit tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        with_conn_split!(self.pool,
            sqlite: conn => {
                conn.batch_execute(SQLITE_SCHEMA).await?;
                Ok(())
            },
            postgres: conn => {
                conn.batch_execute(POSTGRES_SCHEMA).await?;
                Ok(())
            }
        )
    }
}

const SQLITE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS vehicles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        license_number TEXT NOT NULL,
        deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS vehicle_ownerships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
        active INTEGER NOT NULL DEFAULT 1,
        deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS assignments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        vehicle_ownership_id INTEGER NOT NULL REFERENCES vehicle_ownerships(id),
        deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS inspections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        assignment_id INTEGER NOT NULL REFERENCES assignments(id),
        odometer BIGINT NOT NULL DEFAULT 0,
        sequence_number INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        verified_at TEXT,
        processed_at TEXT,
        ocr_verified_at TEXT,
        deleted_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_inspections_assignment
        ON inspections(assignment_id, sequence_number);

    CREATE TABLE IF NOT EXISTS inspection_photos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        inspection_id INTEGER NOT NULL REFERENCES inspections(id),
        position_code INTEGER NOT NULL,
        image_url TEXT NOT NULL,
        deleted_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_inspection_photos_inspection
        ON inspection_photos(inspection_id);

    CREATE TABLE IF NOT EXISTS auto_verify_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        inspection_id INTEGER NOT NULL,
        odo_result TEXT NOT NULL DEFAULT '',
        odo_raw TEXT NOT NULL DEFAULT '',
        odo_match INTEGER NOT NULL DEFAULT 0,
        plate_result TEXT NOT NULL DEFAULT '',
        plate_raw TEXT NOT NULL DEFAULT '',
        plate_match INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

#[cfg(feature = "postgres")]
const POSTGRES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS vehicles (
        id SERIAL PRIMARY KEY,
        license_number TEXT NOT NULL,
        deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS vehicle_ownerships (
        id SERIAL PRIMARY KEY,
        vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
        active INTEGER NOT NULL DEFAULT 1,
        deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS assignments (
        id SERIAL PRIMARY KEY,
        vehicle_ownership_id INTEGER NOT NULL REFERENCES vehicle_ownerships(id),
        deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS inspections (
        id SERIAL PRIMARY KEY,
        assignment_id INTEGER NOT NULL REFERENCES assignments(id),
        odometer BIGINT NOT NULL DEFAULT 0,
        sequence_number INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        verified_at TEXT,
        processed_at TEXT,
        ocr_verified_at TEXT,
        deleted_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_inspections_assignment
        ON inspections(assignment_id, sequence_number);

    CREATE TABLE IF NOT EXISTS inspection_photos (
        id SERIAL PRIMARY KEY,
        inspection_id INTEGER NOT NULL REFERENCES inspections(id),
        position_code INTEGER NOT NULL,
        image_url TEXT NOT NULL,
        deleted_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_inspection_photos_inspection
        ON inspection_photos(inspection_id);

    CREATE TABLE IF NOT EXISTS auto_verify_logs (
        id SERIAL PRIMARY KEY,
        inspection_id INTEGER NOT NULL,
        odo_result TEXT NOT NULL DEFAULT '',
        odo_raw TEXT NOT NULL DEFAULT '',
        odo_match INTEGER NOT NULL DEFAULT 0,
        plate_result TEXT NOT NULL DEFAULT '',
        plate_raw TEXT NOT NULL DEFAULT '',
        plate_match INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;
