//! # Estimate Store
//!
//! SQLite storage for saved estimates.
//!
//! One row per saved estimate, keyed by an opaque id and owned by a user
//! identity. The ring is stored as JSON text (`[[lng, lat], ...]`), the
//! condition levels as their lowercase names. Rows are write-once: an UPDATE
//! trigger aborts any attempt to change a saved estimate, so re-estimating
//! always produces a new row.

use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};

use crate::conditions::{Access, GrassLength, Obstacles, Severity, Slope};
use crate::controller::{CollaboratorError, EstimateSink};
use crate::error::{EstimatorError, Result};
use crate::record::{generate_estimate_id, EstimateRecord, NewEstimateRecord};
use crate::Coordinate;

const SELECT_COLUMNS: &str = "SELECT id, user_id, address, polygon_json, square_footage,
        grass_length, obstacles, slope, access, estimate_low, estimate_high, created_at
    FROM estimates";

/// Saved-estimate storage backed by SQLite.
pub struct EstimateStore {
    /// Database connection
    db: Connection,
}

impl EstimateStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) the store at the given database path.
    pub fn new(db_path: &str) -> SqlResult<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        info!("[EstimateStore] Opened {}", db_path);
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqlResult<Self> {
        Self::new(":memory:")
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS estimates (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                address TEXT NOT NULL,
                polygon_json TEXT NOT NULL,
                square_footage INTEGER NOT NULL CHECK(square_footage > 0),
                grass_length TEXT NOT NULL CHECK(grass_length IN ('short', 'medium', 'tall')),
                obstacles TEXT NOT NULL CHECK(obstacles IN ('none', 'some', 'heavy')),
                slope TEXT NOT NULL CHECK(slope IN ('flat', 'slight', 'steep')),
                access TEXT NOT NULL CHECK(access IN ('easy', 'gated', 'obstructed')),
                estimate_low INTEGER NOT NULL CHECK(estimate_low >= 0),
                estimate_high INTEGER NOT NULL CHECK(estimate_high >= estimate_low),
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_estimates_user_created
            ON estimates(user_id, created_at);

            -- Saved estimates are never mutated
            CREATE TRIGGER IF NOT EXISTS estimates_immutable
            BEFORE UPDATE ON estimates
            BEGIN
                SELECT RAISE(ABORT, 'saved estimates are immutable');
            END;
            "#,
        )
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Validate and insert a record, generating an id when none was given.
    pub fn insert_estimate(&mut self, record: NewEstimateRecord) -> Result<EstimateRecord> {
        record.validate()?;

        let id = record.id.clone().unwrap_or_else(generate_estimate_id);
        let polygon_json = serde_json::to_string(&record.polygon)?;

        self.db.execute(
            "INSERT INTO estimates (
                id, user_id, address, polygon_json, square_footage,
                grass_length, obstacles, slope, access,
                estimate_low, estimate_high, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                record.user_id,
                record.address,
                polygon_json,
                to_sql_int(record.square_footage.value(), "square_footage")?,
                record.conditions.grass_length.as_str(),
                record.conditions.obstacles.as_str(),
                record.conditions.slope.as_str(),
                record.conditions.access.as_str(),
                to_sql_int(record.estimate.low, "estimate_low")?,
                to_sql_int(record.estimate.high, "estimate_high")?,
                record.created_at,
            ],
        )?;

        debug!(
            "[EstimateStore] Inserted {} for {} ({} sq ft)",
            id, record.user_id, record.square_footage
        );

        Ok(record.into_record(id))
    }

    /// Delete a saved estimate. Returns false if it did not exist.
    pub fn delete_estimate(&mut self, id: &str) -> Result<bool> {
        let deleted = self
            .db
            .execute("DELETE FROM estimates WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_estimate(&self, id: &str) -> Result<Option<EstimateRecord>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let record = self
            .db
            .query_row(&sql, params![id], row_to_record)
            .optional()?;
        Ok(record)
    }

    /// All estimates owned by a user, newest first.
    pub fn list_estimates(&self, user_id: &str) -> Result<Vec<EstimateRecord>> {
        let sql = format!(
            "{} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let mut stmt = self.db.prepare(&sql)?;
        let records = stmt
            .query_map(params![user_id], row_to_record)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count_estimates(&self, user_id: &str) -> Result<u64> {
        let count = self.db.query_row(
            "SELECT COUNT(*) FROM estimates WHERE user_id = ?1",
            params![user_id],
            |row| get_u64(row, 0),
        )?;
        Ok(count)
    }
}

impl EstimateSink for EstimateStore {
    fn save_estimate(
        &mut self,
        record: NewEstimateRecord,
    ) -> std::result::Result<EstimateRecord, CollaboratorError> {
        self.insert_estimate(record).map_err(|e| e.into())
    }
}

// ============================================================================
// Row Conversion
// ============================================================================

fn to_sql_int(value: u64, column: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        EstimatorError::invalid_record(format!("{} {} is out of range", column, value))
    })
}

fn row_to_record(row: &Row<'_>) -> SqlResult<EstimateRecord> {
    let polygon_json: String = row.get(3)?;
    let polygon: Vec<Coordinate> = serde_json::from_str(&polygon_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(EstimateRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        address: row.get(2)?,
        polygon,
        square_footage: get_u64(row, 4)?,
        grass_length: get_level::<GrassLength>(row, 5)?,
        obstacles: get_level::<Obstacles>(row, 6)?,
        slope: get_level::<Slope>(row, 7)?,
        access: get_level::<Access>(row, 8)?,
        estimate_low: get_u64(row, 9)?,
        estimate_high: get_u64(row, 10)?,
        created_at: row.get(11)?,
    })
}

fn get_u64(row: &Row<'_>, idx: usize) -> SqlResult<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn get_level<S: Severity>(row: &Row<'_>, idx: usize) -> SqlResult<S> {
    let value: String = row.get(idx)?;
    S::parse(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
