//! acmreg Storage Layer
//!
//! Implements `RecordStore` and `SourceProvider` on SQLite.
//!
//! # Architecture
//!
//! - One `acm_records` row per register item, flat columns
//! - `data_issues` kept as a JSON array in a text column
//! - Record IDs are UUIDv7 strings; reads break ties in insertion order
//! - Saves are single-row statements; a batch may partially succeed
//!
//! # Examples
//!
//! ```no_run
//! use acmreg_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for record operations
//! ```

#![warn(missing_docs)]

use acmreg_domain::{
    AcmRecord, Classify, DataIssues, FailureKind, RecordStore, RegisterSummary, Source,
    SourceProvider,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Database busy or locked by another writer
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StoreError::Conflict(error.to_string())
            }
            _ => StoreError::Database(error),
        }
    }
}

impl Classify for StoreError {
    fn kind(&self) -> FailureKind {
        match self {
            StoreError::Conflict(_) => FailureKind::Transient,
            StoreError::Database(_) | StoreError::InvalidData(_) => FailureKind::Fatal,
        }
    }
}

const RECORD_COLUMNS: &str = "id, source_id, school_name, school_code, building_id, building_name, \
     building_year, building_construction, room_id, room_name, room_area, area_type, product, \
     material_description, extent, location, friable, material_condition, risk_status, result, \
     page_number, disturbance_potential, sample_no, sample_result, identifying_company, quantity, \
     acm_labelled, acm_label_details, hygienist_recommendations, external_id, removal_status, \
     date_of_removal, extraction_confidence, data_issues";

/// SQLite-based implementation of RecordStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks
/// behind a mutex, or give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use acmreg_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("acmreg.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert or replace a source document
    pub fn put_source(&mut self, source: &Source) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO sources (id, title, full_text, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
             title = excluded.title, full_text = excluded.full_text, updated_at = excluded.updated_at",
            params![&source.id, &source.title, &source.full_text, now_secs()],
        )?;
        Ok(())
    }

    /// Number of records stored for a source
    pub fn count_by_source(&self, source_id: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM acm_records WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn query_records(
        &self,
        filter: &str,
        order: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<AcmRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM acm_records WHERE {} ORDER BY {}",
            RECORD_COLUMNS, filter, order
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params, Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AcmRecord> {
        let issues_json: String = row.get("data_issues")?;
        let issues: Vec<String> = serde_json::from_str(&issues_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(33, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(AcmRecord {
            id: row.get("id")?,
            source_id: row.get("source_id")?,
            school_name: row.get("school_name")?,
            school_code: row.get("school_code")?,
            building_id: row.get("building_id")?,
            building_name: row.get("building_name")?,
            building_year: row.get("building_year")?,
            building_construction: row.get("building_construction")?,
            room_id: row.get("room_id")?,
            room_name: row.get("room_name")?,
            room_area: row.get("room_area")?,
            area_type: row.get("area_type")?,
            product: row.get("product")?,
            material_description: row.get("material_description")?,
            extent: row.get("extent")?,
            location: row.get("location")?,
            friable: row.get("friable")?,
            material_condition: row.get("material_condition")?,
            risk_status: row.get("risk_status")?,
            result: row.get("result")?,
            page_number: row.get("page_number")?,
            disturbance_potential: row.get("disturbance_potential")?,
            sample_no: row.get("sample_no")?,
            sample_result: row.get("sample_result")?,
            identifying_company: row.get("identifying_company")?,
            quantity: row.get("quantity")?,
            acm_labelled: row.get("acm_labelled")?,
            acm_label_details: row.get("acm_label_details")?,
            hygienist_recommendations: row.get("hygienist_recommendations")?,
            external_id: row.get("external_id")?,
            removal_status: row.get("removal_status")?,
            date_of_removal: row.get("date_of_removal")?,
            extraction_confidence: row.get("extraction_confidence")?,
            data_issues: DataIssues::from(issues),
        })
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn delete_by_source(&mut self, source_id: &str) -> Result<usize, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM acm_records WHERE source_id = ?1",
            params![source_id],
        )?;
        debug!(source_id, deleted, "Deleted records for source");
        Ok(deleted)
    }

    fn save_record(&mut self, record: &AcmRecord) -> Result<String, Self::Error> {
        if record.building_id.trim().is_empty()
            || record.product.trim().is_empty()
            || record.material_description.trim().is_empty()
        {
            return Err(StoreError::InvalidData(
                "building_id, product and material_description are required".to_string(),
            ));
        }

        let id = record
            .id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let issues = serde_json::to_string(record.data_issues.as_slice())
            .map_err(|e| StoreError::InvalidData(format!("data_issues: {}", e)))?;

        self.conn.execute(
            &format!(
                "INSERT INTO acm_records ({}, created_at) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
                 ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35)",
                RECORD_COLUMNS
            ),
            params![
                &id,
                &record.source_id,
                &record.school_name,
                &record.school_code,
                &record.building_id,
                &record.building_name,
                record.building_year,
                &record.building_construction,
                &record.room_id,
                &record.room_name,
                record.room_area,
                &record.area_type,
                &record.product,
                &record.material_description,
                &record.extent,
                &record.location,
                &record.friable,
                &record.material_condition,
                &record.risk_status,
                &record.result,
                record.page_number,
                &record.disturbance_potential,
                &record.sample_no,
                &record.sample_result,
                &record.identifying_company,
                &record.quantity,
                record.acm_labelled,
                &record.acm_label_details,
                &record.hygienist_recommendations,
                &record.external_id,
                &record.removal_status,
                &record.date_of_removal,
                &record.extraction_confidence,
                &issues,
                now_secs(),
            ],
        )?;

        Ok(id)
    }

    fn get_by_source(&self, source_id: &str) -> Result<Vec<AcmRecord>, Self::Error> {
        self.query_records("source_id = ?1", "building_id, room_id, rowid", &[&source_id])
    }

    fn get_by_building(
        &self,
        building_id: &str,
        source_id: Option<&str>,
    ) -> Result<Vec<AcmRecord>, Self::Error> {
        match source_id {
            Some(source_id) => self.query_records(
                "building_id = ?1 AND source_id = ?2",
                "room_id, rowid",
                &[&building_id, &source_id],
            ),
            None => self.query_records("building_id = ?1", "room_id, rowid", &[&building_id]),
        }
    }

    fn get_by_risk_status(
        &self,
        risk_status: &str,
        source_id: Option<&str>,
    ) -> Result<Vec<AcmRecord>, Self::Error> {
        match source_id {
            Some(source_id) => self.query_records(
                "risk_status = ?1 AND source_id = ?2",
                "rowid",
                &[&risk_status, &source_id],
            ),
            None => self.query_records("risk_status = ?1", "rowid", &[&risk_status]),
        }
    }

    fn summary_by_source(&self, source_id: &str) -> Result<RegisterSummary, Self::Error> {
        let summary = self.conn.query_row(
            "SELECT
                 COUNT(*),
                 COALESCE(SUM(CASE WHEN risk_status = 'High' THEN 1 ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN risk_status = 'Medium' THEN 1 ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN risk_status = 'Low' THEN 1 ELSE 0 END), 0),
                 COUNT(DISTINCT building_id),
                 COUNT(DISTINCT NULLIF(room_id, ''))
             FROM acm_records WHERE source_id = ?1",
            params![source_id],
            |row| {
                Ok(RegisterSummary {
                    total_records: row.get::<_, i64>(0)? as usize,
                    high_risk_count: row.get::<_, i64>(1)? as usize,
                    medium_risk_count: row.get::<_, i64>(2)? as usize,
                    low_risk_count: row.get::<_, i64>(3)? as usize,
                    building_count: row.get::<_, i64>(4)? as usize,
                    room_count: row.get::<_, i64>(5)? as usize,
                })
            },
        )?;
        Ok(summary)
    }
}

impl SourceProvider for SqliteStore {
    type Error = StoreError;

    fn get_source(&self, id: &str) -> Result<Option<Source>, Self::Error> {
        let source = self
            .conn
            .query_row(
                "SELECT id, title, full_text FROM sources WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Source {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        full_text: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_conflict() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        let error = StoreError::from(busy);
        assert!(matches!(error, StoreError::Conflict(_)));
        assert!(error.is_transient());
    }

    #[test]
    fn test_other_errors_are_fatal() {
        let error = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(error, StoreError::Database(_)));
        assert_eq!(error.kind(), FailureKind::Fatal);
    }
}
