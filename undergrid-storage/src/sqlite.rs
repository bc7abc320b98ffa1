//! SQLite-backed [`FeatureStore`].
//!
//! Geometry is kept as WKT text next to a fixed `srid` column. Timestamps
//! are stored exactly as the row carries them; see
//! [`format_timestamp`](crate::format_timestamp).

use crate::error::{StorageError, StorageResult};
use crate::row::{FacilityRow, PipelineRow};
use crate::store::FeatureStore;
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Spatial reference written to every row.
const SRID: i64 = 4326;

/// Persistent feature store backed by SQLite.
#[derive(Clone)]
pub struct SqliteFeatureStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFeatureStore {
    /// Opens (or creates) a store at the given path.
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Unavailable(format!("failed to open {}: {e}", path.display()))
        })?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Unavailable(format!("failed to open in-memory store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS pipelines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pipeline_id TEXT NOT NULL UNIQUE,
                pipeline_name TEXT NOT NULL,
                pipeline_type TEXT NOT NULL,
                geom TEXT NOT NULL,
                srid INTEGER NOT NULL DEFAULT 4326,
                diameter_mm INTEGER NOT NULL,
                material TEXT NOT NULL,
                status TEXT NOT NULL,
                health_score INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS facilities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                facility_id TEXT NOT NULL UNIQUE,
                facility_name TEXT NOT NULL,
                facility_type TEXT NOT NULL,
                geom TEXT NOT NULL,
                srid INTEGER NOT NULL DEFAULT 4326,
                status TEXT NOT NULL,
                health_score INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pipelines_created_by ON pipelines(created_by, created_at);
            CREATE INDEX IF NOT EXISTS idx_facilities_created_by ON facilities(created_by, created_at);
            ",
        )?;
        Ok(())
    }
}

fn read_pipeline(r: &Row<'_>) -> rusqlite::Result<PipelineRow> {
    Ok(PipelineRow {
        id: r.get(0)?,
        pipeline_id: r.get(1)?,
        pipeline_name: r.get(2)?,
        pipeline_type: r.get(3)?,
        geom: r.get(4)?,
        diameter_mm: r.get(5)?,
        material: r.get(6)?,
        status: r.get(7)?,
        health_score: r.get(8)?,
        created_at: r.get(9)?,
        updated_at: r.get(10)?,
        created_by: r.get(11)?,
    })
}

fn read_facility(r: &Row<'_>) -> rusqlite::Result<FacilityRow> {
    Ok(FacilityRow {
        id: r.get(0)?,
        facility_id: r.get(1)?,
        facility_name: r.get(2)?,
        facility_type: r.get(3)?,
        geom: r.get(4)?,
        status: r.get(5)?,
        health_score: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
        created_by: r.get(9)?,
    })
}

impl FeatureStore for SqliteFeatureStore {
    fn ping(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(())
    }

    // ── Pipelines ────────────────────────────────────────────────

    fn insert_pipeline(&self, row: &PipelineRow) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pipelines (pipeline_id, pipeline_name, pipeline_type, geom, srid, diameter_mm, material, status, health_score, created_at, updated_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                row.pipeline_id,
                row.pipeline_name,
                row.pipeline_type,
                row.geom,
                SRID,
                row.diameter_mm,
                row.material,
                row.status,
                row.health_score,
                row.created_at,
                row.updated_at,
                row.created_by,
            ],
        )
        .map_err(|e| StorageError::from_write(e, &row.pipeline_id))?;
        let id = conn.last_insert_rowid();
        debug!("inserted pipeline {} as row {}", row.pipeline_id, id);
        Ok(id)
    }

    fn update_pipeline(&self, row: &PipelineRow) -> StorageResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE pipelines SET pipeline_name = ?2, pipeline_type = ?3, geom = ?4, diameter_mm = ?5,
                 material = ?6, status = ?7, health_score = ?8, updated_at = ?9
                 WHERE pipeline_id = ?1",
                params![
                    row.pipeline_id,
                    row.pipeline_name,
                    row.pipeline_type,
                    row.geom,
                    row.diameter_mm,
                    row.material,
                    row.status,
                    row.health_score,
                    row.updated_at,
                ],
            )
            .map_err(|e| StorageError::from_write(e, &row.pipeline_id))?;
        if changed == 0 {
            return Err(StorageError::NotFound(row.pipeline_id.clone()));
        }
        Ok(())
    }

    fn delete_pipeline(&self, pipeline_id: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM pipelines WHERE pipeline_id = ?1",
            params![pipeline_id],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(pipeline_id.to_string()));
        }
        Ok(())
    }

    fn pipelines_by_provenance(&self, marker: &str) -> StorageResult<Vec<PipelineRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, pipeline_id, pipeline_name, pipeline_type, geom, diameter_mm, material, status, health_score, created_at, updated_at, created_by
             FROM pipelines WHERE created_by = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![marker], read_pipeline)?;
        let result = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(result)
    }

    fn delete_pipelines_by_provenance(&self, marker: &str) -> StorageResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM pipelines WHERE created_by = ?1",
            params![marker],
        )?;
        debug!("removed {} pipelines created by {}", removed, marker);
        Ok(removed)
    }

    // ── Facilities ───────────────────────────────────────────────

    fn insert_facility(&self, row: &FacilityRow) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO facilities (facility_id, facility_name, facility_type, geom, srid, status, health_score, created_at, updated_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.facility_id,
                row.facility_name,
                row.facility_type,
                row.geom,
                SRID,
                row.status,
                row.health_score,
                row.created_at,
                row.updated_at,
                row.created_by,
            ],
        )
        .map_err(|e| StorageError::from_write(e, &row.facility_id))?;
        let id = conn.last_insert_rowid();
        debug!("inserted facility {} as row {}", row.facility_id, id);
        Ok(id)
    }

    fn update_facility(&self, row: &FacilityRow) -> StorageResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE facilities SET facility_name = ?2, facility_type = ?3, geom = ?4, status = ?5,
                 health_score = ?6, updated_at = ?7
                 WHERE facility_id = ?1",
                params![
                    row.facility_id,
                    row.facility_name,
                    row.facility_type,
                    row.geom,
                    row.status,
                    row.health_score,
                    row.updated_at,
                ],
            )
            .map_err(|e| StorageError::from_write(e, &row.facility_id))?;
        if changed == 0 {
            return Err(StorageError::NotFound(row.facility_id.clone()));
        }
        Ok(())
    }

    fn delete_facility(&self, facility_id: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM facilities WHERE facility_id = ?1",
            params![facility_id],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(facility_id.to_string()));
        }
        Ok(())
    }

    fn facilities_by_provenance(&self, marker: &str) -> StorageResult<Vec<FacilityRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, facility_id, facility_name, facility_type, geom, status, health_score, created_at, updated_at, created_by
             FROM facilities WHERE created_by = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![marker], read_facility)?;
        let result = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(result)
    }

    fn delete_facilities_by_provenance(&self, marker: &str) -> StorageResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM facilities WHERE created_by = ?1",
            params![marker],
        )?;
        debug!("removed {} facilities created by {}", removed, marker);
        Ok(removed)
    }
}
