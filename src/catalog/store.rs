use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::data::{WorkDraft, WorkRecord};
use super::iso_now;
use crate::error::StoreError;

/// The storage surface consumed by the import/export coordinators and by
/// application shells.
///
/// Every call is one independent transaction; there is no cross-call
/// atomicity. Ids are assigned only here, never by parsers or callers.
pub trait WorkStore {
    /// Persist a new work and return its freshly assigned id.
    ///
    /// When the draft carries no `created_at`, the current time is used.
    fn add(&mut self, draft: &WorkDraft) -> Result<i64, StoreError>;

    /// Replace the stored value for `record.id`.
    ///
    /// Fails with [`StoreError::NotFound`] when the id is absent; an
    /// update never implicitly creates a record.
    fn update(&mut self, record: &WorkRecord) -> Result<i64, StoreError>;

    /// Remove a work. Succeeds silently when the id is absent.
    fn delete(&mut self, id: i64) -> Result<(), StoreError>;

    /// Independent snapshot of every work, ordered by id.
    ///
    /// Mutating the returned records never aliases stored state.
    fn get_all(&self) -> Result<Vec<WorkRecord>, StoreError>;

    /// Look up one work by id.
    fn get_by_id(&self, id: i64) -> Result<Option<WorkRecord>, StoreError>;
}

/// SQLite-backed catalog store.
///
/// The database file lives in the user's data directory by default:
/// - Linux: ~/.local/share/poster-catalog/catalog.db
/// - macOS: ~/Library/Application Support/poster-catalog/catalog.db
/// - Windows: %APPDATA%\poster-catalog\catalog.db
pub struct CatalogStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl CatalogStore {
    /// Open (or create) the catalog database at the default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_db_path())
    }

    /// Open (or create) the catalog database at an explicit path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            // Opening fails with a database error if this cannot be created;
            // let SQLite report it rather than panicking here.
            let _ = std::fs::create_dir_all(parent);
        }

        let conn = Connection::open(path)?;
        info!(db = %path.display(), "catalog database opened");

        let mut store = CatalogStore {
            conn,
            db_path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory catalog. Used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let mut store = CatalogStore {
            conn,
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Where the database lives by default.
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("poster-catalog");
        path.push("catalog.db");
        path
    }

    /// Path of the open database, if it is file-backed.
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Initialize the schema. Idempotent.
    fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS works (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                year        INTEGER NOT NULL,
                episode     INTEGER,
                character   TEXT,
                identity    TEXT,
                timestamp   TEXT,
                photos      TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL
            )",
            [],
        )?;

        // Secondary indexes back the title/year filters callers run.
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_works_title ON works(title)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_works_year ON works(year)",
            [],
        )?;

        debug!("catalog schema initialized");
        Ok(())
    }

    /// Number of works in the catalog.
    pub fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM works", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(WorkRecord, String)> {
        let record = WorkRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            episode: row.get(3)?,
            character: row.get(4)?,
            identity: row.get(5)?,
            timestamp: row.get(6)?,
            photos: Vec::new(),
            created_at: row.get(8)?,
        };
        let photos_json: String = row.get(7)?;
        Ok((record, photos_json))
    }
}

const SELECT_COLUMNS: &str =
    "id, title, year, episode, character, identity, timestamp, photos, created_at";

impl WorkStore for CatalogStore {
    fn add(&mut self, draft: &WorkDraft) -> Result<i64, StoreError> {
        let created_at = draft.created_at.clone().unwrap_or_else(iso_now);
        let photos_json = serde_json::to_string(&draft.photos)?;

        self.conn.execute(
            "INSERT INTO works (title, year, episode, character, identity, timestamp, photos, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                draft.title,
                draft.year,
                draft.episode,
                draft.character,
                draft.identity,
                draft.timestamp,
                photos_json,
                created_at,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, title = %draft.title, "work added");
        Ok(id)
    }

    fn update(&mut self, record: &WorkRecord) -> Result<i64, StoreError> {
        let photos_json = serde_json::to_string(&record.photos)?;

        let changed = self.conn.execute(
            "UPDATE works
             SET title = ?1, year = ?2, episode = ?3, character = ?4,
                 identity = ?5, timestamp = ?6, photos = ?7, created_at = ?8
             WHERE id = ?9",
            rusqlite::params![
                record.title,
                record.year,
                record.episode,
                record.character,
                record.identity,
                record.timestamp,
                photos_json,
                record.created_at,
                record.id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        debug!(id = record.id, "work updated");
        Ok(record.id)
    }

    fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM works WHERE id = ?1", rusqlite::params![id])?;
        debug!(id, "work deleted");
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<WorkRecord>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM works ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut works = Vec::new();
        for row in rows {
            let (mut record, photos_json) = row?;
            record.photos = serde_json::from_str(&photos_json)?;
            works.push(record);
        }
        Ok(works)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<WorkRecord>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM works WHERE id = ?1");
        let found = self
            .conn
            .query_row(&sql, rusqlite::params![id], Self::row_to_record)
            .optional()?;

        match found {
            Some((mut record, photos_json)) => {
                record.photos = serde_json::from_str(&photos_json)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
