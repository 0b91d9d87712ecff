//! Persistence layer for the defect ledger
//!
//! This module handles persistent storage of:
//! - The two weekly sets of defect records
//! - Attachment lists, keyed by the owning record's incident id
//! - The six option lists
//!
//! Everything is stored as whole-document key-value blobs behind the
//! [`BlobStore`] trait, so the reconciliation logic can be tested against
//! an in-memory store without a real database.

mod schema;

pub use schema::SCHEMA;

use crate::model::{Attachment, DefectRecord, OptionField};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Key holding the current-week record list
pub const CURRENT_WEEK_KEY: &str = "currentWeekBugs";

/// Key holding the last-week record list
pub const LAST_WEEK_KEY: &str = "lastWeekBugs";

/// Key holding a record's attachment list
pub fn attachments_key(incident_id: &str) -> String {
    format!("attachments_{}", incident_id)
}

/// Whole-document key-value persistence.
///
/// Every write replaces an entire value; there is no partial update and no
/// cross-key transaction.
pub trait BlobStore {
    /// Read a blob, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a blob, replacing any previous value
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a blob; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

// ==================== SQLite store ====================

/// SQLite-backed blob store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", path.as_ref()))?;

        let store = Self { conn };
        store.initialize()?;

        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        let store = Self { conn };
        store.initialize()?;

        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }
}

impl BlobStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Failed to read blob {}", key))?;

        Ok(result)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = datetime('now')
                "#,
                params![key, value],
            )
            .with_context(|| format!("Failed to write blob {}", key))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM blobs WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to delete blob {}", key))?;

        Ok(())
    }
}

// ==================== In-memory store ====================

/// HashMap-backed blob store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

// ==================== Ledger ====================

/// Typed repository over a blob store.
///
/// One method per persisted collection; callers never touch raw keys.
pub struct Ledger<S> {
    store: S,
}

impl<S: BlobStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The current-week record set, in stored order
    pub fn current_week(&self) -> Result<Vec<DefectRecord>> {
        self.read_list(CURRENT_WEEK_KEY)
    }

    /// The last-week record set, in stored order
    pub fn last_week(&self) -> Result<Vec<DefectRecord>> {
        self.read_list(LAST_WEEK_KEY)
    }

    /// Replace both weekly sets
    pub fn replace_weeks(&self, current: &[DefectRecord], last: &[DefectRecord]) -> Result<()> {
        self.write_list(CURRENT_WEEK_KEY, current)?;
        self.write_list(LAST_WEEK_KEY, last)?;
        Ok(())
    }

    /// Stored option list for a field, `None` when never written
    pub fn options(&self, field: OptionField) -> Result<Option<Vec<String>>> {
        match self.store.get(field.storage_key())? {
            Some(raw) => Ok(parse_blob(field.storage_key(), &raw)),
            None => Ok(None),
        }
    }

    /// Replace a field's option list
    pub fn set_options(&self, field: OptionField, values: &[String]) -> Result<()> {
        self.write_list(field.storage_key(), values)
    }

    /// Attachment list for a record, empty when none were ever stored
    pub fn attachments(&self, incident_id: &str) -> Result<Vec<Attachment>> {
        self.read_list(&attachments_key(incident_id))
    }

    /// Replace a record's attachment list
    pub fn set_attachments(&self, incident_id: &str, attachments: &[Attachment]) -> Result<()> {
        self.write_list(&attachments_key(incident_id), attachments)
    }

    /// Delete a record's attachment list
    pub fn remove_attachments(&self, incident_id: &str) -> Result<()> {
        self.store.remove(&attachments_key(incident_id))
    }

    /// Delete both weekly sets
    pub fn clear_weeks(&self) -> Result<()> {
        self.store.remove(CURRENT_WEEK_KEY)?;
        self.store.remove(LAST_WEEK_KEY)?;
        Ok(())
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.store.get(key)? {
            Some(raw) => Ok(parse_blob(key, &raw).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, values: &[T]) -> Result<()> {
        let raw = serde_json::to_string(values)
            .with_context(|| format!("Failed to serialize blob {}", key))?;
        self.store.put(key, &raw)
    }
}

/// Parse a stored blob, tolerating corruption.
///
/// A blob that no longer parses is treated as absent so a damaged store
/// never blocks the pipeline; the damage is logged and the next write
/// replaces the whole value anyway.
fn parse_blob<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("discarding corrupt blob {}: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewDefect;

    fn record(id: &str) -> DefectRecord {
        DefectRecord::new(NewDefect {
            incident_id: id.to_string(),
            description: format!("defect {}", id),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());

        store.put("k", "v1").unwrap();
        store.put("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.put("currentWeekBugs", "[]").unwrap();
        assert_eq!(store.get("currentWeekBugs").unwrap().as_deref(), Some("[]"));

        store.put("currentWeekBugs", "[1]").unwrap();
        assert_eq!(store.get("currentWeekBugs").unwrap().as_deref(), Some("[1]"));

        store.remove("currentWeekBugs").unwrap();
        assert!(store.get("currentWeekBugs").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put("lastWeekBugs", "[]").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("lastWeekBugs").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_ledger_weekly_sets() {
        let ledger = Ledger::new(MemoryStore::new());
        assert!(ledger.current_week().unwrap().is_empty());

        ledger
            .replace_weeks(&[record("A"), record("B")], &[record("C")])
            .unwrap();

        let current = ledger.current_week().unwrap();
        let last = ledger.last_week().unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].incident_id, "A");
        assert_eq!(last[0].incident_id, "C");
    }

    #[test]
    fn test_ledger_attachment_keys_are_per_record() {
        let ledger = Ledger::new(MemoryStore::new());
        let attachment = Attachment {
            id: "a1".to_string(),
            name: "shot.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 3,
            upload_date: "08/04/2025, 09:30:00 AM".to_string(),
            data: "AAAA".to_string(),
        };

        ledger.set_attachments("526480", &[attachment]).unwrap();
        assert_eq!(ledger.attachments("526480").unwrap().len(), 1);
        assert!(ledger.attachments("526481").unwrap().is_empty());

        ledger.remove_attachments("526480").unwrap();
        assert!(ledger.attachments("526480").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_blob_reads_as_empty() {
        let store = MemoryStore::new();
        store.put(CURRENT_WEEK_KEY, "{not json").unwrap();

        let ledger = Ledger::new(store);
        assert!(ledger.current_week().unwrap().is_empty());
    }

    #[test]
    fn test_options_distinguish_unset_from_empty() {
        let ledger = Ledger::new(MemoryStore::new());
        assert!(ledger.options(OptionField::Application).unwrap().is_none());

        ledger
            .set_options(OptionField::Application, &["GIC".to_string()])
            .unwrap();
        assert_eq!(
            ledger.options(OptionField::Application).unwrap().unwrap(),
            vec!["GIC"]
        );
    }
}
