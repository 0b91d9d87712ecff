//! Database schema definition

/// SQL schema for the bugledger database
///
/// Persisted state is whole-document key-value blobs: every write replaces
/// an entire value, so one table covers the weekly sets, the option lists
/// and the per-record attachment lists.
pub const SCHEMA: &str = r#"
-- Whole-document JSON blobs keyed by collection name
CREATE TABLE IF NOT EXISTS blobs (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
