//! Bugledger - Local-first defect ledger
//!
//! This library provides the core functionality for turning an uploaded
//! spreadsheet of reported defects into deduplicated, persisted records,
//! rotating the weekly record sets on each import, and exporting an
//! open-defect summary workbook.

pub mod cli;
pub mod config;
pub mod export;
pub mod ingest;
pub mod model;
pub mod store;
pub mod tracker;

/// Re-export commonly used types
pub use ingest::{IngestError, IngestReport};
pub use model::{Attachment, Comment, DefectRecord};
pub use store::{BlobStore, Ledger, MemoryStore, SqliteStore};
pub use tracker::{Clock, SystemClock, Tracker};

/// Application-wide error type
pub use anyhow::Result;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "bugledger";
