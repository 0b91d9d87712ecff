//! Spreadsheet ingestion pipeline
//!
//! Turns an uploaded spreadsheet into deduplicated defect records in four
//! stages, each a pure function over the previous stage's output:
//! - reader: decode the binary into a grid of cell strings
//! - mapper: locate the twelve logical fields by fuzzy header match
//! - normalizer: convert raw rows into typed records
//! - reconciler: dedup against the active universe and roll the weekly sets

mod mapper;
mod normalizer;
mod reader;
mod reconciler;

pub use mapper::ColumnMap;
pub use normalizer::{
    infer_year, normalize_rows, parse_comment_block, parse_flexible_date, NormalizedBatch,
};
pub use reader::{read_grid, DecodeError};
pub use reconciler::{extend_options, reconcile, roll_over, ReconcileOutcome, Rollover};

use serde::Serialize;
use thiserror::Error;

/// Why an ingest run failed outright.
///
/// Soft per-row anomalies never reach this type; they are counted in the
/// [`IngestReport`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Outcome of one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records installed as the new current week
    pub added: usize,
    /// Records dropped because their id is already tracked
    pub skipped_existing: usize,
    /// Later occurrences of an id repeated within the file
    pub duplicate_in_file: usize,
    /// Rows lacking both incident id and description
    pub invalid_rows: usize,
    /// Whether the weekly sets were replaced
    pub rolled_over: bool,
}

impl IngestReport {
    /// One-line human summary, mirroring what the CLI prints.
    pub fn summary(&self) -> String {
        if !self.rolled_over {
            if self.skipped_existing > 0 {
                format!(
                    "No new bugs found. Skipped {} already-tracked duplicate(s).",
                    self.skipped_existing
                )
            } else if self.duplicate_in_file > 0 {
                format!(
                    "No new bugs found. File had {} internal duplicate(s).",
                    self.duplicate_in_file
                )
            } else {
                "No bugs found in the uploaded file.".to_string()
            }
        } else {
            let mut line = format!("Imported {} new bug(s).", self.added);
            if self.skipped_existing > 0 {
                line.push_str(&format!(
                    " Skipped {} already-tracked duplicate(s).",
                    self.skipped_existing
                ));
            }
            if self.duplicate_in_file > 0 {
                line.push_str(&format!(
                    " File had {} internal duplicate(s).",
                    self.duplicate_in_file
                ));
            }
            line
        }
    }
}
