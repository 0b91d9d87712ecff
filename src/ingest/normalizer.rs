//! Record normalizer
//!
//! Converts raw grid rows into typed defect records. Normalization never
//! fails a batch: a row that is not a valid defect entry is counted and
//! skipped, so a file with a few malformed rows still yields all of its
//! valid records.

use crate::ingest::ColumnMap;
use crate::model::{format_timestamp, Comment, DefectRecord, Field, NewDefect};
use chrono::{NaiveDate, NaiveDateTime};

/// Result of normalizing one uploaded grid.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    /// Valid records, in row order
    pub records: Vec<DefectRecord>,
    /// Rows dropped for lacking both incident id and description
    pub invalid_rows: usize,
}

/// Normalize data rows (the grid minus its header row) into defect records.
///
/// All records in a batch share the same import timestamp, which becomes
/// both their `last_updated` value and the stamp on every comment parsed
/// out of a legacy comment blob.
pub fn normalize_rows(
    rows: &[Vec<String>],
    columns: &ColumnMap,
    import_time: NaiveDateTime,
) -> NormalizedBatch {
    let last_updated = format_timestamp(import_time);
    let mut records = Vec::new();
    let mut invalid_rows = 0;

    for (index, row) in rows.iter().enumerate() {
        let comments = parse_comment_block(columns.value(Field::DetailedComments, row), import_time);

        let candidate = DefectRecord::new(NewDefect {
            application: columns.value(Field::Application, row).to_string(),
            business_function: columns.value(Field::BusinessFunction, row).to_string(),
            incident_id: columns.value(Field::IncidentId, row).to_string(),
            description: columns.value(Field::Description, row).to_string(),
            date_reported: columns.value(Field::DateReported, row).to_string(),
            status: columns.value(Field::Status, row).to_string(),
            environment: columns.value(Field::Environment, row).to_string(),
            root_cause: columns.value(Field::RootCause, row).to_string(),
            detailed_comments: columns.value(Field::DetailedComments, row).to_string(),
            qa_corrective_action: columns.value(Field::QaCorrectiveAction, row).to_string(),
            corrective_status: columns.value(Field::CorrectiveStatus, row).to_string(),
            corrective_owner: columns.value(Field::CorrectiveOwner, row).to_string(),
            last_updated: last_updated.clone(),
            comments,
        });

        match candidate {
            Some(record) => records.push(record),
            None => {
                invalid_rows += 1;
                // Header is row 1 in the sheet, so data row N is sheet row N+2.
                tracing::debug!("skipping sheet row {}: no incident id or description", index + 2);
            }
        }
    }

    NormalizedBatch {
        records,
        invalid_rows,
    }
}

/// Split a legacy multi-line comment blob into structured comments.
///
/// Each non-empty line becomes one comment stamped with the import time.
/// The source data carries no per-line timestamps, so every comment in a
/// blob gets the same stamp; the sort keeps the result deterministic should
/// that ever change.
pub fn parse_comment_block(text: &str, import_time: NaiveDateTime) -> Vec<Comment> {
    let mut comments: Vec<Comment> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Comment::imported(line, import_time))
        .collect();

    comments.sort_by(|a, b| a.sort_date.cmp(&b.sort_date));
    comments
}

/// Resolve the year for a day/month fragment that carries none.
///
/// Entries in the source tracking systems are always dated in the past
/// relative to upload time, so a fragment that would land in the future is
/// taken to mean the previous year. A fragment equal to today also takes
/// the previous-year branch; the source behavior at that boundary is
/// ambiguous and is preserved as-is.
pub fn infer_year(day: u32, month: u32, today: NaiveDate) -> i32 {
    use chrono::Datelike;

    if month < today.month() || (month == today.month() && day < today.day()) {
        today.year()
    } else {
        today.year() - 1
    }
}

/// Parse a `DD/MM` or `DD/MM/YYYY` fragment into a canonical timestamp.
///
/// Two-part fragments get their year inferred via [`infer_year`]. Returns
/// `None` when the fragment does not name a real calendar date.
pub fn parse_flexible_date(fragment: &str, today: NaiveDate) -> Option<String> {
    let parts: Vec<&str> = fragment.split('/').collect();

    let (day, month, year) = match parts.as_slice() {
        [day, month] => {
            let day: u32 = day.trim().parse().ok()?;
            let month: u32 = month.trim().parse().ok()?;
            (day, month, infer_year(day, month, today))
        }
        [day, month, year] => (
            day.trim().parse().ok()?,
            month.trim().parse().ok()?,
            year.trim().parse().ok()?,
        ),
        _ => return None,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(format_timestamp(date.and_hms_opt(0, 0, 0)?))
}
