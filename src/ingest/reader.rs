//! Spreadsheet reader
//!
//! Decodes an uploaded binary into a rectangular grid of cell strings.
//! Format detection is automatic and covers both the legacy `.xls` and the
//! XML-based `.xlsx` containers. Row 0 of the grid is the header row.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use thiserror::Error;

/// The uploaded binary could not be decoded as a spreadsheet.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a recognized spreadsheet format: {0}")]
    Format(#[from] calamine::Error),

    #[error("workbook contains no sheets")]
    EmptyWorkbook,
}

/// Decode spreadsheet bytes into a grid of cell strings.
///
/// Only the first worksheet is read. Cells outside the sheet's used range
/// are absent from the grid; downstream field extraction treats a missing
/// cell as an empty string.
pub fn read_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::EmptyWorkbook)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// Render one cell as the string the rest of the pipeline works with.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(t) if t.time() == chrono::NaiveTime::MIN => t.format("%m/%d/%Y").to_string(),
            Some(t) => t.format("%m/%d/%Y %H:%M:%S").to_string(),
            None => String::new(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}
