//! Engine facade
//!
//! `Tracker` wires the ingestion pipeline, the export builder and the
//! ledger repository together behind the operations the CLI calls. Both
//! the clock and the store are injected, so every operation here runs
//! deterministically under test without touching a real database.

mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use crate::config::LedgerConfig;
use crate::export;
use crate::ingest::{self, ColumnMap, IngestError, IngestReport};
use crate::model::{format_timestamp, Attachment, Comment, DefectRecord, OptionField};
use crate::store::{BlobStore, Ledger};
use anyhow::{anyhow, bail, Result};
use std::collections::HashSet;

/// Which weekly set a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Week {
    Current,
    Last,
}

impl std::fmt::Display for Week {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Week::Current => write!(f, "current"),
            Week::Last => write!(f, "last"),
        }
    }
}

/// The defect ledger engine
pub struct Tracker<S, C> {
    ledger: Ledger<S>,
    clock: C,
    config: LedgerConfig,
}

impl<S: BlobStore, C: Clock> Tracker<S, C> {
    pub fn new(store: S, clock: C, config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::new(store),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ==================== Ingestion ====================

    /// Run the full ingestion pipeline over uploaded spreadsheet bytes.
    ///
    /// Decode failures abort before any state is touched. When the batch
    /// deduplicates down to nothing, the weekly sets stay exactly as they
    /// were and the report says what was skipped; otherwise the prior
    /// universe is demoted to "last week" and the batch becomes the new
    /// current week.
    pub fn ingest(&self, bytes: &[u8]) -> Result<IngestReport, IngestError> {
        let grid = ingest::read_grid(bytes)?;

        let Some((header, rows)) = grid.split_first() else {
            return Ok(IngestReport::default());
        };

        let columns = ColumnMap::from_headers(header);
        tracing::debug!("mapped {} of 12 columns", columns.mapped_count());

        let batch = ingest::normalize_rows(rows, &columns, self.clock.now());

        let current = self.ledger.current_week()?;
        let last = self.ledger.last_week()?;
        let existing_ids: HashSet<String> = current
            .iter()
            .chain(last.iter())
            .map(|r| r.incident_id.clone())
            .collect();

        let outcome = ingest::reconcile(batch.records, &existing_ids);

        let mut report = IngestReport {
            added: outcome.accepted.len(),
            skipped_existing: outcome.skipped_existing,
            duplicate_in_file: outcome.duplicate_in_file,
            invalid_rows: batch.invalid_rows,
            rolled_over: false,
        };

        if !outcome.has_new_records() {
            return Ok(report);
        }

        for field in OptionField::ALL {
            let existing = self.options(field)?;
            let extended = ingest::extend_options(&existing, &outcome.accepted, field);
            if extended.len() != existing.len() {
                self.ledger.set_options(field, &extended)?;
            }
        }

        let rollover = ingest::roll_over(outcome.accepted, current, last);
        self.ledger.replace_weeks(&rollover.current, &rollover.last)?;

        report.rolled_over = true;
        Ok(report)
    }

    // ==================== Export ====================

    /// Build the open-summary workbook, `None` when nothing is open.
    pub fn export_open_summary(&self) -> Result<Option<Vec<u8>>> {
        let current = self.ledger.current_week()?;
        let last = self.ledger.last_week()?;
        export::open_summary_workbook(&current, &last, &self.config)
    }

    // ==================== Record access ====================

    /// Both weekly sets, in stored order
    pub fn weekly_sets(&self) -> Result<(Vec<DefectRecord>, Vec<DefectRecord>)> {
        Ok((self.ledger.current_week()?, self.ledger.last_week()?))
    }

    /// Locate a record by incident id
    pub fn find_record(&self, incident_id: &str) -> Result<Option<(Week, DefectRecord)>> {
        for record in self.ledger.current_week()? {
            if record.incident_id == incident_id {
                return Ok(Some((Week::Current, record)));
            }
        }
        for record in self.ledger.last_week()? {
            if record.incident_id == incident_id {
                return Ok(Some((Week::Last, record)));
            }
        }
        Ok(None)
    }

    // ==================== Record mutation ====================

    /// Save a record, refreshing its last-updated timestamp.
    ///
    /// An id already tracked is replaced in place in whichever weekly set
    /// holds it; a new id is prepended to the current week.
    pub fn upsert_record(&self, mut record: DefectRecord) -> Result<DefectRecord> {
        record.last_updated = format_timestamp(self.clock.now());

        let mut current = self.ledger.current_week()?;
        let mut last = self.ledger.last_week()?;

        if let Some(slot) = current
            .iter_mut()
            .find(|r| r.incident_id == record.incident_id)
        {
            *slot = record.clone();
        } else if let Some(slot) = last
            .iter_mut()
            .find(|r| r.incident_id == record.incident_id)
        {
            *slot = record.clone();
        } else {
            current.insert(0, record.clone());
        }

        self.ledger.replace_weeks(&current, &last)?;
        Ok(record)
    }

    /// Prepend a comment to a record and refresh its timestamp.
    pub fn post_comment(&self, incident_id: &str, text: &str) -> Result<DefectRecord> {
        let now = self.clock.now();
        let stamp = format_timestamp(now);

        let mut current = self.ledger.current_week()?;
        let mut last = self.ledger.last_week()?;

        let slot = current
            .iter_mut()
            .chain(last.iter_mut())
            .find(|r| r.incident_id == incident_id)
            .ok_or_else(|| anyhow!("no record with incident id {}", incident_id))?;

        slot.comments.insert(0, Comment::posted(text, now));
        slot.last_updated = stamp;
        let updated = slot.clone();

        self.ledger.replace_weeks(&current, &last)?;
        Ok(updated)
    }

    /// Delete a record and all of its attachments.
    ///
    /// Returns false when no record carried the id.
    pub fn delete_record(&self, incident_id: &str) -> Result<bool> {
        let mut current = self.ledger.current_week()?;
        let mut last = self.ledger.last_week()?;

        let before = current.len() + last.len();
        current.retain(|r| r.incident_id != incident_id);
        last.retain(|r| r.incident_id != incident_id);

        if current.len() + last.len() == before {
            return Ok(false);
        }

        self.ledger.replace_weeks(&current, &last)?;
        self.ledger.remove_attachments(incident_id)?;
        Ok(true)
    }

    /// Wipe both weekly sets and the attachments of every active record.
    ///
    /// Returns how many records were removed.
    pub fn clear(&self) -> Result<usize> {
        let current = self.ledger.current_week()?;
        let last = self.ledger.last_week()?;
        let removed = current.len() + last.len();

        for record in current.iter().chain(last.iter()) {
            self.ledger.remove_attachments(&record.incident_id)?;
        }
        self.ledger.clear_weeks()?;

        Ok(removed)
    }

    // ==================== Option lists ====================

    /// Option list for a field: stored values, else the configured seeds.
    pub fn options(&self, field: OptionField) -> Result<Vec<String>> {
        Ok(self
            .ledger
            .options(field)?
            .unwrap_or_else(|| self.config.seed_options(field).to_vec()))
    }

    /// Append a value to a field's option list.
    ///
    /// Returns false when the value was already present.
    pub fn add_option(&self, field: OptionField, value: &str) -> Result<bool> {
        let mut options = self.options(field)?;
        if options.iter().any(|v| v == value) {
            return Ok(false);
        }

        options.push(value.to_string());
        self.ledger.set_options(field, &options)?;
        Ok(true)
    }

    /// Remove a value from a field's option list.
    ///
    /// The last remaining value cannot be removed.
    pub fn remove_option(&self, field: OptionField, value: &str) -> Result<()> {
        let options = self.options(field)?;
        if !options.iter().any(|v| v == value) {
            bail!("{} is not an option for {}", value, field.label());
        }
        if options.len() == 1 {
            bail!("cannot remove the last {} option", field.label());
        }

        let remaining: Vec<String> = options.into_iter().filter(|v| v != value).collect();
        self.ledger.set_options(field, &remaining)?;
        Ok(())
    }

    // ==================== Attachments ====================

    /// Attach a file to a record.
    pub fn add_attachment(
        &self,
        incident_id: &str,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<Attachment> {
        if self.find_record(incident_id)?.is_none() {
            bail!("no record with incident id {}", incident_id);
        }

        let attachment = Attachment::from_bytes(name, mime_type, bytes, self.clock.now())?;

        let mut attachments = self.ledger.attachments(incident_id)?;
        attachments.push(attachment.clone());
        self.ledger.set_attachments(incident_id, &attachments)?;
        self.touch_record(incident_id)?;

        Ok(attachment)
    }

    /// Attachments of a record, in upload order
    pub fn attachments(&self, incident_id: &str) -> Result<Vec<Attachment>> {
        self.ledger.attachments(incident_id)
    }

    /// Rename an attachment.
    pub fn rename_attachment(
        &self,
        incident_id: &str,
        attachment_id: &str,
        new_name: &str,
    ) -> Result<()> {
        if new_name.trim().is_empty() {
            bail!("attachment name cannot be empty");
        }

        let mut attachments = self.ledger.attachments(incident_id)?;
        let slot = attachments
            .iter_mut()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| anyhow!("no attachment {} on record {}", attachment_id, incident_id))?;

        slot.name = new_name.trim().to_string();
        self.ledger.set_attachments(incident_id, &attachments)?;
        self.touch_record(incident_id)?;
        Ok(())
    }

    /// Remove one attachment from a record.
    pub fn remove_attachment(&self, incident_id: &str, attachment_id: &str) -> Result<()> {
        let mut attachments = self.ledger.attachments(incident_id)?;
        let before = attachments.len();
        attachments.retain(|a| a.id != attachment_id);

        if attachments.len() == before {
            bail!("no attachment {} on record {}", attachment_id, incident_id);
        }

        self.ledger.set_attachments(incident_id, &attachments)?;
        self.touch_record(incident_id)?;
        Ok(())
    }

    /// Refresh a record's last-updated stamp wherever it lives.
    fn touch_record(&self, incident_id: &str) -> Result<()> {
        let stamp = format_timestamp(self.clock.now());

        let mut current = self.ledger.current_week()?;
        let mut last = self.ledger.last_week()?;

        let mut found = false;
        for slot in current.iter_mut().chain(last.iter_mut()) {
            if slot.incident_id == incident_id {
                slot.last_updated = stamp.clone();
                found = true;
            }
        }

        if found {
            self.ledger.replace_weeks(&current, &last)?;
        }
        Ok(())
    }
}
