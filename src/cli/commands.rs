//! Command implementations

use crate::cli::{AttachAction, EditArgs, OutputFormat, WeekFilter};
use crate::config::{LedgerConfig, DB_FILE};
use crate::model::{Attachment, DefectRecord, Field, NewDefect, OptionField};
use crate::store::SqliteStore;
use crate::tracker::{SystemClock, Tracker, Week};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The tracker as the CLI runs it: on-disk store, real clock
pub type LedgerTracker = Tracker<SqliteStore, SystemClock>;

/// Open the ledger under the given data directory, creating it on first use
pub fn open_tracker(data_dir: &Path) -> Result<LedgerTracker> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let config = LedgerConfig::load_or_default(data_dir)?;
    let store = SqliteStore::open(data_dir.join(DB_FILE))?;

    Ok(Tracker::new(store, SystemClock, config))
}

/// Import a spreadsheet as the new current week
pub fn import(data_dir: &Path, file: &Path, format: OutputFormat) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let report = tracker.ingest(&bytes)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("{}", report.summary());
            if report.invalid_rows > 0 {
                println!(
                    "  Skipped {} row(s) with no incident id or description.",
                    report.invalid_rows
                );
            }
        }
    }

    Ok(())
}

/// Export the open-defect summary workbook
pub fn export(data_dir: &Path, output: Option<&Path>) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    match tracker.export_open_summary()? {
        Some(bytes) => {
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(&tracker.config().export_file_name));

            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {:?}", path))?;

            println!("✓ Exported open-defect summary to {:?}", path);
        }
        None => println!("No open defects to export."),
    }

    Ok(())
}

#[derive(Serialize)]
struct ListedRecord<'a> {
    week: String,
    #[serde(flatten)]
    record: &'a DefectRecord,
}

/// List tracked defects
pub fn list(
    data_dir: &Path,
    week: WeekFilter,
    owner: Option<&str>,
    open_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let tracker = open_tracker(data_dir)?;
    let (current, last) = tracker.weekly_sets()?;

    let mut rows: Vec<(Week, DefectRecord)> = Vec::new();
    if matches!(week, WeekFilter::Current | WeekFilter::All) {
        rows.extend(current.into_iter().map(|r| (Week::Current, r)));
    }
    if matches!(week, WeekFilter::Last | WeekFilter::All) {
        rows.extend(last.into_iter().map(|r| (Week::Last, r)));
    }

    rows.retain(|(_, record)| {
        owner.map_or(true, |o| record.corrective_owner.eq_ignore_ascii_case(o))
            && (!open_only || record.is_open())
    });

    match format {
        OutputFormat::Json => {
            let listed: Vec<ListedRecord> = rows
                .iter()
                .map(|(week, record)| ListedRecord {
                    week: week.to_string(),
                    record,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No defects tracked.");
                return Ok(());
            }

            for (week, record) in &rows {
                println!(
                    "[{:<7}] {:<12} {:<10} {:<16} {}",
                    week,
                    record.incident_id,
                    record.corrective_status,
                    record.corrective_owner,
                    record.description
                );
            }
            println!("\n{} defect(s)", rows.len());
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentInfo<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    mime_type: &'a str,
    size: u64,
    upload_date: &'a str,
}

impl<'a> From<&'a Attachment> for AttachmentInfo<'a> {
    fn from(a: &'a Attachment) -> Self {
        Self {
            id: &a.id,
            name: &a.name,
            mime_type: &a.mime_type,
            size: a.size,
            upload_date: &a.upload_date,
        }
    }
}

/// Show one defect in full
pub fn show(data_dir: &Path, incident_id: &str, format: OutputFormat) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    let (week, record) = tracker
        .find_record(incident_id)?
        .ok_or_else(|| anyhow::anyhow!("No record with incident id {}", incident_id))?;
    let attachments = tracker.attachments(incident_id)?;

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ShownRecord<'a> {
                week: String,
                #[serde(flatten)]
                record: &'a DefectRecord,
                attachments: Vec<AttachmentInfo<'a>>,
            }

            let shown = ShownRecord {
                week: week.to_string(),
                record: &record,
                attachments: attachments.iter().map(AttachmentInfo::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        OutputFormat::Text => {
            println!("Defect {} ({} week)", record.incident_id, week);
            println!("=======================\n");

            for field in Field::ALL {
                if field == Field::DetailedComments {
                    continue;
                }
                println!("{:<26} {}", field.label(), field.value_of(&record));
            }
            println!("{:<26} {}", "Last Updated", record.last_updated);

            if !record.comments.is_empty() {
                println!("\nComments:");
                for comment in &record.comments {
                    println!("  [{}] {}", comment.time, comment.text);
                }
            }

            if !attachments.is_empty() {
                println!("\nAttachments:");
                for attachment in &attachments {
                    println!(
                        "  {}  {} ({}, {} bytes)",
                        attachment.id, attachment.name, attachment.mime_type, attachment.size
                    );
                }
            }
        }
    }

    Ok(())
}

/// Create a defect or update its fields
pub fn edit(data_dir: &Path, args: &EditArgs, format: OutputFormat) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    let record = match tracker.find_record(&args.incident_id)? {
        Some((_, existing)) => apply_edits(existing, args),
        None => DefectRecord::new(NewDefect {
            application: args.application.clone().unwrap_or_default(),
            business_function: args.business_function.clone().unwrap_or_default(),
            incident_id: args.incident_id.clone(),
            description: args.description.clone().unwrap_or_default(),
            date_reported: args.date_reported.clone().unwrap_or_default(),
            status: args.status.clone().unwrap_or_default(),
            environment: args.environment.clone().unwrap_or_default(),
            root_cause: args.root_cause.clone().unwrap_or_default(),
            detailed_comments: String::new(),
            qa_corrective_action: args.qa_corrective_action.clone().unwrap_or_default(),
            corrective_status: args.corrective_status.clone().unwrap_or_default(),
            corrective_owner: args.corrective_owner.clone().unwrap_or_default(),
            last_updated: String::new(),
            comments: Vec::new(),
        })
        .ok_or_else(|| anyhow::anyhow!("A new record needs an incident id or a description"))?,
    };

    let saved = tracker.upsert_record(record)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&saved)?),
        OutputFormat::Text => println!("✓ Saved defect {}", saved.incident_id),
    }

    Ok(())
}

fn apply_edits(mut record: DefectRecord, args: &EditArgs) -> DefectRecord {
    if let Some(v) = &args.application {
        record.application = v.clone();
    }
    if let Some(v) = &args.business_function {
        record.business_function = v.clone();
    }
    if let Some(v) = &args.description {
        record.description = v.clone();
    }
    if let Some(v) = &args.date_reported {
        record.date_reported = v.clone();
    }
    if let Some(v) = &args.status {
        record.status = v.clone();
    }
    if let Some(v) = &args.environment {
        record.environment = v.clone();
    }
    if let Some(v) = &args.root_cause {
        record.root_cause = v.clone();
    }
    if let Some(v) = &args.qa_corrective_action {
        record.qa_corrective_action = v.clone();
    }
    if let Some(v) = &args.corrective_status {
        record.corrective_status = v.clone();
    }
    if let Some(v) = &args.corrective_owner {
        record.corrective_owner = v.clone();
    }
    record
}

/// Post a comment on a defect
pub fn comment(data_dir: &Path, incident_id: &str, text: &str, format: OutputFormat) -> Result<()> {
    let tracker = open_tracker(data_dir)?;
    let updated = tracker.post_comment(incident_id, text)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Text => println!(
            "✓ Comment posted on {} ({} total)",
            updated.incident_id,
            updated.comments.len()
        ),
    }

    Ok(())
}

/// Manage attachments on a defect
pub fn attach(data_dir: &Path, action: &AttachAction, format: OutputFormat) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    match action {
        AttachAction::Add {
            incident_id,
            file,
            name,
        } => {
            let bytes =
                std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;

            let display_name = name.clone().unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let mime_type = Attachment::mime_from_name(&display_name)
                .ok_or_else(|| anyhow::anyhow!("File type not supported: {}", display_name))?;

            let attachment = tracker.add_attachment(incident_id, &display_name, mime_type, &bytes)?;
            println!("✓ Attached {} ({})", attachment.name, attachment.id);
        }

        AttachAction::List { incident_id } => {
            let attachments = tracker.attachments(incident_id)?;

            match format {
                OutputFormat::Json => {
                    let infos: Vec<AttachmentInfo> =
                        attachments.iter().map(AttachmentInfo::from).collect();
                    println!("{}", serde_json::to_string_pretty(&infos)?);
                }
                OutputFormat::Text => {
                    if attachments.is_empty() {
                        println!("No attachments on {}.", incident_id);
                        return Ok(());
                    }
                    for attachment in &attachments {
                        println!(
                            "{}  {} ({}, {} bytes, uploaded {})",
                            attachment.id,
                            attachment.name,
                            attachment.mime_type,
                            attachment.size,
                            attachment.upload_date
                        );
                    }
                }
            }
        }

        AttachAction::Save {
            incident_id,
            attachment_id,
            output,
        } => {
            let attachments = tracker.attachments(incident_id)?;
            let attachment = attachments
                .iter()
                .find(|a| a.id == *attachment_id)
                .ok_or_else(|| {
                    anyhow::anyhow!("No attachment {} on record {}", attachment_id, incident_id)
                })?;

            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&attachment.name));
            std::fs::write(&path, attachment.payload()?)
                .with_context(|| format!("Failed to write {:?}", path))?;

            println!("✓ Saved {:?}", path);
        }

        AttachAction::Rename {
            incident_id,
            attachment_id,
            name,
        } => {
            tracker.rename_attachment(incident_id, attachment_id, name)?;
            println!("✓ Renamed attachment {} to {}", attachment_id, name);
        }

        AttachAction::Remove {
            incident_id,
            attachment_id,
        } => {
            tracker.remove_attachment(incident_id, attachment_id)?;
            println!("✓ Removed attachment {}", attachment_id);
        }
    }

    Ok(())
}

/// Delete a defect and its attachments
pub fn delete(data_dir: &Path, incident_id: &str, yes: bool) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    if !yes
        && !confirm(&format!(
            "Delete defect {}? This cannot be undone.",
            incident_id
        ))?
    {
        println!("Aborted.");
        return Ok(());
    }

    if tracker.delete_record(incident_id)? {
        println!("✓ Deleted defect {}", incident_id);
    } else {
        anyhow::bail!("No record with incident id {}", incident_id);
    }

    Ok(())
}

/// Delete every tracked defect
pub fn clear(data_dir: &Path, yes: bool) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    if !yes && !confirm("Delete every tracked defect? This cannot be undone.")? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = tracker.clear()?;
    println!("✓ Cleared {} defect(s). Ready for a fresh upload.", removed);

    Ok(())
}

/// Show or edit the option lists
pub fn options(
    data_dir: &Path,
    field: Option<&str>,
    add: Option<&str>,
    remove: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let tracker = open_tracker(data_dir)?;

    let Some(name) = field else {
        if add.is_some() || remove.is_some() {
            anyhow::bail!("--add/--remove need a field name");
        }

        match format {
            OutputFormat::Json => {
                let mut all = BTreeMap::new();
                for f in OptionField::ALL {
                    all.insert(f.storage_key(), tracker.options(f)?);
                }
                println!("{}", serde_json::to_string_pretty(&all)?);
            }
            OutputFormat::Text => {
                for f in OptionField::ALL {
                    println!("{}:", f.label());
                    for value in tracker.options(f)? {
                        println!("  - {}", value);
                    }
                }
            }
        }
        return Ok(());
    };

    let field = OptionField::from_name(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown option field: {}", name))?;

    if let Some(value) = add {
        if tracker.add_option(field, value)? {
            println!("✓ Added {:?} to {} options", value, field.label());
        } else {
            println!("{:?} is already a {} option.", value, field.label());
        }
    }

    if let Some(value) = remove {
        tracker.remove_option(field, value)?;
        println!("✓ Removed {:?} from {} options", value, field.label());
    }

    if add.is_none() && remove.is_none() {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&tracker.options(field)?)?)
            }
            OutputFormat::Text => {
                println!("{}:", field.label());
                for value in tracker.options(field)? {
                    println!("  - {}", value);
                }
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    current_week: usize,
    current_week_open: usize,
    last_week: usize,
    last_week_open: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    by_owner: Option<BTreeMap<String, usize>>,
}

/// Show ledger status
pub fn status(data_dir: &Path, by_owner: bool, format: OutputFormat) -> Result<()> {
    let tracker = open_tracker(data_dir)?;
    let (current, last) = tracker.weekly_sets()?;

    let owner_counts = by_owner.then(|| {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in current.iter().chain(last.iter()) {
            *counts.entry(record.corrective_owner.clone()).or_default() += 1;
        }
        counts
    });

    let report = StatusReport {
        current_week: current.len(),
        current_week_open: current.iter().filter(|r| r.is_open()).count(),
        last_week: last.len(),
        last_week_open: last.iter().filter(|r| r.is_open()).count(),
        by_owner: owner_counts,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Bugledger Status");
            println!("================\n");

            println!("Data directory: {:?}", data_dir);
            println!(
                "Current week: {} defect(s), {} open",
                report.current_week, report.current_week_open
            );
            println!(
                "Last week: {} defect(s), {} open",
                report.last_week, report.last_week_open
            );

            if let Some(counts) = &report.by_owner {
                println!("\nBy corrective-action owner:");
                for (owner, count) in counts {
                    println!("  {:<16} {}", owner, count);
                }
            }
        }
    }

    Ok(())
}

/// Ask the user to confirm a destructive action
fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
