//! CLI interface using clap
//!
//! Provides the command-line interface for bugledger

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bugledger - local-first defect ledger
#[derive(Parser, Debug)]
#[command(name = "bugledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(short, long, global = true, env = "BUGLEDGER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a spreadsheet of defects as the new current week
    Import(ImportArgs),

    /// Export the open-defect summary workbook
    Export(ExportArgs),

    /// List tracked defects
    List(ListArgs),

    /// Show one defect in full
    Show(ShowArgs),

    /// Create a defect or update its fields
    Edit(EditArgs),

    /// Post a comment on a defect
    Comment(CommentArgs),

    /// Manage file attachments on a defect
    Attach(AttachArgs),

    /// Delete a defect and its attachments
    Delete(DeleteArgs),

    /// Delete every tracked defect
    Clear(ClearArgs),

    /// Show or edit the option lists
    Options(OptionsArgs),

    /// Show ledger status
    Status(StatusArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Weekly set filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WeekFilter {
    Current,
    Last,
    All,
}

/// Arguments for import command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Spreadsheet file (.xlsx or .xls)
    pub file: PathBuf,
}

/// Arguments for export command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output path (defaults to the configured export file name)
    #[arg(short = 'O', long)]
    pub output: Option<PathBuf>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Which weekly set to list
    #[arg(short, long, default_value = "all")]
    pub week: WeekFilter,

    /// Only defects assigned to this corrective-action owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Only defects whose corrective action is still open
    #[arg(long)]
    pub open: bool,
}

/// Arguments for show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Incident id of the defect
    pub incident_id: String,
}

/// Arguments for edit command
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Incident id of the defect to create or update
    pub incident_id: String,

    #[arg(long)]
    pub application: Option<String>,

    #[arg(long)]
    pub business_function: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub date_reported: Option<String>,

    /// Bug status as reported by the source tracker
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub environment: Option<String>,

    #[arg(long)]
    pub root_cause: Option<String>,

    #[arg(long)]
    pub qa_corrective_action: Option<String>,

    /// Corrective-action status (Open/Closed by default)
    #[arg(long)]
    pub corrective_status: Option<String>,

    /// Corrective-action owner
    #[arg(long)]
    pub corrective_owner: Option<String>,
}

/// Arguments for comment command
#[derive(Parser, Debug)]
pub struct CommentArgs {
    /// Incident id of the defect
    pub incident_id: String,

    /// Comment text
    pub text: String,
}

/// Arguments for attach command
#[derive(Parser, Debug)]
pub struct AttachArgs {
    #[command(subcommand)]
    pub action: AttachAction,
}

/// Attachment subcommands
#[derive(Subcommand, Debug)]
pub enum AttachAction {
    /// Attach a file to a defect
    Add {
        /// Incident id of the defect
        incident_id: String,

        /// File to attach
        file: PathBuf,

        /// Display name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// List a defect's attachments
    List {
        /// Incident id of the defect
        incident_id: String,
    },

    /// Write an attachment's payload to disk
    Save {
        /// Incident id of the defect
        incident_id: String,

        /// Attachment id (see attach list)
        attachment_id: String,

        /// Output path (defaults to the attachment's display name)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Rename an attachment
    Rename {
        /// Incident id of the defect
        incident_id: String,

        /// Attachment id (see attach list)
        attachment_id: String,

        /// New display name
        name: String,
    },

    /// Remove an attachment
    Remove {
        /// Incident id of the defect
        incident_id: String,

        /// Attachment id (see attach list)
        attachment_id: String,
    },
}

/// Arguments for delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Incident id of the defect
    pub incident_id: String,

    /// Delete without confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Clear without confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for options command
#[derive(Parser, Debug)]
pub struct OptionsArgs {
    /// Field name (application, business-function, environment, root-cause,
    /// corrective-status, corrective-owner); omit to show all lists
    pub field: Option<String>,

    /// Append a value to the field's list
    #[arg(long)]
    pub add: Option<String>,

    /// Remove a value from the field's list
    #[arg(long)]
    pub remove: Option<String>,
}

/// Arguments for status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Break counts down by corrective-action owner
    #[arg(long)]
    pub by_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["bugledger", "import", "bugs.xlsx"]);
        assert!(matches!(cli.command, Commands::Import(_)));

        if let Commands::Import(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("bugs.xlsx"));
        }
    }

    #[test]
    fn test_list_defaults_to_all_weeks() {
        let cli = Cli::parse_from(["bugledger", "list"]);
        if let Commands::List(args) = cli.command {
            assert_eq!(args.week, WeekFilter::All);
            assert!(!args.open);
        } else {
            panic!("expected list command");
        }
    }

    #[test]
    fn test_attach_subcommands() {
        let cli = Cli::parse_from(["bugledger", "attach", "add", "526480", "shot.png"]);
        if let Commands::Attach(args) = cli.command {
            assert!(matches!(args.action, AttachAction::Add { .. }));
        } else {
            panic!("expected attach command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["bugledger", "-o", "json", "list", "--week", "current"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
