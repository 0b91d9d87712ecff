//! Ledger configuration
//!
//! A TOML file under the data directory carries the seeded option lists,
//! export column label overrides and the default export file name. Missing
//! fields fall back to built-in defaults, so a partial file is fine.

use crate::model::{Field, OptionField};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the database file inside the data directory
pub const DB_FILE: &str = "bugledger.db";

/// Configuration for a ledger instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Seed values for the application option list
    #[serde(default)]
    pub application_options: Vec<String>,

    /// Seed values for the business-function option list
    #[serde(default)]
    pub business_function_options: Vec<String>,

    /// Seed values for the environment option list
    #[serde(default = "default_environment_options")]
    pub environment_options: Vec<String>,

    /// Seed values for the root-cause option list
    #[serde(default = "default_root_cause_options")]
    pub root_cause_options: Vec<String>,

    /// Seed values for the corrective-action status option list
    #[serde(default = "default_corrective_status_options")]
    pub corrective_status_options: Vec<String>,

    /// Seed values for the corrective-action owner option list
    #[serde(default = "default_corrective_owner_options")]
    pub corrective_owner_options: Vec<String>,

    /// Export column label overrides, keyed by field name
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Default file name for the exported summary workbook
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
}

fn default_environment_options() -> Vec<String> {
    vec!["3 - UAT".to_string(), "4 - Prod".to_string()]
}

fn default_root_cause_options() -> Vec<String> {
    vec![
        "Environment Issue".to_string(),
        "Test Data Unavailable".to_string(),
        "Missed QA Test Scenario".to_string(),
        "Requirement Enhancement".to_string(),
        "Not a Valid Bug".to_string(),
        "Unable to Recreate".to_string(),
        "Not QA Tested".to_string(),
    ]
}

fn default_corrective_status_options() -> Vec<String> {
    vec!["Open".to_string(), "Closed".to_string()]
}

fn default_corrective_owner_options() -> Vec<String> {
    vec!["Unassigned".to_string()]
}

fn default_export_file_name() -> String {
    "Weekly Bugs Summary.xlsx".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            application_options: Vec::new(),
            business_function_options: Vec::new(),
            environment_options: default_environment_options(),
            root_cause_options: default_root_cause_options(),
            corrective_status_options: default_corrective_status_options(),
            corrective_owner_options: default_corrective_owner_options(),
            labels: HashMap::new(),
            export_file_name: default_export_file_name(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from the data directory or return defaults
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: LedgerConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the data directory
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Seed values for one option list
    pub fn seed_options(&self, field: OptionField) -> &[String] {
        match field {
            OptionField::Application => &self.application_options,
            OptionField::BusinessFunction => &self.business_function_options,
            OptionField::Environment => &self.environment_options,
            OptionField::RootCause => &self.root_cause_options,
            OptionField::CorrectiveStatus => &self.corrective_status_options,
            OptionField::CorrectiveOwner => &self.corrective_owner_options,
        }
    }

    /// Export column header for a field, honoring overrides
    pub fn label_for(&self, field: Field) -> &str {
        self.labels
            .get(field.name())
            .map(String::as_str)
            .unwrap_or_else(|| field.label())
    }
}

/// Resolve the data directory: explicit override, else the platform
/// data directory, else a dotdir under the user's home.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bugledger")
}
