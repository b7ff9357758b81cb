//! Layered configuration: defaults, then an optional TOML file, then flags
//! and environment variables.

use crate::cli::Args;
use aggstats_core::{EngineOptions, MissingPolicy, NanPolicy};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

/// Missing-cell handling as written in config files and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingSetting {
    /// Exclude records with a missing value in a requested field
    #[default]
    Skip,
    /// Fail on the first missing value
    Error,
}

/// NaN handling as written in config files and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NanSetting {
    /// Treat NaN as missing
    #[default]
    Drop,
    /// Fail on the first NaN
    Error,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decimal places shown in results
    pub precision: usize,
    /// Field delimiter of the input table
    pub delimiter: char,
    /// Cell contents read as missing (compared after trimming)
    pub missing_tokens: Vec<String>,
    pub missing: MissingSetting,
    pub nan: NanSetting,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: 4,
            delimiter: ',',
            missing_tokens: vec![String::new(), "NA".into(), "NULL".into()],
            missing: MissingSetting::Skip,
            nan: NanSetting::Drop,
        }
    }
}

impl Config {
    /// Parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Command-line flags (and their environment variables) win over the file
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(precision) = args.precision {
            self.precision = precision;
        }
        if let Some(delimiter) = args.delimiter {
            self.delimiter = delimiter;
        }
        if let Some(missing) = args.missing {
            self.missing = missing;
        }
        if let Some(nan) = args.nan {
            self.nan = nan;
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            missing: match self.missing {
                MissingSetting::Skip => MissingPolicy::Skip,
                MissingSetting::Error => MissingPolicy::Error,
            },
            nan: match self.nan {
                NanSetting::Drop => NanPolicy::DropNaN,
                NanSetting::Error => NanPolicy::ErrorOnNaN,
            },
        }
    }

    pub fn is_missing_token(&self, cell: &str) -> bool {
        self.missing_tokens.iter().any(|t| t == cell)
    }
}
