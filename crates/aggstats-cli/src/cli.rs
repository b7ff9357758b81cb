//! Command-line argument parsing

use crate::config::{MissingSetting, NanSetting};
use aggstats_core::{StatQuery, VarianceMode};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// Aggregate statistics over a delimited table
#[derive(Parser, Debug)]
#[command(name = "aggstats", version, about, long_about = None)]
pub struct Args {
    /// Path to the input table (header row first)
    pub file: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "AGGSTATS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Decimal places shown in results
    #[arg(short, long, env = "AGGSTATS_PRECISION")]
    pub precision: Option<usize>,

    /// Field delimiter
    #[arg(short, long, env = "AGGSTATS_DELIMITER")]
    pub delimiter: Option<char>,

    /// How missing cells are handled
    #[arg(long, value_enum, env = "AGGSTATS_MISSING")]
    pub missing: Option<MissingSetting>,

    /// How NaN cells are handled
    #[arg(long, value_enum, env = "AGGSTATS_NAN")]
    pub nan: Option<NanSetting>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Variance divisor on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Divide by n
    #[value(alias = "pop")]
    Population,
    /// Divide by n - 1
    #[value(alias = "samp")]
    Sample,
}

impl From<ModeArg> for VarianceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Population => VarianceMode::Population,
            ModeArg::Sample => VarianceMode::Sample,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Pearson correlation coefficient of two fields
    Corr { x: String, y: String },

    /// Least-squares regression of y on x
    Regress {
        x: String,
        y: String,
        /// Also report standard errors, t-tests and confidence intervals
        #[arg(long)]
        inference: bool,
        #[arg(long, default_value_t = 0.95)]
        confidence: f64,
    },

    /// Variance of a field
    Var {
        field: String,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Population)]
        mode: ModeArg,
    },

    /// Standard deviation of a field
    Stddev {
        field: String,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Population)]
        mode: ModeArg,
    },

    /// Covariance of two fields
    Covar {
        x: String,
        y: String,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Population)]
        mode: ModeArg,
    },

    /// Count, mean, range and spread of a field
    Summary { field: String },

    /// Significance test of the correlation between two fields
    CorrTest {
        x: String,
        y: String,
        #[arg(long, default_value_t = 0.95)]
        confidence: f64,
    },
}

impl Command {
    pub fn to_query(&self) -> StatQuery {
        match self.clone() {
            Command::Corr { x, y } => StatQuery::Correlation { x, y },
            Command::Regress {
                x,
                y,
                inference: false,
                ..
            } => StatQuery::LinearRegression { x, y },
            Command::Regress {
                x,
                y,
                inference: true,
                confidence,
            } => StatQuery::RegressionInference {
                x,
                y,
                confidence_level: confidence,
            },
            Command::Var { field, mode } => StatQuery::Variance {
                field,
                mode: mode.into(),
            },
            Command::Stddev { field, mode } => StatQuery::StandardDeviation {
                field,
                mode: mode.into(),
            },
            Command::Covar { x, y, mode } => StatQuery::Covariance {
                x,
                y,
                mode: mode.into(),
            },
            Command::Summary { field } => StatQuery::Summary { field },
            Command::CorrTest { x, y, confidence } => StatQuery::CorrelationTest {
                x,
                y,
                confidence_level: confidence,
            },
        }
    }
}
