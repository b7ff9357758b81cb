//! aggstats - aggregate statistics over a delimited table
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid input, configuration, or a statistic that is undefined for the data

mod cli;
mod config;
mod loader;
mod report;

use aggstats_core::AggregateStatsEngine;
use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use config::Config;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let args = Args::parse();
    init_logging(&args);

    info!("aggstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(&args) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            error!("Computation failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr; RUST_LOG overrides the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
    {
        eprintln!("Warning: failed to install log subscriber: {}", e);
    }
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

/// Rendered result lines for one invocation
fn run(args: &Args) -> Result<Vec<String>> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    debug!("Effective config: {:?}", config);

    let table = loader::load_table(&args.file, &config)?;
    let engine = AggregateStatsEngine::new(config.engine_options());
    let query = args.command.to_query();

    let result = engine
        .evaluate(&table, &query)
        .with_context(|| format!("Failed to compute {}", query.kind().meaning()))?;

    Ok(report::render(&result, config.precision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COUNTIES: &str = "\
county;median_income;poverty_pct
\"Autauga; AL\";58.7;15.2
\"Baldwin; AL\";64.0;10.4
\"Barbour; AL\";34.2;NA
\"Bibb; AL\";45.3;20.6
\"Blount; AL\";52.1;14.1
";

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(extra: &[&str], command: &[&str]) -> Args {
        let mut argv = vec!["aggstats"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(command);
        Args::try_parse_from(argv).unwrap()
    }

    fn decimals(line: &str) -> Option<usize> {
        line.rsplit(" = ").next()?.split('.').nth(1).map(str::len)
    }

    #[test]
    fn test_repeated_logging_init_is_tolerated() {
        let args = args(&["-q", "t.csv"], &["summary", "x"]);
        init_logging(&args);
        init_logging(&args);
    }

    #[test]
    fn test_run_with_config_file() {
        let table = write_temp(COUNTIES);
        let config = write_temp("precision = 2\ndelimiter = \";\"\n");
        let table_path = table.path().to_str().unwrap();
        let config_path = config.path().to_str().unwrap();

        let lines = run(&args(
            &["--config", config_path, table_path],
            &["corr", "median_income", "poverty_pct"],
        ))
        .unwrap();
        assert!(
            lines[0].starts_with("corr(median_income, poverty_pct) = -0."),
            "{}",
            lines[0]
        );
        assert_eq!(decimals(&lines[0]), Some(2));
        assert!(lines[1].starts_with("Strong negative"), "{}", lines[1]);

        let lines = run(&args(
            &["--config", config_path, "-p", "5", table_path],
            &["var", "median_income", "--mode", "samp"],
        ))
        .unwrap();
        assert!(lines[0].starts_with("var_samp(median_income) = "), "{}", lines[0]);
        assert_eq!(decimals(&lines[0]), Some(5));
    }

    #[test]
    fn test_run_reports_missing_config() {
        let table = write_temp(COUNTIES);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = run(&args(
            &["--config", missing.to_str().unwrap(), table.path().to_str().unwrap()],
            &["summary", "median_income"],
        ))
        .unwrap_err();
        assert!(
            format!("{:#}", err).contains("Failed to read config file"),
            "{:#}",
            err
        );
    }

    #[test]
    fn test_run_reports_undefined_statistic() {
        let table = write_temp("x,y\n1,5\n2,5\n3,5\n");
        let err = run(&args(&[table.path().to_str().unwrap()], &["corr", "x", "y"])).unwrap_err();
        assert!(
            format!("{:#}", err).contains("Failed to compute Pearson correlation coefficient"),
            "{:#}",
            err
        );
    }
}
