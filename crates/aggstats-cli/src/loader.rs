//! Delimited-table loader
//!
//! Reads a header row followed by data rows into a [`RowTable`]. Quoting and
//! escapes follow RFC 4180 via the `csv` crate; cells are trimmed before
//! classification and blank lines are skipped.

use crate::config::Config;
use aggstats_core::{Record, RowTable, Value};
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim};
use std::path::Path;
use tracing::{debug, info};

pub fn load_table(path: &Path, config: &Config) -> Result<RowTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table = parse_table(&content, config)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(
        "Loaded {} rows x {} fields from {}",
        table.len(),
        table.schema().len(),
        path.display()
    );
    Ok(table)
}

pub fn parse_table(content: &str, config: &Config) -> Result<RowTable> {
    if !config.delimiter.is_ascii() {
        bail!("delimiter '{}' is not a single-byte character", config.delimiter);
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter as u8)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let schema: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(String::from)
        .collect();
    if schema.is_empty() {
        bail!("input is empty");
    }
    if let Some(dup) = schema
        .iter()
        .enumerate()
        .find(|(i, name)| schema[..*i].contains(name))
        .map(|(_, name)| name)
    {
        bail!("duplicate field name '{}' in header", dup);
    }

    let mut table = RowTable::new(schema.clone());
    for row in reader.records() {
        let row = row?;
        if row.len() != schema.len() {
            let line = row.position().map_or(0, |p| p.line());
            bail!(
                "line {}: expected {} fields, found {}",
                line,
                schema.len(),
                row.len()
            );
        }
        let record: Record = schema
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| (name.as_str(), parse_cell(cell, config)))
            .collect();
        table.push(record)?;
    }
    debug!(rows = table.len(), "parsed table");
    Ok(table)
}

/// Classify one trimmed cell
pub fn parse_cell(cell: &str, config: &Config) -> Value {
    if config.is_missing_token(cell) {
        return Value::Missing;
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Value::Integer(v);
    }
    if let Ok(v) = cell.parse::<f64>() {
        return Value::Number(v);
    }
    Value::Text(cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggstats_core::{Dataset, FieldLookup};
    use std::io::Write;

    const COUNTIES: &str = "\
county,state,median_income,poverty_pct
Autauga,AL,58731,15.2
Baldwin,AL,,10.4
Barbour,AL,34186,NA

\"Bibb\",AL,45340,20.6
";

    #[test]
    fn test_parse_cells() {
        let config = Config::default();
        assert_eq!(parse_cell("42", &config), Value::Integer(42));
        assert_eq!(parse_cell("-1.5e3", &config), Value::Number(-1500.0));
        assert_eq!(parse_cell("NA", &config), Value::Missing);
        assert_eq!(parse_cell("", &config), Value::Missing);
        assert_eq!(parse_cell("AL", &config), Value::Text("AL".into()));
    }

    #[test]
    fn test_parse_table() {
        let table = parse_table(COUNTIES, &Config::default()).unwrap();
        assert_eq!(
            table.schema(),
            &["county", "state", "median_income", "poverty_pct"]
        );
        assert_eq!(table.len(), 4);
        assert!(table.rows()[1].get("median_income").unwrap().is_missing());
        assert_eq!(
            table.rows()[3].get("county"),
            Some(&Value::Text("Bibb".into()))
        );
        assert!(table.has_field("poverty_pct"));
    }

    #[test]
    fn test_quoted_cell_keeps_delimiter() {
        let table = parse_table(
            "county,income\n\"Anchorage, AK\",84928\n\"Juneau, AK\", 90126 \n",
            &Config::default(),
        )
        .unwrap();
        assert_eq!(table.schema(), &["county", "income"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0].get("county"),
            Some(&Value::Text("Anchorage, AK".into()))
        );
        assert_eq!(table.rows()[1].get("income"), Some(&Value::Integer(90126)));
    }

    #[test]
    fn test_escaped_quote_in_cell() {
        let table =
            parse_table("name,x\n\"the \"\"big\"\" one\",1\n", &Config::default()).unwrap();
        assert_eq!(
            table.rows()[0].get("name"),
            Some(&Value::Text("the \"big\" one".into()))
        );
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let config = Config {
            delimiter: '§',
            ..Config::default()
        };
        assert!(parse_table("a§b\n1§2\n", &config).is_err());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = parse_table("a,b\n1,2\n3\n", &Config::default()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn test_duplicate_header_rejected() {
        assert!(parse_table("a,b,a\n1,2,3\n", &Config::default()).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse_table("\n\n", &Config::default()).is_err());
    }

    #[test]
    fn test_custom_delimiter_and_tokens() {
        let config = Config {
            delimiter: '\t',
            missing_tokens: vec!["-".into()],
            ..Config::default()
        };
        let table = parse_table("x\ty\n1\t-\n2\t3\n", &config).unwrap();
        assert!(table.rows()[0].get("y").unwrap().is_missing());
    }

    #[test]
    fn test_load_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(COUNTIES.as_bytes()).unwrap();
        let table = load_table(file.path(), &Config::default()).unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("absent.csv"), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
