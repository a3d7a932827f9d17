use std::path::Path;

use flash_settings::{
    Entry,
    Key,
    ValueType,
    MAX_VALUE_LENGTH,
};
use thiserror::Error;

/// Built-in default table used when no CSV file is given.
pub const DEMO_DEFAULTS: [Entry; 4] = [
    Entry::new("TEST1", ValueType::String, "TEST PARAM 1"),
    Entry::new("TEST2", ValueType::Bool, "false"),
    Entry::new("TEST3", ValueType::Int, "60"),
    Entry::new("TEST4", ValueType::String, "TEST PARAM 4"),
];

#[derive(Error, Debug)]
pub enum DefaultsError {
    #[error("failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid entry type: {0}")]
    InvalidType(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    key: String,
    #[serde(rename = "type")]
    value_type: String,
    value: String,
}

/// Read a default table from a CSV file with the columns `key,type,value`.
pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<Entry>, DefaultsError> {
    let content = std::fs::read_to_string(path)?;
    parse_csv(&content)
}

pub fn parse_csv(content: &str) -> Result<Vec<Entry>, DefaultsError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut entries = vec![];

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        entries.push(parse_row(row)?);
    }

    Ok(entries)
}

fn parse_row(row: CsvRow) -> Result<Entry, DefaultsError> {
    Key::try_from_str(&row.key).map_err(|_| DefaultsError::InvalidKey(row.key.clone()))?;

    let value_type: ValueType = row
        .value_type
        .parse()
        .map_err(|_| DefaultsError::InvalidType(row.value_type.clone()))?;

    if row.value.len() > MAX_VALUE_LENGTH {
        return Err(DefaultsError::InvalidValue(row.key, "value too long".to_string()));
    }

    match value_type {
        ValueType::Int => {
            row.value
                .parse::<i32>()
                .map_err(|e| DefaultsError::InvalidValue(row.key.clone(), e.to_string()))?;
        }
        ValueType::Bool => {
            if row.value != "true" && row.value != "false" {
                return Err(DefaultsError::InvalidValue(
                    row.key,
                    "expected true or false".to_string(),
                ));
            }
        }
        ValueType::String => {}
    }

    Ok(Entry::new(&row.key, value_type, &row.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_table() {
        let csv = "key,type,value\n\
                   WIFI_SSID,string,my network\n\
                   TIMEOUT,INT,-5\n\
                   ENABLED,Bool,true\n\
                   EMPTY,string,\n";

        let entries = parse_csv(csv).unwrap();
        assert_eq!(
            entries,
            vec![
                Entry::new("WIFI_SSID", ValueType::String, "my network"),
                Entry::new("TIMEOUT", ValueType::Int, "-5"),
                Entry::new("ENABLED", ValueType::Bool, "true"),
                Entry::new("EMPTY", ValueType::String, ""),
            ]
        );
    }

    #[test]
    fn quoted_values() {
        let csv = "key,type,value\nGREETING,string,\"hello, world\"\n";
        let entries = parse_csv(csv).unwrap();
        assert_eq!(entries[0].value(), "hello, world");
    }

    #[test]
    fn invalid_rows() {
        assert!(matches!(
            parse_csv("key,type,value\nlower,int,1\n"),
            Err(DefaultsError::InvalidKey(_))
        ));
        assert!(matches!(
            parse_csv("key,type,value\nA_VERY_LONG_KEY_THAT_DOES_NOT_FIT,int,1\n"),
            Err(DefaultsError::InvalidKey(_))
        ));
        assert!(matches!(
            parse_csv("key,type,value\nKEY,float,1.0\n"),
            Err(DefaultsError::InvalidType(_))
        ));
        assert!(matches!(
            parse_csv("key,type,value\nKEY,int,sixty\n"),
            Err(DefaultsError::InvalidValue(..))
        ));
        assert!(matches!(
            parse_csv("key,type,value\nKEY,bool,yes\n"),
            Err(DefaultsError::InvalidValue(..))
        ));
        let long = format!("key,type,value\nKEY,string,{}\n", "x".repeat(96));
        assert!(matches!(parse_csv(&long), Err(DefaultsError::InvalidValue(..))));
        assert!(matches!(
            parse_csv("key,type,value\nKEY,int\n"),
            Err(DefaultsError::CsvError(_))
        ));
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.csv");
        std::fs::write(&path, "key,type,value\nTEST3,int,60\n").unwrap();

        let entries = from_csv_file(&path).unwrap();
        assert_eq!(entries, vec![Entry::new("TEST3", ValueType::Int, "60")]);
    }
}
