//! Dataset sources, loading and caching.

pub mod cache;
pub mod loader;
pub mod synthetic;

pub use cache::DatasetCache;
pub use loader::LoadOptions;

use crate::models::{AccidentRecord, Column};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where a dataset comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// CSV file on the local filesystem.
    File(PathBuf),
    /// CSV served over HTTP(S).
    Url(String),
    /// Randomly generated sample.
    Synthetic { rows: usize, seed: Option<u64> },
}

impl DataSource {
    /// Interpret a user-supplied input string as a URL or a local path.
    pub fn from_input(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            DataSource::Url(input.to_string())
        } else {
            DataSource::File(PathBuf::from(input))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::Synthetic { rows, seed: Some(seed) } => {
                write!(f, "synthetic ({} rows, seed {})", rows, seed)
            }
            DataSource::Synthetic { rows, seed: None } => write!(f, "synthetic ({} rows)", rows),
        }
    }
}

/// Which columns a dataset's header provided.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Schema with every column present.
    pub fn complete() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }

    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut schema = Self::default();
        for column in columns {
            if !schema.columns.contains(&column) {
                schema.columns.push(column);
            }
        }
        schema.columns.sort();
        schema
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Columns from `required` that this schema lacks.
    pub fn missing(&self, required: &[Column]) -> Vec<Column> {
        required
            .iter()
            .copied()
            .filter(|column| !self.has(*column))
            .collect()
    }
}

/// A loaded, immutable dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Human-readable description of the source.
    pub source: String,
    /// Columns the source provided.
    pub schema: Schema,
    /// Well-formed records, in input order.
    pub records: Vec<AccidentRecord>,
    /// Number of malformed rows that were dropped.
    pub skipped_rows: usize,
}

impl Dataset {
    /// Dataset over in-memory records with a complete schema.
    pub fn from_records(source: impl Into<String>, records: Vec<AccidentRecord>) -> Self {
        Self {
            source: source.into(),
            schema: Schema::complete(),
            records,
            skipped_rows: 0,
        }
    }

    /// Total rows seen, including skipped ones.
    pub fn total_rows(&self) -> usize {
        self.records.len() + self.skipped_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_input() {
        assert_eq!(
            DataSource::from_input("https://example.com/data.csv"),
            DataSource::Url("https://example.com/data.csv".to_string())
        );
        assert_eq!(
            DataSource::from_input("student_df.csv"),
            DataSource::File(PathBuf::from("student_df.csv"))
        );
    }

    #[test]
    fn test_schema_missing() {
        let schema = Schema::from_columns([Column::RoadType, Column::AccidentSeverity]);
        assert!(schema.has(Column::RoadType));
        assert_eq!(
            schema.missing(&[Column::RoadType, Column::Weather, Column::BikeSpeed]),
            vec![Column::Weather, Column::BikeSpeed]
        );
        assert!(Schema::complete().missing(&Column::ALL).is_empty());
    }
}
