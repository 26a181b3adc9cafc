//! Dataset loading errors.
//!
//! Anything that stops a dataset from being read at all is fatal to the
//! run and surfaces here. Bad rows and missing columns are not errors;
//! they end up in the dataset's skipped tally and schema instead.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain or parse a dataset source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Local input file does not exist.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Local input file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote source failed on every attempt.
    #[error("dataset URL unreachable after {attempts} attempt(s): {url}: {source}")]
    Unreachable {
        url: String,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },

    /// The header row could not be parsed.
    #[error("unparseable header in {source_label}: {source}")]
    Header {
        source_label: String,
        #[source]
        source: csv::Error,
    },
}
