//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Most flags have no default here so that
//! `.crashboard.toml` values survive unless overridden.

use crate::report::PageKey;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Crashboard - motorcycle accident insights from a CSV
///
/// Loads an accident dataset (local CSV, URL, or a seeded synthetic
/// sample), aggregates severity, exposure and speed metrics, and writes
/// a Markdown or JSON report.
///
/// Examples:
///   crashboard --input accidents.csv
///   crashboard --input https://example.com/accidents.csv --format json -o report.json
///   crashboard --synthetic 500 --seed 42 --page severity
///   crashboard --input accidents.csv --road-conditions Dry,Wet
///   crashboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file path or http(s) URL of the accident dataset
    #[arg(short, long, value_name = "FILE|URL", env = "CRASHBOARD_INPUT")]
    pub input: Option<String>,

    /// Generate this many synthetic records instead of reading a CSV
    #[arg(long, value_name = "ROWS", conflicts_with = "input")]
    pub synthetic: Option<usize>,

    /// Seed for --synthetic, for reproducible samples
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output file path for the report
    ///
    /// Default: from config or accident_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Report page to include (repeatable). Default: all pages
    #[arg(long = "page", value_name = "PAGE")]
    pub pages: Vec<PageKey>,

    /// Severity label counted as a severe accident
    ///
    /// Matched case-insensitively. Default: from config or "Severe".
    #[arg(long, value_name = "LABEL")]
    pub severity_label: Option<String>,

    /// Only consider these road conditions (comma-separated)
    ///
    /// Example: --road-conditions Dry,Wet
    #[arg(long, value_name = "CONDITIONS", value_delimiter = ',')]
    pub road_conditions: Option<Vec<String>>,

    /// Request timeout in seconds for URL inputs
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .crashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .crashboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if input.trim().is_empty() {
                return Err("Input must not be empty".to_string());
            }
        }

        if self.synthetic == Some(0) {
            return Err("Synthetic row count must be at least 1".to_string());
        }

        if self.seed.is_some() && self.synthetic.is_none() && self.input.is_some() {
            return Err("--seed only applies to --synthetic".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref label) = self.severity_label {
            if label.trim().is_empty() {
                return Err("Severity label must not be empty".to_string());
            }
        }

        if let Some(ref conditions) = self.road_conditions {
            if conditions.iter().any(|c| c.trim().is_empty()) {
                return Err("Road conditions must not contain empty values".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over a config file asking for verbose output.
    pub fn log_level(&self, verbose_by_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_by_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            input: None,
            synthetic: None,
            seed: None,
            output: None,
            format: None,
            pages: Vec::new(),
            severity_label: None,
            road_conditions: None,
            timeout: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "crashboard",
            "--input",
            "accidents.csv",
            "--page",
            "severity",
            "--page",
            "speed",
            "--road-conditions",
            "Dry,Wet",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.input.as_deref(), Some("accidents.csv"));
        assert_eq!(args.pages, vec![PageKey::Severity, PageKey::Speed]);
        assert_eq!(
            args.road_conditions,
            Some(vec!["Dry".to_string(), "Wet".to_string()])
        );
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_input_conflicts_with_synthetic() {
        let result = Args::try_parse_from([
            "crashboard",
            "--input",
            "accidents.csv",
            "--synthetic",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_page_rejected() {
        let result = Args::try_parse_from(["crashboard", "--page", "weather"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut args = make_args();
        args.synthetic = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_blank_labels() {
        let mut args = make_args();
        args.severity_label = Some("  ".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.road_conditions = Some(vec!["Dry".to_string(), String::new()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_seed_needs_synthetic() {
        let mut args = make_args();
        args.input = Some("accidents.csv".to_string());
        args.seed = Some(7);
        assert!(args.validate().is_err());

        args.input = None;
        args.synthetic = Some(10);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_follows_config_verbosity() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
