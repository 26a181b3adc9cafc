//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.crashboard.toml` files.

use crate::analysis::AggregationOptions;
use crate::cli::{Args, OutputFormat};
use crate::dataset::{DataSource, LoadOptions};
use crate::report::{NumberFormat, PageKey};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".crashboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "accident_report.md".to_string()
}

/// Where the dataset comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CSV path or http(s) URL.
    #[serde(default)]
    pub input: Option<String>,

    /// Generate this many synthetic records instead of reading a CSV.
    #[serde(default)]
    pub synthetic_rows: Option<usize>,

    /// Seed for synthetic records.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Request timeout for remote datasets in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Extra attempts after a failed remote fetch.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input: None,
            synthetic_rows: None,
            seed: None,
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    1
}

/// What counts as severe and which records are in scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Severity label counted as severe (case-insensitive).
    #[serde(default = "default_severity_label")]
    pub severity_label: String,

    /// Restrict every metric to these road conditions. Empty means all.
    #[serde(default)]
    pub road_conditions: Vec<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            severity_label: default_severity_label(),
            road_conditions: Vec::new(),
        }
    }
}

fn default_severity_label() -> String {
    "Severe".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Pages to include, in order.
    #[serde(default = "default_pages")]
    pub pages: Vec<PageKey>,

    /// Decimal places for averages.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Group thousands in counts with commas.
    #[serde(default = "default_true")]
    pub thousands_separator: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            decimals: default_decimals(),
            thousands_separator: true,
        }
    }
}

fn default_pages() -> Vec<PageKey> {
    PageKey::ALL.to_vec()
}

fn default_decimals() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        // An explicit source on the command line replaces whichever
        // source the file configured.
        if let Some(ref input) = args.input {
            self.source.input = Some(input.clone());
            self.source.synthetic_rows = None;
        }
        if let Some(rows) = args.synthetic {
            self.source.synthetic_rows = Some(rows);
            self.source.input = None;
        }
        if let Some(seed) = args.seed {
            self.source.seed = Some(seed);
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref label) = args.severity_label {
            self.aggregation.severity_label = label.clone();
        }
        if let Some(ref conditions) = args.road_conditions {
            self.aggregation.road_conditions = conditions.clone();
        }

        if !args.pages.is_empty() {
            self.report.pages = args.pages.clone();
        }
    }

    /// Dataset source to read from.
    pub fn data_source(&self) -> Result<DataSource> {
        match (&self.source.input, self.source.synthetic_rows) {
            (Some(_), Some(_)) => {
                bail!("Configure either source.input or source.synthetic_rows, not both")
            }
            (Some(input), None) => Ok(DataSource::from_input(input)),
            (None, Some(rows)) => Ok(DataSource::Synthetic {
                rows,
                seed: self.source.seed,
            }),
            (None, None) => bail!(
                "No dataset given. Pass --input <FILE|URL> or --synthetic <ROWS>, \
                 or set source.input in {}",
                CONFIG_FILE
            ),
        }
    }

    pub fn load_options(&self, show_progress: bool) -> LoadOptions {
        LoadOptions {
            timeout_seconds: self.source.timeout_seconds,
            retries: self.source.retries,
            show_progress,
        }
    }

    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            severity_label: self.aggregation.severity_label.clone(),
            road_conditions: self.aggregation.road_conditions.clone(),
        }
    }

    pub fn number_format(&self) -> NumberFormat {
        NumberFormat {
            decimals: self.report.decimals,
            thousands_separator: self.report.thousands_separator,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aggregation.severity_label, "Severe");
        assert!(config.aggregation.road_conditions.is_empty());
        assert_eq!(config.source.retries, 1);
        assert_eq!(config.report.pages, PageKey::ALL.to_vec());
        assert_eq!(config.report.decimals, 1);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "severity.json"
format = "json"

[source]
input = "student_df.csv"
timeout_seconds = 5

[aggregation]
severity_label = "Severe Accident"
road_conditions = ["Dry", "Wet"]

[report]
pages = ["severity"]
decimals = 2
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "severity.json");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.source.input.as_deref(), Some("student_df.csv"));
        assert_eq!(config.source.timeout_seconds, 5);
        assert_eq!(config.source.retries, 1);
        assert_eq!(config.aggregation.severity_label, "Severe Accident");
        assert_eq!(config.aggregation.road_conditions, vec!["Dry", "Wet"]);
        assert_eq!(config.report.pages, vec![PageKey::Severity]);
        assert_eq!(config.report.decimals, 2);
        assert!(config.report.thousands_separator);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nsynthetic_rows = 25\nseed = 3").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.data_source().unwrap(),
            DataSource::Synthetic {
                rows: 25,
                seed: Some(3)
            }
        );
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\npages = [\"nonsense\"]").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.source.input = Some("from_file.csv".to_string());
        config.aggregation.severity_label = "Severe Accident".to_string();

        let mut args = make_args();
        args.synthetic = Some(100);
        args.output = Some(PathBuf::from("out.json"));
        args.road_conditions = Some(vec!["Wet".to_string()]);
        args.pages = vec![PageKey::Speed];

        config.merge_with_args(&args);

        assert_eq!(config.source.input, None);
        assert_eq!(config.source.synthetic_rows, Some(100));
        assert_eq!(config.general.output, "out.json");
        assert_eq!(config.aggregation.severity_label, "Severe Accident");
        assert_eq!(config.aggregation.road_conditions, vec!["Wet"]);
        assert_eq!(config.report.pages, vec![PageKey::Speed]);
    }

    #[test]
    fn test_verbose_from_file_raises_log_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nverbose = true").unwrap();

        let mut config = Config::load(file.path()).unwrap();
        let args = make_args();
        config.merge_with_args(&args);

        assert!(config.general.verbose);
        assert_eq!(
            args.log_level(config.general.verbose),
            tracing::Level::DEBUG
        );
    }

    #[test]
    fn test_data_source_requires_input() {
        let config = Config::default();
        assert!(config.data_source().is_err());

        let mut config = Config::default();
        config.source.input = Some("https://example.com/accidents.csv".to_string());
        assert_eq!(
            config.data_source().unwrap(),
            DataSource::Url("https://example.com/accidents.csv".to_string())
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[aggregation]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.pages, PageKey::ALL.to_vec());
    }
}
