//! Crashboard - motorcycle accident insights report generator
//!
//! A CLI tool that loads a tabular accident dataset, aggregates
//! severity, exposure and speed metrics, and writes a Markdown or JSON
//! report with one section per analysis page.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (bad arguments, unreadable config, dataset load failure, etc.)

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dataset::DatasetCache;
use report::{PageKey, Report};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so its verbosity applies
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose))?;

    info!("Crashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(&args, config).await {
        error!("Report generation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .crashboard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the input dataset, severity label, pages, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load the dataset, aggregate every selected page and write the report.
async fn run(args: &Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let source = config.data_source()?;
    let pages = unique_pages(&config.report.pages);
    if pages.is_empty() {
        anyhow::bail!("No report pages selected");
    }

    // Step 1: Load the dataset once; every page reads the same instance
    if !args.quiet {
        println!("📥 Loading dataset: {}", source);
    }
    let cache = DatasetCache::new(source, config.load_options(!args.quiet));
    let dataset = cache
        .get()
        .await
        .with_context(|| format!("Failed to load dataset from {}", cache.source()))?;

    info!(
        "Loaded {} records ({} skipped)",
        dataset.records.len(),
        dataset.skipped_rows
    );
    if dataset.records.is_empty() {
        warn!("Dataset has no usable records; every metric will be empty");
    }

    // Step 2: Aggregate
    let options = config.aggregation_options();
    let metrics = report::metrics_for(&pages);
    debug!("Computing {} metrics for {} pages", metrics.len(), pages.len());

    let summary = analysis::build_summary(&dataset, &options, &metrics);

    // Step 3: Render and save
    let report = Report {
        summary,
        pages: pages.iter().map(|page| page.spec()).collect(),
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, &config.number_format())
        }
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        let metadata = &report.summary.metadata;
        println!("\n📊 Report Summary:");
        println!(
            "   Rows: {} read | {} skipped | {} in scope",
            metadata.total_rows, metadata.skipped_rows, metadata.records_in_scope
        );
        println!("   Pages: {}", pages.len());
        println!(
            "   Metrics: {} computed | {} unavailable",
            report.summary.metrics.len(),
            report.summary.unavailable.len()
        );
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Report complete! Saved to: {}",
            output_path.display()
        );
    }

    Ok(())
}

/// Drop repeated pages, keeping the first occurrence.
fn unique_pages(pages: &[PageKey]) -> Vec<PageKey> {
    let mut unique = Vec::with_capacity(pages.len());
    for page in pages {
        if !unique.contains(page) {
            unique.push(*page);
        }
    }
    unique
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_pages_keeps_first_occurrence() {
        let pages = [PageKey::Speed, PageKey::Severity, PageKey::Speed];
        assert_eq!(
            unique_pages(&pages),
            vec![PageKey::Speed, PageKey::Severity]
        );
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let mut args = cli::tests::make_args();
        args.synthetic = Some(40);
        args.seed = Some(9);
        args.format = Some(OutputFormat::Json);
        args.output = Some(output.clone());
        args.config = Some(dir.path().join("missing.toml"));
        args.quiet = true;

        // An explicit config path that does not exist is an error
        assert!(load_config(&args).is_err());

        args.config = None;
        let mut config = load_config(&args).unwrap();
        config.merge_with_args(&args);
        tokio_test::block_on(run(&args, config)).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["metadata"]["total_rows"], 40);
        assert_eq!(json["pages"].as_array().unwrap().len(), 3);
    }
}
