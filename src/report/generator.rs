//! Markdown and JSON report generation.
//!
//! This module renders a [`SummaryReport`] as a page-by-page Markdown
//! document or as JSON for an external dashboard.

use super::pages::PageSpec;
use crate::analysis::aggregator::Distribution;
use crate::analysis::summary::{NamedMetric, ReportMetadata, UnavailableMetric};
use crate::analysis::{MetricKey, MetricValue, SummaryReport};
use crate::models::{Groups, TimeOfDay};
use anyhow::Result;
use serde::Serialize;

/// A summary and the pages it is shown on.
#[derive(Debug, Clone)]
pub struct Report {
    pub summary: SummaryReport,
    pub pages: Vec<PageSpec>,
}

/// How numbers are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// Decimal places for averages and quartiles.
    pub decimals: usize,
    /// Group thousands with commas.
    pub thousands_separator: bool,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimals: 1,
            thousands_separator: true,
        }
    }
}

impl NumberFormat {
    pub fn count(&self, value: usize) -> String {
        let digits = value.to_string();
        if self.thousands_separator {
            group_thousands(&digits)
        } else {
            digits
        }
    }

    pub fn decimal(&self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals, value);
        if !self.thousands_separator {
            return text;
        }

        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };
        match unsigned.split_once('.') {
            Some((whole, fraction)) => format!("{}{}.{}", sign, group_thousands(whole), fraction),
            None => format!("{}{}", sign, group_thousands(unsigned)),
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, format: &NumberFormat) -> String {
    let mut output = String::new();

    output.push_str("# Accident Insights Report\n\n");
    output.push_str(&generate_metadata_section(&report.summary.metadata, format));
    output.push_str(&generate_table_of_contents(report));

    for page in &report.pages {
        output.push_str(&generate_page_section(page, &report.summary, format));
    }

    output.push_str(&generate_unavailable_section(&report.summary.unavailable));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, format: &NumberFormat) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Rows Read:** {}\n",
        format.count(metadata.total_rows)
    ));
    if metadata.skipped_rows > 0 {
        section.push_str(&format!(
            "- **Rows Skipped:** {}\n",
            format.count(metadata.skipped_rows)
        ));
    }
    section.push_str(&format!(
        "- **Records in Scope:** {}\n",
        format.count(metadata.records_in_scope)
    ));
    section.push_str(&format!(
        "- **Severe Label:** `{}`\n",
        metadata.severity_label
    ));
    if metadata.road_condition_scope.is_empty() {
        section.push_str("- **Road Conditions:** all\n");
    } else {
        section.push_str(&format!(
            "- **Road Conditions:** {}\n",
            metadata.road_condition_scope.join(", ")
        ));
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    for page in &report.pages {
        toc.push_str(&format!("- [{}](#{})\n", page.title, page.anchor()));
    }

    if !report.summary.unavailable.is_empty() {
        toc.push_str("- [Unavailable Metrics](#unavailable-metrics)\n");
    }

    toc.push('\n');

    toc
}

/// Generate one page: headline figures first, then one table per grouped metric.
fn generate_page_section(page: &PageSpec, summary: &SummaryReport, format: &NumberFormat) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", page.title));
    section.push_str(&format!("*{}*\n\n", page.objective));

    let metrics: Vec<&NamedMetric> = page
        .metrics
        .iter()
        .filter_map(|key| summary.metrics.iter().find(|m| m.key == *key))
        .collect();

    if metrics.is_empty() {
        section.push_str("No metrics could be computed for this page.\n\n");
        return section;
    }

    let headline: Vec<_> = metrics.iter().filter(|m| m.value.is_scalar()).collect();
    if !headline.is_empty() {
        section.push_str("### Key Metrics\n\n");
        section.push_str("| Metric | Value |\n");
        section.push_str("|:---|---:|\n");
        for metric in headline {
            section.push_str(&format!(
                "| {} | {} |\n",
                metric.key.label(),
                format_scalar(&metric.value, format)
            ));
        }
        section.push('\n');
    }

    for metric in metrics.iter().filter(|m| !m.value.is_scalar()) {
        section.push_str(&generate_metric_table(metric, format));
    }

    section
}

fn format_scalar(value: &MetricValue, format: &NumberFormat) -> String {
    match value {
        MetricValue::Count(count) => format.count(*count),
        MetricValue::Mean(Some(mean)) => format.decimal(*mean),
        MetricValue::Top(Some(entry)) => format!("{} ({})", cell(&entry.key), format.count(entry.value)),
        MetricValue::Mean(None) | MetricValue::Top(None) => "n/a".to_string(),
        _ => String::new(),
    }
}

/// Generate the table for a grouped metric.
fn generate_metric_table(metric: &NamedMetric, format: &NumberFormat) -> String {
    let mut table = String::new();

    table.push_str(&format!("### {}\n\n", metric.key.label()));

    let group = group_header(metric.key);
    match &metric.value {
        MetricValue::Counts(groups) if !groups.is_empty() => {
            table.push_str(&format!("| {} | Count |\n|:---|---:|\n", group));
            for (key, count) in groups.iter() {
                table.push_str(&format!("| {} | {} |\n", cell(key), format.count(*count)));
            }
        }
        MetricValue::Means(groups) if !groups.is_empty() => {
            table.push_str(&format!("| {} | Mean |\n|:---|---:|\n", group));
            for (key, mean) in groups.iter() {
                table.push_str(&format!("| {} | {} |\n", cell(key), format.decimal(*mean)));
            }
        }
        MetricValue::CrossTab(rows) if !rows.is_empty() => {
            table.push_str(&generate_cross_tab(&group, rows, format));
        }
        MetricValue::Distributions(groups) if !groups.is_empty() => {
            table.push_str(&generate_distribution_table(&group, groups, format));
        }
        _ => table.push_str("No data.\n"),
    }

    table.push('\n');
    table
}

fn group_header(key: MetricKey) -> String {
    key.grouped_by()
        .map(|column| column.label().to_string())
        .unwrap_or_else(|| "Group".to_string())
}

fn generate_cross_tab(group: &str, rows: &Groups<Groups<usize>>, format: &NumberFormat) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for (_, counts) in rows.iter() {
        for key in counts.keys() {
            if !columns.contains(&key) {
                columns.push(key);
            }
        }
    }
    columns.sort_by_key(|key| TimeOfDay::rank(key).unwrap_or(usize::MAX));

    let mut table = String::new();

    table.push_str(&format!("| {} |", group));
    for column in &columns {
        table.push_str(&format!(" {} |", cell(column)));
    }
    table.push_str(" **Total** |\n|:---|");
    table.push_str(&"---:|".repeat(columns.len() + 1));
    table.push('\n');

    for (key, counts) in rows.iter() {
        table.push_str(&format!("| {} |", cell(key)));
        for column in &columns {
            let count = counts.get(column).copied().unwrap_or(0);
            table.push_str(&format!(" {} |", format.count(count)));
        }
        table.push_str(&format!(" **{}** |\n", format.count(counts.total())));
    }

    table
}

fn generate_distribution_table(
    group: &str,
    groups: &Groups<Distribution>,
    format: &NumberFormat,
) -> String {
    let mut table = String::new();

    table.push_str(&format!(
        "| {} | Count | Min | Q1 | Median | Q3 | Max |\n",
        group
    ));
    table.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");

    for (key, d) in groups.iter() {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            cell(key),
            format.count(d.count),
            format.decimal(d.min),
            format.decimal(d.q1),
            format.decimal(d.median),
            format.decimal(d.q3),
            format.decimal(d.max),
        ));
    }

    table
}

/// Generate the section listing metrics the dataset could not support.
fn generate_unavailable_section(unavailable: &[UnavailableMetric]) -> String {
    if unavailable.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Unavailable Metrics\n\n");
    section.push_str("The dataset has no column for the fields these metrics need.\n\n");
    section.push_str("| Metric | Missing Columns |\n");
    section.push_str("|:---|:---|\n");

    for metric in unavailable {
        let missing: Vec<_> = metric.missing.iter().map(|c| format!("`{}`", c)).collect();
        section.push_str(&format!(
            "| {} | {} |\n",
            metric.key.label(),
            missing.join(", ")
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by crashboard v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    pages: Vec<JsonPage<'a>>,
    unavailable: &'a [UnavailableMetric],
}

#[derive(Serialize)]
struct JsonPage<'a> {
    #[serde(flatten)]
    page: &'a PageSpec,
    values: Vec<&'a NamedMetric>,
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    let pages = report
        .pages
        .iter()
        .map(|page| JsonPage {
            page,
            values: page
                .metrics
                .iter()
                .filter_map(|key| report.summary.metrics.iter().find(|m| m.key == *key))
                .collect(),
        })
        .collect();

    let json = JsonReport {
        metadata: &report.summary.metadata,
        pages,
        unavailable: &report.summary.unavailable,
    };

    serde_json::to_string_pretty(&json).map_err(Into::into)
}
