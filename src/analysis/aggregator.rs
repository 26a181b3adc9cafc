//! Record aggregation and statistics.
//!
//! This module provides the grouped counts, means and rankings every
//! report metric is built from. All functions are pure and accept any
//! iterator of record references, so callers can pre-filter without
//! copying.

use crate::models::{AccidentRecord, CategoryField, GroupEntry, Groups, NumericField, TimeOfDay};
use serde::{Deserialize, Serialize};

/// Which severities an aggregation counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SeverityFilter {
    /// Every record.
    #[default]
    Any,
    /// Records whose severity equals this label, ignoring case.
    Only(String),
}

impl SeverityFilter {
    pub fn matches(&self, record: &AccidentRecord) -> bool {
        match self {
            SeverityFilter::Any => true,
            SeverityFilter::Only(label) => record
                .accident_severity
                .as_deref()
                .is_some_and(|severity| severity.eq_ignore_ascii_case(label)),
        }
    }
}

/// Pre-filter applied before grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub severity: SeverityFilter,
    /// Road conditions to keep; empty keeps all.
    pub road_conditions: Vec<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &AccidentRecord) -> bool {
        if !self.severity.matches(record) {
            return false;
        }
        if self.road_conditions.is_empty() {
            return true;
        }
        record.road_condition.as_deref().is_some_and(|condition| {
            self.road_conditions
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(condition))
        })
    }
}

/// Five-number summary of a numeric sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Distribution {
    /// Summarise a sample; `None` when it is empty.
    ///
    /// Quartiles use linear interpolation between closest ranks.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            count: values.len(),
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Time-of-day groups always follow the fixed day order.
fn apply_display_order<V>(groups: &mut Groups<V>, field: CategoryField) {
    if field == CategoryField::TimeOfDay {
        groups.sort_by_rank(TimeOfDay::rank);
    }
}

/// Count records per severity, optionally pre-filtered.
pub fn count_by_severity<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    filter: Option<&RecordFilter>,
) -> Groups<usize> {
    let mut counts = Groups::new();

    for record in records {
        if filter.is_some_and(|f| !f.matches(record)) {
            continue;
        }
        if let Some(severity) = record.accident_severity.as_deref() {
            *counts.entry_or_insert_with(severity, || 0) += 1;
        }
    }

    counts
}

fn tally<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    field: CategoryField,
    severity: &SeverityFilter,
) -> Groups<usize> {
    let mut counts = Groups::new();

    for record in records.into_iter().filter(|r| severity.matches(r)) {
        if let Some(key) = record.category(field) {
            *counts.entry_or_insert_with(key, || 0) += 1;
        }
    }

    counts
}

/// Count records matching `severity` per value of `field`.
pub fn count_by_category<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    field: CategoryField,
    severity: &SeverityFilter,
) -> Groups<usize> {
    let mut counts = tally(records, field, severity);
    apply_display_order(&mut counts, field);
    counts
}

/// Value of `field` with the most records matching `severity`.
///
/// Ranked before any display ordering, so ties go to the value that
/// occurs first in `records`.
pub fn top_category<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    field: CategoryField,
    severity: &SeverityFilter,
) -> Option<GroupEntry<usize>> {
    rank_top(&tally(records, field, severity))
}

/// Arithmetic mean of `numeric` per value of `group`.
///
/// Groups only exist once a record lands in them, so no mean is ever
/// taken over zero values.
pub fn mean_by_group<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    numeric: NumericField,
    group: CategoryField,
) -> Groups<f64> {
    let mut sums: Groups<(f64, usize)> = Groups::new();

    for record in records {
        if let (Some(key), Some(value)) = (record.category(group), record.numeric(numeric)) {
            let entry = sums.entry_or_insert_with(key, || (0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    apply_display_order(&mut sums, group);
    sums.map_values(|(sum, count)| sum / count as f64)
}

/// Mean of `numeric` over all records that have it.
pub fn mean<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    numeric: NumericField,
) -> Option<f64> {
    let (sum, count) = records
        .into_iter()
        .filter_map(|r| r.numeric(numeric))
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Group with the largest value. Ties go to the group seen first.
pub fn rank_top<V: PartialOrd + Clone>(groups: &Groups<V>) -> Option<GroupEntry<V>> {
    let mut best: Option<(&str, &V)> = None;

    for (key, value) in groups.iter() {
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((key, value));
        }
    }

    best.map(|(key, value)| GroupEntry {
        key: key.to_string(),
        value: value.clone(),
    })
}

/// Count records per `row` value, broken down by `column` value.
pub fn cross_tabulate<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    row: CategoryField,
    column: CategoryField,
) -> Groups<Groups<usize>> {
    let mut table: Groups<Groups<usize>> = Groups::new();

    for record in records {
        if let (Some(row_key), Some(column_key)) = (record.category(row), record.category(column))
        {
            let counts = table.entry_or_insert_with(row_key, Groups::new);
            *counts.entry_or_insert_with(column_key, || 0) += 1;
        }
    }

    apply_display_order(&mut table, row);
    table.map_values(|mut counts| {
        apply_display_order(&mut counts, column);
        counts
    })
}

/// Five-number summary of `numeric` per value of `group`.
pub fn describe_by_group<'a>(
    records: impl IntoIterator<Item = &'a AccidentRecord>,
    numeric: NumericField,
    group: CategoryField,
) -> Groups<Distribution> {
    let mut samples: Groups<Vec<f64>> = Groups::new();

    for record in records {
        if let (Some(key), Some(value)) = (record.category(group), record.numeric(numeric)) {
            samples.entry_or_insert_with(key, Vec::new).push(value);
        }
    }

    apply_display_order(&mut samples, group);

    samples
        .iter()
        .filter_map(|(key, values)| {
            Distribution::from_values(values.clone()).map(|d| (key.to_string(), d))
        })
        .collect()
}
