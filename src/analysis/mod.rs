//! Analysis modules.
//!
//! `aggregator` holds the grouping primitives, `summary` turns them into
//! named report metrics.

pub mod aggregator;
pub mod summary;

pub use summary::{
    build_summary, AggregationOptions, MetricKey, MetricValue, SummaryReport,
};
