//! Report pages and rendering.

pub mod generator;
pub mod pages;

pub use generator::{generate_json_report, generate_markdown_report, NumberFormat, Report};
pub use pages::{metrics_for, PageKey};
