//! Report pages.
//!
//! A page is a titled group of metrics with a short statement of what it
//! is meant to show. All pages are rendered by the same generator; adding
//! a page means adding a [`PageKey`] and its metric list.

use crate::analysis::MetricKey;
use serde::{Deserialize, Serialize};

/// Built-in report pages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PageKey {
    /// Environmental and situational factors behind severe accidents
    Severity,
    /// Rider demographics and road/weather exposure
    Exposure,
    /// Speed, traffic and vehicle counts against severity
    Speed,
}

impl PageKey {
    pub const ALL: [PageKey; 3] = [PageKey::Severity, PageKey::Exposure, PageKey::Speed];

    pub fn spec(&self) -> PageSpec {
        match self {
            PageKey::Severity => PageSpec {
                key: *self,
                title: "Accident Severity Analysis",
                objective: "Environmental and situational factors most associated \
                            with the highest accident severity.",
                metrics: &[
                    MetricKey::OverallSevereCount,
                    MetricKey::MostSevereRoadType,
                    MetricKey::RiskiestRoadCondition,
                    MetricKey::HighestRiskTimeOfDay,
                    MetricKey::SeverityDistribution,
                    MetricKey::SevereByRoadType,
                    MetricKey::SevereByRoadCondition,
                    MetricKey::SevereByTimeOfDay,
                    MetricKey::AccidentsByTimeOfDay,
                    MetricKey::SeverityByRoadCondition,
                    MetricKey::SeverityByRoadType,
                    MetricKey::SeverityByTimeOfDay,
                ],
            },
            PageKey::Exposure => PageSpec {
                key: *self,
                title: "Biker Data and Environmental Exposure Analysis",
                objective: "How rider demographics, behaviour and environment relate \
                            to each other, independent of accident outcome.",
                metrics: &[
                    MetricKey::AvgAgeOverall,
                    MetricKey::HighestUsageRoadType,
                    MetricKey::AvgSpeedOverall,
                    MetricKey::RidersByHelmetUse,
                    MetricKey::AvgAgeByHelmetUse,
                    MetricKey::AgeDistributionByHelmetUse,
                    MetricKey::AccidentsByRoadType,
                    MetricKey::RoadTypeByWeather,
                    MetricKey::AvgSpeedByWeather,
                    MetricKey::SpeedDistributionByWeather,
                ],
            },
            PageKey::Speed => PageSpec {
                key: *self,
                title: "Biker Accident Analysis",
                objective: "Bike speed, traffic density, vehicles involved and rider \
                            age for each accident severity.",
                metrics: &[
                    MetricKey::AvgSpeedBySeverity,
                    MetricKey::AvgVehiclesBySeverity,
                    MetricKey::AvgTrafficDensityBySeverity,
                    MetricKey::AvgAgeBySeverity,
                ],
            },
        }
    }
}

/// What a page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSpec {
    pub key: PageKey,
    pub title: &'static str,
    pub objective: &'static str,
    pub metrics: &'static [MetricKey],
}

impl PageSpec {
    /// Markdown anchor for the page heading.
    pub fn anchor(&self) -> String {
        self.title
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Every metric needed by `pages`, in page order.
pub fn metrics_for(pages: &[PageKey]) -> Vec<MetricKey> {
    let mut keys = Vec::new();
    for page in pages {
        for key in page.spec().metrics {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
    }
    keys
}
