//! Metric catalogue and summary report building.
//!
//! Every metric a report page can show is listed in [`MetricKey`] along
//! with the columns it needs. [`build_summary`] computes the requested
//! metrics over a dataset; metrics whose columns are missing are left out
//! and listed as unavailable instead of failing the whole report.

use super::aggregator::{
    count_by_category, count_by_severity, cross_tabulate, describe_by_group, mean,
    mean_by_group, top_category, Distribution, RecordFilter, SeverityFilter,
};
use crate::dataset::Dataset;
use crate::models::{AccidentRecord, CategoryField, Column, GroupEntry, Groups, NumericField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Options that decide which records count as severe and which are in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Severity label treated as "severe", matched ignoring case.
    pub severity_label: String,
    /// Road conditions to restrict the report to; empty means all records.
    pub road_conditions: Vec<String>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            severity_label: "Severe".to_string(),
            road_conditions: Vec::new(),
        }
    }
}

impl AggregationOptions {
    fn severe(&self) -> SeverityFilter {
        SeverityFilter::Only(self.severity_label.clone())
    }

    fn scope(&self) -> RecordFilter {
        RecordFilter {
            severity: SeverityFilter::Any,
            road_conditions: self.road_conditions.clone(),
        }
    }
}

/// Named metric a report can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    OverallSevereCount,
    SeverityDistribution,
    SevereByRoadType,
    SevereByRoadCondition,
    SevereByTimeOfDay,
    MostSevereRoadType,
    RiskiestRoadCondition,
    HighestRiskTimeOfDay,
    AccidentsByTimeOfDay,
    SeverityByRoadCondition,
    SeverityByRoadType,
    SeverityByTimeOfDay,
    AvgAgeOverall,
    AvgAgeByHelmetUse,
    AgeDistributionByHelmetUse,
    RidersByHelmetUse,
    AccidentsByRoadType,
    HighestUsageRoadType,
    AvgSpeedOverall,
    AvgSpeedByWeather,
    SpeedDistributionByWeather,
    RoadTypeByWeather,
    AvgSpeedBySeverity,
    AvgVehiclesBySeverity,
    AvgTrafficDensityBySeverity,
    AvgAgeBySeverity,
}

impl MetricKey {
    pub const ALL: [MetricKey; 26] = [
        MetricKey::OverallSevereCount,
        MetricKey::SeverityDistribution,
        MetricKey::SevereByRoadType,
        MetricKey::SevereByRoadCondition,
        MetricKey::SevereByTimeOfDay,
        MetricKey::MostSevereRoadType,
        MetricKey::RiskiestRoadCondition,
        MetricKey::HighestRiskTimeOfDay,
        MetricKey::AccidentsByTimeOfDay,
        MetricKey::SeverityByRoadCondition,
        MetricKey::SeverityByRoadType,
        MetricKey::SeverityByTimeOfDay,
        MetricKey::AvgAgeOverall,
        MetricKey::AvgAgeByHelmetUse,
        MetricKey::AgeDistributionByHelmetUse,
        MetricKey::RidersByHelmetUse,
        MetricKey::AccidentsByRoadType,
        MetricKey::HighestUsageRoadType,
        MetricKey::AvgSpeedOverall,
        MetricKey::AvgSpeedByWeather,
        MetricKey::SpeedDistributionByWeather,
        MetricKey::RoadTypeByWeather,
        MetricKey::AvgSpeedBySeverity,
        MetricKey::AvgVehiclesBySeverity,
        MetricKey::AvgTrafficDensityBySeverity,
        MetricKey::AvgAgeBySeverity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::OverallSevereCount => "overall_severe_count",
            MetricKey::SeverityDistribution => "severity_distribution",
            MetricKey::SevereByRoadType => "severe_by_road_type",
            MetricKey::SevereByRoadCondition => "severe_by_road_condition",
            MetricKey::SevereByTimeOfDay => "severe_by_time_of_day",
            MetricKey::MostSevereRoadType => "most_severe_road_type",
            MetricKey::RiskiestRoadCondition => "riskiest_road_condition",
            MetricKey::HighestRiskTimeOfDay => "highest_risk_time_of_day",
            MetricKey::AccidentsByTimeOfDay => "accidents_by_time_of_day",
            MetricKey::SeverityByRoadCondition => "severity_by_road_condition",
            MetricKey::SeverityByRoadType => "severity_by_road_type",
            MetricKey::SeverityByTimeOfDay => "severity_by_time_of_day",
            MetricKey::AvgAgeOverall => "avg_age_overall",
            MetricKey::AvgAgeByHelmetUse => "avg_age_by_helmet_use",
            MetricKey::AgeDistributionByHelmetUse => "age_distribution_by_helmet_use",
            MetricKey::RidersByHelmetUse => "riders_by_helmet_use",
            MetricKey::AccidentsByRoadType => "accidents_by_road_type",
            MetricKey::HighestUsageRoadType => "highest_usage_road_type",
            MetricKey::AvgSpeedOverall => "avg_speed_overall",
            MetricKey::AvgSpeedByWeather => "avg_speed_by_weather",
            MetricKey::SpeedDistributionByWeather => "speed_distribution_by_weather",
            MetricKey::RoadTypeByWeather => "road_type_by_weather",
            MetricKey::AvgSpeedBySeverity => "avg_speed_by_severity",
            MetricKey::AvgVehiclesBySeverity => "avg_vehicles_by_severity",
            MetricKey::AvgTrafficDensityBySeverity => "avg_traffic_density_by_severity",
            MetricKey::AvgAgeBySeverity => "avg_age_by_severity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::OverallSevereCount => "Overall Severe Accidents",
            MetricKey::SeverityDistribution => "Accidents by Severity",
            MetricKey::SevereByRoadType => "Severe Accidents by Road Type",
            MetricKey::SevereByRoadCondition => "Severe Accidents by Road Condition",
            MetricKey::SevereByTimeOfDay => "Severe Accidents by Time of Day",
            MetricKey::MostSevereRoadType => "Most Severe Road Type",
            MetricKey::RiskiestRoadCondition => "Road Condition Risk",
            MetricKey::HighestRiskTimeOfDay => "Highest Risk Time",
            MetricKey::AccidentsByTimeOfDay => "Accidents by Time of Day",
            MetricKey::SeverityByRoadCondition => "Accident Severity by Road Condition",
            MetricKey::SeverityByRoadType => "Accident Severity by Road Type",
            MetricKey::SeverityByTimeOfDay => "Accident Severity by Time of Day",
            MetricKey::AvgAgeOverall => "Average Biker Age",
            MetricKey::AvgAgeByHelmetUse => "Average Age by Helmet Use",
            MetricKey::AgeDistributionByHelmetUse => "Biker Age Distribution by Helmet Use",
            MetricKey::RidersByHelmetUse => "Riders by Helmet Use",
            MetricKey::AccidentsByRoadType => "Accidents by Road Type",
            MetricKey::HighestUsageRoadType => "Highest Usage Road Type",
            MetricKey::AvgSpeedOverall => "Average Bike Speed",
            MetricKey::AvgSpeedByWeather => "Average Speed by Weather",
            MetricKey::SpeedDistributionByWeather => "Bike Speed Distribution by Weather",
            MetricKey::RoadTypeByWeather => "Road Type Distribution by Weather",
            MetricKey::AvgSpeedBySeverity => "Average Speed by Severity",
            MetricKey::AvgVehiclesBySeverity => "Average Vehicles Involved by Severity",
            MetricKey::AvgTrafficDensityBySeverity => "Average Traffic Density by Severity",
            MetricKey::AvgAgeBySeverity => "Average Biker Age by Severity",
        }
    }

    /// Columns that must be present for the metric to be computed.
    pub fn required_columns(&self) -> &'static [Column] {
        use Column::*;
        match self {
            MetricKey::OverallSevereCount | MetricKey::SeverityDistribution => &[AccidentSeverity],
            MetricKey::SevereByRoadType
            | MetricKey::MostSevereRoadType
            | MetricKey::SeverityByRoadType => &[AccidentSeverity, RoadType],
            MetricKey::SevereByRoadCondition
            | MetricKey::RiskiestRoadCondition
            | MetricKey::SeverityByRoadCondition => &[AccidentSeverity, RoadCondition],
            MetricKey::SevereByTimeOfDay
            | MetricKey::HighestRiskTimeOfDay
            | MetricKey::SeverityByTimeOfDay => &[AccidentSeverity, TimeOfDay],
            MetricKey::AccidentsByTimeOfDay => &[TimeOfDay],
            MetricKey::AvgAgeOverall => &[BikerAge],
            MetricKey::AvgAgeByHelmetUse | MetricKey::AgeDistributionByHelmetUse => {
                &[BikerAge, WearingHelmet]
            }
            MetricKey::RidersByHelmetUse => &[WearingHelmet],
            MetricKey::AccidentsByRoadType | MetricKey::HighestUsageRoadType => &[RoadType],
            MetricKey::AvgSpeedOverall => &[BikeSpeed],
            MetricKey::AvgSpeedByWeather | MetricKey::SpeedDistributionByWeather => {
                &[BikeSpeed, Weather]
            }
            MetricKey::RoadTypeByWeather => &[Weather, RoadType],
            MetricKey::AvgSpeedBySeverity => &[BikeSpeed, AccidentSeverity],
            MetricKey::AvgVehiclesBySeverity => &[NumberOfVehicles, AccidentSeverity],
            MetricKey::AvgTrafficDensityBySeverity => &[TrafficDensity, AccidentSeverity],
            MetricKey::AvgAgeBySeverity => &[BikerAge, AccidentSeverity],
        }
    }

    /// Column the metric's groups are keyed by, for grouped metrics.
    pub fn grouped_by(&self) -> Option<Column> {
        match self {
            MetricKey::SeverityDistribution
            | MetricKey::AvgSpeedBySeverity
            | MetricKey::AvgVehiclesBySeverity
            | MetricKey::AvgTrafficDensityBySeverity
            | MetricKey::AvgAgeBySeverity => Some(Column::AccidentSeverity),
            MetricKey::SevereByRoadType
            | MetricKey::MostSevereRoadType
            | MetricKey::AccidentsByRoadType
            | MetricKey::HighestUsageRoadType
            | MetricKey::SeverityByRoadType => Some(Column::RoadType),
            MetricKey::SevereByRoadCondition
            | MetricKey::RiskiestRoadCondition
            | MetricKey::SeverityByRoadCondition => Some(Column::RoadCondition),
            MetricKey::SevereByTimeOfDay
            | MetricKey::HighestRiskTimeOfDay
            | MetricKey::AccidentsByTimeOfDay
            | MetricKey::SeverityByTimeOfDay => Some(Column::TimeOfDay),
            MetricKey::AvgAgeByHelmetUse
            | MetricKey::AgeDistributionByHelmetUse
            | MetricKey::RidersByHelmetUse => Some(Column::WearingHelmet),
            MetricKey::AvgSpeedByWeather
            | MetricKey::SpeedDistributionByWeather
            | MetricKey::RoadTypeByWeather => Some(Column::Weather),
            MetricKey::OverallSevereCount | MetricKey::AvgAgeOverall | MetricKey::AvgSpeedOverall => {
                None
            }
        }
    }

    /// Compute this metric over already-scoped records.
    pub fn compute(&self, records: &[&AccidentRecord], options: &AggregationOptions) -> MetricValue {
        let rows = records.iter().copied();
        let severe = options.severe();

        match self {
            MetricKey::OverallSevereCount => MetricValue::Count(
                rows.filter(|r| severe.matches(r)).count(),
            ),
            MetricKey::SeverityDistribution => MetricValue::Counts(count_by_severity(rows, None)),
            MetricKey::SevereByRoadType => {
                MetricValue::Counts(count_by_category(rows, CategoryField::RoadType, &severe))
            }
            MetricKey::SevereByRoadCondition => {
                MetricValue::Counts(count_by_category(rows, CategoryField::RoadCondition, &severe))
            }
            MetricKey::SevereByTimeOfDay => {
                MetricValue::Counts(count_by_category(rows, CategoryField::TimeOfDay, &severe))
            }
            MetricKey::MostSevereRoadType => MetricValue::Top(top_category(
                rows,
                CategoryField::RoadType,
                &severe,
            )),
            MetricKey::RiskiestRoadCondition => MetricValue::Top(top_category(
                rows,
                CategoryField::RoadCondition,
                &severe,
            )),
            MetricKey::HighestRiskTimeOfDay => MetricValue::Top(top_category(
                rows,
                CategoryField::TimeOfDay,
                &severe,
            )),
            MetricKey::AccidentsByTimeOfDay => MetricValue::Counts(count_by_category(
                rows,
                CategoryField::TimeOfDay,
                &SeverityFilter::Any,
            )),
            MetricKey::SeverityByRoadCondition => MetricValue::CrossTab(cross_tabulate(
                rows,
                CategoryField::RoadCondition,
                CategoryField::AccidentSeverity,
            )),
            MetricKey::SeverityByRoadType => MetricValue::CrossTab(cross_tabulate(
                rows,
                CategoryField::RoadType,
                CategoryField::AccidentSeverity,
            )),
            MetricKey::SeverityByTimeOfDay => MetricValue::CrossTab(cross_tabulate(
                rows,
                CategoryField::TimeOfDay,
                CategoryField::AccidentSeverity,
            )),
            MetricKey::AvgAgeOverall => MetricValue::Mean(mean(rows, NumericField::BikerAge)),
            MetricKey::AvgAgeByHelmetUse => MetricValue::Means(mean_by_group(
                rows,
                NumericField::BikerAge,
                CategoryField::WearingHelmet,
            )),
            MetricKey::AgeDistributionByHelmetUse => MetricValue::Distributions(describe_by_group(
                rows,
                NumericField::BikerAge,
                CategoryField::WearingHelmet,
            )),
            MetricKey::RidersByHelmetUse => MetricValue::Counts(count_by_category(
                rows,
                CategoryField::WearingHelmet,
                &SeverityFilter::Any,
            )),
            MetricKey::AccidentsByRoadType => MetricValue::Counts(count_by_category(
                rows,
                CategoryField::RoadType,
                &SeverityFilter::Any,
            )),
            MetricKey::HighestUsageRoadType => MetricValue::Top(top_category(
                rows,
                CategoryField::RoadType,
                &SeverityFilter::Any,
            )),
            MetricKey::AvgSpeedOverall => MetricValue::Mean(mean(rows, NumericField::BikeSpeed)),
            MetricKey::AvgSpeedByWeather => MetricValue::Means(mean_by_group(
                rows,
                NumericField::BikeSpeed,
                CategoryField::Weather,
            )),
            MetricKey::SpeedDistributionByWeather => MetricValue::Distributions(
                describe_by_group(rows, NumericField::BikeSpeed, CategoryField::Weather),
            ),
            MetricKey::RoadTypeByWeather => MetricValue::CrossTab(cross_tabulate(
                rows,
                CategoryField::Weather,
                CategoryField::RoadType,
            )),
            MetricKey::AvgSpeedBySeverity => MetricValue::Means(mean_by_group(
                rows,
                NumericField::BikeSpeed,
                CategoryField::AccidentSeverity,
            )),
            MetricKey::AvgVehiclesBySeverity => MetricValue::Means(mean_by_group(
                rows,
                NumericField::NumberOfVehicles,
                CategoryField::AccidentSeverity,
            )),
            MetricKey::AvgTrafficDensityBySeverity => MetricValue::Means(mean_by_group(
                rows,
                NumericField::TrafficDensity,
                CategoryField::AccidentSeverity,
            )),
            MetricKey::AvgAgeBySeverity => MetricValue::Means(mean_by_group(
                rows,
                NumericField::BikerAge,
                CategoryField::AccidentSeverity,
            )),
        }
    }
}

/// Computed value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// Single count.
    Count(usize),
    /// Single mean; `None` when no record had the field.
    Mean(Option<f64>),
    /// Count per group.
    Counts(Groups<usize>),
    /// Mean per group.
    Means(Groups<f64>),
    /// Highest-count group; `None` when there were no groups.
    Top(Option<GroupEntry<usize>>),
    /// Counts per row group, broken down by column group.
    CrossTab(Groups<Groups<usize>>),
    /// Five-number summary per group.
    Distributions(Groups<Distribution>),
}

impl MetricValue {
    /// Whether the value is a single headline figure rather than a table.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            MetricValue::Count(_) | MetricValue::Mean(_) | MetricValue::Top(_)
        )
    }
}

/// A metric and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMetric {
    pub key: MetricKey,
    pub value: MetricValue,
}

/// A metric left out because the dataset lacks columns it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableMetric {
    pub key: MetricKey,
    pub missing: Vec<Column>,
}

/// Facts about the data a summary was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Dataset source description.
    pub source: String,
    /// When the summary was computed.
    pub generated_at: DateTime<Utc>,
    /// Rows read, including skipped ones.
    pub total_rows: usize,
    /// Malformed rows that were dropped.
    pub skipped_rows: usize,
    /// Records remaining after the road-condition scope.
    pub records_in_scope: usize,
    /// Severity label counted as severe.
    pub severity_label: String,
    /// Road conditions the report is restricted to; empty means all.
    pub road_condition_scope: Vec<String>,
}

/// Computed metrics for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub metadata: ReportMetadata,
    pub metrics: Vec<NamedMetric>,
    pub unavailable: Vec<UnavailableMetric>,
}

impl SummaryReport {
    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.metrics.iter().find(|m| m.key == key).map(|m| &m.value)
    }

    pub fn is_unavailable(&self, key: MetricKey) -> bool {
        self.unavailable.iter().any(|u| u.key == key)
    }
}

/// Compute `keys` over `dataset`.
///
/// Records outside the configured road-condition scope are ignored. A
/// metric whose columns the dataset lacks is listed in `unavailable`; a
/// road-condition scope makes every metric depend on that column.
pub fn build_summary(
    dataset: &Dataset,
    options: &AggregationOptions,
    keys: &[MetricKey],
) -> SummaryReport {
    let scope = options.scope();
    let records: Vec<&AccidentRecord> = dataset
        .records
        .iter()
        .filter(|r| scope.matches(r))
        .collect();

    debug!(
        "{} of {} records in scope",
        records.len(),
        dataset.records.len()
    );

    let mut metrics = Vec::new();
    let mut unavailable = Vec::new();

    for key in unique(keys) {
        let mut missing = dataset.schema.missing(key.required_columns());
        if !options.road_conditions.is_empty()
            && !dataset.schema.has(Column::RoadCondition)
            && !missing.contains(&Column::RoadCondition)
        {
            missing.push(Column::RoadCondition);
        }

        if missing.is_empty() {
            metrics.push(NamedMetric {
                key,
                value: key.compute(&records, options),
            });
        } else {
            let names: Vec<_> = missing.iter().map(Column::name).collect();
            warn!("Metric {} unavailable: missing {}", key.as_str(), names.join(", "));
            unavailable.push(UnavailableMetric { key, missing });
        }
    }

    SummaryReport {
        metadata: ReportMetadata {
            source: dataset.source.clone(),
            generated_at: Utc::now(),
            total_rows: dataset.total_rows(),
            skipped_rows: dataset.skipped_rows,
            records_in_scope: records.len(),
            severity_label: options.severity_label.clone(),
            road_condition_scope: options.road_conditions.clone(),
        },
        metrics,
        unavailable,
    }
}

fn unique(keys: &[MetricKey]) -> Vec<MetricKey> {
    let mut seen = Vec::with_capacity(keys.len());
    for key in keys {
        if !seen.contains(key) {
            seen.push(*key);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::parse_csv;
    use crate::dataset::Schema;

    const FIXTURE: &str = include_str!("../../fixtures/accidents.csv");

    fn fixture() -> Dataset {
        parse_csv(FIXTURE.as_bytes(), "fixture").unwrap()
    }

    fn counts(report: &SummaryReport, key: MetricKey) -> Vec<(String, usize)> {
        match report.get(key) {
            Some(MetricValue::Counts(groups)) => {
                groups.iter().map(|(k, v)| (k.to_string(), *v)).collect()
            }
            other => panic!("expected counts for {:?}, got {:?}", key, other),
        }
    }

    fn top(report: &SummaryReport, key: MetricKey) -> Option<(String, usize)> {
        match report.get(key) {
            Some(MetricValue::Top(entry)) => entry.as_ref().map(|e| (e.key.clone(), e.value)),
            other => panic!("expected top for {:?}, got {:?}", key, other),
        }
    }

    fn pairs(items: &[(&str, usize)]) -> Vec<(String, usize)> {
        items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_severity_metrics_from_fixture() {
        let report = build_summary(&fixture(), &AggregationOptions::default(), &MetricKey::ALL);

        assert!(report.unavailable.is_empty());
        assert_eq!(report.metadata.total_rows, 12);
        assert_eq!(report.metadata.skipped_rows, 3);
        assert_eq!(report.metadata.records_in_scope, 9);

        assert_eq!(
            report.get(MetricKey::OverallSevereCount),
            Some(&MetricValue::Count(4))
        );
        assert_eq!(
            counts(&report, MetricKey::SevereByRoadType),
            pairs(&[("Highway", 3), ("Village Road", 1)])
        );
        assert_eq!(
            counts(&report, MetricKey::SevereByTimeOfDay),
            pairs(&[("Afternoon", 2), ("Evening", 1), ("Night", 1)])
        );
        assert_eq!(
            top(&report, MetricKey::MostSevereRoadType),
            Some(("Highway".to_string(), 3))
        );
        // Dry and Wet tie on 2; Dry appears first
        assert_eq!(
            top(&report, MetricKey::RiskiestRoadCondition),
            Some(("Dry".to_string(), 2))
        );
        assert_eq!(
            top(&report, MetricKey::HighestUsageRoadType),
            Some(("Village Road".to_string(), 4))
        );
        assert_eq!(
            counts(&report, MetricKey::SeverityDistribution),
            pairs(&[("Severe", 4), ("Moderate", 2), ("Low", 3)])
        );
    }

    #[test]
    fn test_exposure_metrics_from_fixture() {
        let report = build_summary(&fixture(), &AggregationOptions::default(), &MetricKey::ALL);

        assert_eq!(
            counts(&report, MetricKey::RidersByHelmetUse),
            pairs(&[("No", 5), ("Yes", 4)])
        );

        match report.get(MetricKey::AvgAgeByHelmetUse) {
            Some(MetricValue::Means(means)) => {
                assert!((means.get("No").unwrap() - 22.2).abs() < 1e-9);
                assert!((means.get("Yes").unwrap() - 32.5).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }

        match report.get(MetricKey::AvgSpeedByWeather) {
            Some(MetricValue::Means(means)) => {
                assert_eq!(means.get("Clear"), Some(&60.75));
                assert_eq!(means.get("Foggy"), Some(&87.5));
            }
            other => panic!("unexpected {:?}", other),
        }

        match report.get(MetricKey::AvgAgeOverall) {
            Some(MetricValue::Mean(Some(age))) => assert!((age - 241.0 / 9.0).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_road_condition_scope() {
        let options = AggregationOptions {
            road_conditions: vec!["dry".to_string()],
            ..Default::default()
        };
        let report = build_summary(&fixture(), &options, &[MetricKey::OverallSevereCount]);

        assert_eq!(report.metadata.records_in_scope, 6);
        assert_eq!(
            report.get(MetricKey::OverallSevereCount),
            Some(&MetricValue::Count(2))
        );
    }

    #[test]
    fn test_custom_severity_label() {
        let options = AggregationOptions {
            severity_label: "moderate".to_string(),
            ..Default::default()
        };
        let report = build_summary(&fixture(), &options, &[MetricKey::OverallSevereCount]);

        assert_eq!(
            report.get(MetricKey::OverallSevereCount),
            Some(&MetricValue::Count(2))
        );
    }

    #[test]
    fn test_empty_dataset_reports_every_metric() {
        let dataset = Dataset::from_records("empty", Vec::new());
        let report = build_summary(&dataset, &AggregationOptions::default(), &MetricKey::ALL);

        assert_eq!(report.metrics.len(), MetricKey::ALL.len());
        assert!(report.unavailable.is_empty());
        assert_eq!(
            report.get(MetricKey::OverallSevereCount),
            Some(&MetricValue::Count(0))
        );
        assert_eq!(
            report.get(MetricKey::MostSevereRoadType),
            Some(&MetricValue::Top(None))
        );
        assert_eq!(
            report.get(MetricKey::AvgSpeedOverall),
            Some(&MetricValue::Mean(None))
        );
        assert_eq!(
            report.get(MetricKey::SevereByRoadType),
            Some(&MetricValue::Counts(Groups::new()))
        );
    }

    #[test]
    fn test_empty_file_reports_every_metric() {
        let dataset = parse_csv("".as_bytes(), "empty").unwrap();
        let report = build_summary(&dataset, &AggregationOptions::default(), &MetricKey::ALL);

        assert_eq!(report.metrics.len(), MetricKey::ALL.len());
        assert!(report.unavailable.is_empty());
        assert_eq!(
            report.get(MetricKey::OverallSevereCount),
            Some(&MetricValue::Count(0))
        );
    }

    #[test]
    fn test_time_of_day_tie_goes_to_first_occurrence() {
        let csv = "Time_of_Day,Accident_Severity\nNight,Severe\nMorning,Severe\n";
        let dataset = parse_csv(csv.as_bytes(), "inline").unwrap();
        let report = build_summary(
            &dataset,
            &AggregationOptions::default(),
            &[MetricKey::HighestRiskTimeOfDay, MetricKey::SevereByTimeOfDay],
        );

        assert_eq!(
            top(&report, MetricKey::HighestRiskTimeOfDay),
            Some(("Night".to_string(), 1))
        );
        // Display order is unaffected by the ranking.
        assert_eq!(
            counts(&report, MetricKey::SevereByTimeOfDay),
            pairs(&[("Morning", 1), ("Night", 1)])
        );
    }

    #[test]
    fn test_severity_groups_fold_case() {
        let csv = "Accident_Severity\nSevere\nSEVERE\nLow\n";
        let dataset = parse_csv(csv.as_bytes(), "inline").unwrap();
        let report = build_summary(
            &dataset,
            &AggregationOptions::default(),
            &[MetricKey::OverallSevereCount, MetricKey::SeverityDistribution],
        );

        assert_eq!(
            report.get(MetricKey::OverallSevereCount),
            Some(&MetricValue::Count(2))
        );
        assert_eq!(
            counts(&report, MetricKey::SeverityDistribution),
            pairs(&[("Severe", 2), ("Low", 1)])
        );
    }

    #[test]
    fn test_missing_column_flags_only_dependent_metrics() {
        let mut dataset = fixture();
        dataset.schema = Schema::from_columns(
            Column::ALL
                .into_iter()
                .filter(|c| *c != Column::Weather),
        );

        let report = build_summary(&dataset, &AggregationOptions::default(), &MetricKey::ALL);

        assert!(report.is_unavailable(MetricKey::AvgSpeedByWeather));
        assert!(report.is_unavailable(MetricKey::RoadTypeByWeather));
        assert!(report.get(MetricKey::AvgSpeedByWeather).is_none());
        assert!(report.get(MetricKey::OverallSevereCount).is_some());
        assert_eq!(report.unavailable.len(), 3);
        assert_eq!(report.unavailable[0].missing, vec![Column::Weather]);
    }

    #[test]
    fn test_scope_without_road_condition_column() {
        let csv = "Accident_Severity\nSevere\n";
        let dataset = parse_csv(csv.as_bytes(), "inline").unwrap();
        let options = AggregationOptions {
            road_conditions: vec!["Dry".to_string()],
            ..Default::default()
        };

        let report = build_summary(&dataset, &options, &[MetricKey::OverallSevereCount]);

        assert!(report.metrics.is_empty());
        assert_eq!(report.unavailable[0].missing, vec![Column::RoadCondition]);
    }

    #[test]
    fn test_duplicate_keys_computed_once() {
        let report = build_summary(
            &fixture(),
            &AggregationOptions::default(),
            &[MetricKey::OverallSevereCount, MetricKey::OverallSevereCount],
        );
        assert_eq!(report.metrics.len(), 1);
    }

    #[test]
    fn test_metric_names_are_unique() {
        let mut names: Vec<_> = MetricKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MetricKey::ALL.len());
    }

    #[test]
    fn test_metric_value_json_shape() {
        let value = MetricValue::Count(2644);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"count","value":2644}"#);
    }
}
