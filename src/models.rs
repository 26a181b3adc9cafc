//! Data models for accident records and grouped results.
//!
//! This module contains the record type read from a dataset, the column
//! vocabulary used to address its fields, and the ordered group container
//! every aggregation returns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A column of the accident dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    RoadCondition,
    RoadType,
    TimeOfDay,
    AccidentSeverity,
    BikerAge,
    WearingHelmet,
    Weather,
    BikeSpeed,
    NumberOfVehicles,
    TrafficDensity,
}

impl Column {
    /// Every column, in dataset order.
    pub const ALL: [Column; 10] = [
        Column::RoadCondition,
        Column::RoadType,
        Column::TimeOfDay,
        Column::AccidentSeverity,
        Column::BikerAge,
        Column::WearingHelmet,
        Column::Weather,
        Column::BikeSpeed,
        Column::NumberOfVehicles,
        Column::TrafficDensity,
    ];

    /// Canonical snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::RoadCondition => "road_condition",
            Column::RoadType => "road_type",
            Column::TimeOfDay => "time_of_day",
            Column::AccidentSeverity => "accident_severity",
            Column::BikerAge => "biker_age",
            Column::WearingHelmet => "wearing_helmet",
            Column::Weather => "weather",
            Column::BikeSpeed => "bike_speed",
            Column::NumberOfVehicles => "number_of_vehicles",
            Column::TrafficDensity => "traffic_density",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Column::RoadCondition => "Road Condition",
            Column::RoadType => "Road Type",
            Column::TimeOfDay => "Time of Day",
            Column::AccidentSeverity => "Accident Severity",
            Column::BikerAge => "Biker Age",
            Column::WearingHelmet => "Wearing Helmet",
            Column::Weather => "Weather",
            Column::BikeSpeed => "Bike Speed",
            Column::NumberOfVehicles => "Number of Vehicles",
            Column::TrafficDensity => "Traffic Density",
        }
    }

    /// Match a header cell, ignoring case, spaces, dashes and underscores.
    pub fn from_header(header: &str) -> Option<Column> {
        let wanted = normalize_header(header);
        Column::ALL
            .into_iter()
            .find(|column| normalize_header(column.name()) == wanted)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Categorical fields records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    RoadCondition,
    RoadType,
    TimeOfDay,
    AccidentSeverity,
    WearingHelmet,
    Weather,
}

/// Numeric fields that can be averaged or summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    BikerAge,
    BikeSpeed,
    NumberOfVehicles,
    TrafficDensity,
}

/// Period of the day an accident happened in.
///
/// Declaration order is the display order; groups keyed by time of day
/// are always sorted by it rather than alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Noon,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ORDER: [TimeOfDay; 5] = [
        TimeOfDay::Morning,
        TimeOfDay::Noon,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Noon => "Noon",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }

    /// Display position of a group label, if it names a time of day.
    pub fn rank(label: &str) -> Option<usize> {
        label
            .parse::<TimeOfDay>()
            .ok()
            .and_then(|time| TimeOfDay::ORDER.iter().position(|t| *t == time))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "noon" => Ok(TimeOfDay::Noon),
            "afternoon" => Ok(TimeOfDay::Afternoon),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            other => Err(format!("unknown time of day: {other:?}")),
        }
    }
}

/// Parse a helmet-use cell.
pub fn parse_helmet(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn helmet_label(wearing: bool) -> &'static str {
    if wearing {
        "Yes"
    } else {
        "No"
    }
}

/// One accident record.
///
/// A field is `None` only when the dataset has no column for it; rows
/// with a blank or invalid value in a present column never become records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
    pub road_condition: Option<String>,
    pub road_type: Option<String>,
    pub time_of_day: Option<TimeOfDay>,
    pub accident_severity: Option<String>,
    pub biker_age: Option<f64>,
    pub wearing_helmet: Option<bool>,
    pub weather: Option<String>,
    pub bike_speed: Option<f64>,
    pub number_of_vehicles: Option<u32>,
    pub traffic_density: Option<f64>,
}

impl AccidentRecord {
    /// Group label of a categorical field.
    pub fn category(&self, field: CategoryField) -> Option<&str> {
        match field {
            CategoryField::RoadCondition => self.road_condition.as_deref(),
            CategoryField::RoadType => self.road_type.as_deref(),
            CategoryField::TimeOfDay => self.time_of_day.map(|t| t.as_str()),
            CategoryField::AccidentSeverity => self.accident_severity.as_deref(),
            CategoryField::WearingHelmet => self.wearing_helmet.map(helmet_label),
            CategoryField::Weather => self.weather.as_deref(),
        }
    }

    /// Value of a numeric field.
    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::BikerAge => self.biker_age,
            NumericField::BikeSpeed => self.bike_speed,
            NumericField::NumberOfVehicles => self.number_of_vehicles.map(f64::from),
            NumericField::TrafficDensity => self.traffic_density,
        }
    }
}

/// One labelled group value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry<V> {
    pub key: String,
    pub value: V,
}

/// Groups in first-seen order.
///
/// Keys compare ignoring ASCII case, so `Severe` and `SEVERE` land in one
/// group labelled with whichever spelling came first. Serialises as an ordered list so that the display order chosen here
/// survives into JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Groups<V> {
    entries: Vec<GroupEntry<V>>,
}

impl<V> Default for Groups<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Groups<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| &e.value)
    }

    /// Value for `key`, appending a new group built by `init` if absent.
    pub fn entry_or_insert_with(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let index = match self.entries.iter().position(|e| e.key.eq_ignore_ascii_case(key)) {
            Some(index) => index,
            None => {
                self.entries.push(GroupEntry {
                    key: key.to_string(),
                    value: init(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].value
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn map_values<U>(self, mut f: impl FnMut(V) -> U) -> Groups<U> {
        Groups {
            entries: self
                .entries
                .into_iter()
                .map(|e| GroupEntry {
                    key: e.key,
                    value: f(e.value),
                })
                .collect(),
        }
    }

    /// Move ranked keys to the front in rank order; unranked keys keep
    /// their first-seen order after them.
    pub fn sort_by_rank(&mut self, rank: impl Fn(&str) -> Option<usize>) {
        self.entries
            .sort_by_key(|e| rank(&e.key).unwrap_or(usize::MAX));
    }
}

impl Groups<usize> {
    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.value).sum()
    }
}

impl<V> FromIterator<(String, V)> for Groups<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut groups = Groups::new();
        for (key, value) in iter {
            let existing = groups
                .entries
                .iter_mut()
                .find(|e| e.key.eq_ignore_ascii_case(&key));
            match existing {
                Some(entry) => entry.value = value,
                None => groups.entries.push(GroupEntry { key, value }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_from_header_is_format_tolerant() {
        assert_eq!(Column::from_header("Road_condition"), Some(Column::RoadCondition));
        assert_eq!(Column::from_header("road condition"), Some(Column::RoadCondition));
        assert_eq!(Column::from_header("ROAD-CONDITION"), Some(Column::RoadCondition));
        assert_eq!(Column::from_header("Time_of_Day"), Some(Column::TimeOfDay));
        assert_eq!(Column::from_header(" Bike_Speed "), Some(Column::BikeSpeed));
        assert_eq!(Column::from_header("unrelated"), None);
    }

    #[test]
    fn test_time_of_day_parse_and_rank() {
        assert_eq!("afternoon".parse::<TimeOfDay>(), Ok(TimeOfDay::Afternoon));
        assert_eq!(" NIGHT ".parse::<TimeOfDay>(), Ok(TimeOfDay::Night));
        assert!("dawn".parse::<TimeOfDay>().is_err());

        assert_eq!(TimeOfDay::rank("Morning"), Some(0));
        assert_eq!(TimeOfDay::rank("Night"), Some(4));
        assert_eq!(TimeOfDay::rank("Dawn"), None);
    }

    #[test]
    fn test_parse_helmet() {
        assert_eq!(parse_helmet("Yes"), Some(true));
        assert_eq!(parse_helmet("no"), Some(false));
        assert_eq!(parse_helmet("1"), Some(true));
        assert_eq!(parse_helmet("maybe"), None);
    }

    #[test]
    fn test_record_accessors() {
        let record = AccidentRecord {
            time_of_day: Some(TimeOfDay::Evening),
            wearing_helmet: Some(false),
            number_of_vehicles: Some(3),
            ..Default::default()
        };

        assert_eq!(record.category(CategoryField::TimeOfDay), Some("Evening"));
        assert_eq!(record.category(CategoryField::WearingHelmet), Some("No"));
        assert_eq!(record.category(CategoryField::Weather), None);
        assert_eq!(record.numeric(NumericField::NumberOfVehicles), Some(3.0));
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let mut groups: Groups<usize> = Groups::new();
        for key in ["b", "a", "b", "c", "a", "b"] {
            *groups.entry_or_insert_with(key, || 0) += 1;
        }

        let keys: Vec<_> = groups.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(groups.get("b"), Some(&3));
        assert_eq!(groups.total(), 6);
    }

    #[test]
    fn test_groups_fold_case_to_first_spelling() {
        let mut groups: Groups<usize> = Groups::new();
        for key in ["Severe", "SEVERE", "Low", "severe"] {
            *groups.entry_or_insert_with(key, || 0) += 1;
        }

        let keys: Vec<_> = groups.keys().collect();
        assert_eq!(keys, vec!["Severe", "Low"]);
        assert_eq!(groups.get("sEvErE"), Some(&3));
    }

    #[test]
    fn test_groups_sort_by_rank_keeps_unranked_last() {
        let mut groups: Groups<usize> = [
            ("Night".to_string(), 1),
            ("Dusk".to_string(), 1),
            ("Morning".to_string(), 1),
        ]
        .into_iter()
        .collect();

        groups.sort_by_rank(TimeOfDay::rank);

        let keys: Vec<_> = groups.keys().collect();
        assert_eq!(keys, vec!["Morning", "Night", "Dusk"]);
    }

    #[test]
    fn test_groups_serialize_as_ordered_list() {
        let groups: Groups<usize> = [("Wet".to_string(), 2), ("Dry".to_string(), 5)]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&groups).unwrap();
        assert_eq!(json, r#"[{"key":"Wet","value":2},{"key":"Dry","value":5}]"#);
    }
}
