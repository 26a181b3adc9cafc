//! Synthetic accident samples.
//!
//! Generates a random but plausible dataset so reports can be produced
//! without a real CSV. Passing a seed makes the sample reproducible.

use super::Dataset;
use crate::models::{AccidentRecord, TimeOfDay};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

const ROAD_CONDITIONS: [&str; 2] = ["Dry", "Wet"];
const ROAD_TYPES: [&str; 3] = ["Highway", "Village Road", "City Road"];
const SEVERITIES: [&str; 3] = ["Low", "Moderate", "Severe"];
const WEATHER: [&str; 3] = ["Clear", "Rainy", "Foggy"];

/// Generate `rows` random records.
pub fn generate(rows: usize, seed: Option<u64>) -> Dataset {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let records = (0..rows).map(|_| random_record(&mut rng)).collect();

    let source = super::DataSource::Synthetic { rows, seed }.to_string();
    info!("Generated {} synthetic records", rows);

    Dataset::from_records(source, records)
}

fn random_record(rng: &mut StdRng) -> AccidentRecord {
    AccidentRecord {
        road_condition: pick(rng, &ROAD_CONDITIONS),
        road_type: pick(rng, &ROAD_TYPES),
        time_of_day: TimeOfDay::ORDER.choose(rng).copied(),
        accident_severity: pick(rng, &SEVERITIES),
        biker_age: Some(f64::from(rng.gen_range(16u32..70))),
        wearing_helmet: Some(rng.gen_bool(0.4)),
        weather: pick(rng, &WEATHER),
        bike_speed: Some(f64::from(rng.gen_range(20u32..100))),
        number_of_vehicles: Some(rng.gen_range(1..10)),
        traffic_density: Some(rng.gen_range(1.0..10.0)),
    }
}

fn pick(rng: &mut StdRng, choices: &[&str]) -> Option<String> {
    choices.choose(rng).map(|choice| choice.to_string())
}
