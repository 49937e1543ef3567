//! Built-in sample dataset.
//!
//! Used by `serve --sample` and by tests so the service can run without
//! downloaded files. Values are deterministic.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::loader::Dataset;
use super::records::{Dose, InfectionRecord, PopulationRecord, VaccinationRecord};

/// Councils in the sample with their populations.
pub const SAMPLE_COUNCILS: [(&str, u64); 5] = [
    ("Glasgow City", 635_640),
    ("City of Edinburgh", 527_620),
    ("Fife", 374_130),
    ("Aberdeen City", 228_670),
    ("Highland", 235_540),
];

/// Age bands used as infection categories.
pub const SAMPLE_CATEGORIES: [&str; 4] = ["0-19", "20-39", "40-59", "60+"];

/// Days of infection data in the sample.
pub const SAMPLE_DAYS: u64 = 28;

/// Weeks of vaccination data in the sample.
pub const SAMPLE_WEEKS: u64 = 6;

/// First day of the sample.
pub fn sample_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, 1).unwrap_or_default()
}

/// Build the sample dataset.
pub fn sample_dataset() -> Dataset {
    Dataset {
        infections: sample_infections(),
        vaccinations: sample_vaccinations(),
        populations: SAMPLE_COUNCILS
            .iter()
            .map(|(location, population)| PopulationRecord {
                location: location.to_string(),
                population: *population,
            })
            .collect(),
    }
}

fn sample_infections() -> Vec<InfectionRecord> {
    let start = sample_start();
    let mut records = Vec::new();

    for day in 0..SAMPLE_DAYS {
        let date = start + Days::new(day);
        for (council_idx, (location, population)) in SAMPLE_COUNCILS.iter().enumerate() {
            for (category_idx, category) in SAMPLE_CATEGORIES.iter().enumerate() {
                // Roughly proportional to population with a weekly wobble.
                let base = population / 20_000;
                let wobble = (day * 7 + council_idx as u64 * 3 + category_idx as u64 * 5) % 11;
                records.push(InfectionRecord {
                    date,
                    location: location.to_string(),
                    category: category.to_string(),
                    cases: base + wobble + category_idx as u64,
                });
            }
        }
    }

    records
}

fn sample_vaccinations() -> Vec<VaccinationRecord> {
    let start = sample_start();
    let mut records = Vec::new();
    let doses = [(Dose::First, 40u64), (Dose::Second, 15), (Dose::Booster, 5)];

    for (council_idx, (council, population)) in SAMPLE_COUNCILS.iter().enumerate() {
        let mut cumulative = [0u64; 3];
        for week in 0..SAMPLE_WEEKS {
            let date = start + Days::new(6 + week * 7);
            for (dose_idx, (dose, per_mille)) in doses.iter().enumerate() {
                // Weekly doses as a share of the population, in thousandths.
                let count = population * (per_mille + week + council_idx as u64) / 1_000;
                cumulative[dose_idx] += count;
                let percentage =
                    Decimal::from(cumulative[dose_idx] * 100) / Decimal::from(*population);
                records.push(VaccinationRecord {
                    date,
                    council: council.to_string(),
                    dose: *dose,
                    count,
                    percentage: percentage.round_dp(1),
                });
            }
        }
    }

    records
}
