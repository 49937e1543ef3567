//! Record types read from the CSV datasets.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Vaccine dose kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Dose {
    /// First dose.
    #[strum(to_string = "first", serialize = "1", serialize = "dose 1")]
    First,
    /// Second dose.
    #[strum(to_string = "second", serialize = "2", serialize = "dose 2")]
    Second,
    /// Booster (third or later) dose.
    #[strum(to_string = "booster", serialize = "3", serialize = "dose 3")]
    Booster,
}

impl<'de> Deserialize<'de> for Dose {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown dose: {:?}", raw)))
    }
}

/// New cases reported on one day, in one location, for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionRecord {
    /// Reporting date.
    pub date: NaiveDate,
    /// Council area or health board.
    pub location: String,
    /// Category such as an age band.
    pub category: String,
    /// New cases.
    pub cases: u64,
}

/// Doses given in the week ending `date`, with cumulative uptake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    /// Week ending date.
    pub date: NaiveDate,
    /// Council area.
    pub council: String,
    /// Dose kind.
    pub dose: Dose,
    /// Doses given during the week.
    pub count: u64,
    /// Cumulative share of the council population with this dose.
    pub percentage: Decimal,
}

/// Resident population of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Council area or health board.
    pub location: String,
    /// Number of residents.
    pub population: u64,
}
