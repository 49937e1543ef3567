//! Read-only views over vaccination records.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::dataset::records::{Dose, PopulationRecord, VaccinationRecord};

/// Doses given in one week across all councils.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyDoses {
    /// Week ending date.
    pub week_ending: NaiveDate,
    /// First doses.
    pub first: u64,
    /// Second doses.
    pub second: u64,
    /// Booster doses.
    pub booster: u64,
    /// All doses.
    pub total: u64,
}

/// National uptake for one dose.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseUptake {
    /// Dose kind.
    pub dose: Dose,
    /// Share of the population with this dose.
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

/// Latest uptake per dose for one council.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CouncilUptake {
    /// Council name.
    pub council: String,
    /// First dose uptake.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub first: Option<Decimal>,
    /// Second dose uptake.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub second: Option<Decimal>,
    /// Booster uptake.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub booster: Option<Decimal>,
}

/// Cumulative doses up to a date across all councils.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CumulativeDoses {
    /// Week ending date.
    pub date: NaiveDate,
    /// First doses so far.
    pub first: u64,
    /// Second doses so far.
    pub second: u64,
    /// Booster doses so far.
    pub booster: u64,
}

/// Vaccination dataset accessor.
#[derive(Debug, Clone, Default)]
pub struct Vaccine {
    records: Vec<VaccinationRecord>,
    populations: HashMap<String, u64>,
}

impl Vaccine {
    /// Create an accessor over `records`.
    pub fn new(mut records: Vec<VaccinationRecord>, populations: &[PopulationRecord]) -> Self {
        records.sort_by(|a, b| a.date.cmp(&b.date));
        Self {
            records,
            populations: populations
                .iter()
                .map(|p| (p.location.clone(), p.population))
                .collect(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Doses per week, oldest first.
    pub fn vaccines_weekly(&self) -> Vec<WeeklyDoses> {
        let mut weeks: BTreeMap<NaiveDate, WeeklyDoses> = BTreeMap::new();
        for record in &self.records {
            let week = weeks.entry(record.date).or_insert_with(|| WeeklyDoses {
                week_ending: record.date,
                ..WeeklyDoses::default()
            });
            match record.dose {
                Dose::First => week.first += record.count,
                Dose::Second => week.second += record.count,
                Dose::Booster => week.booster += record.count,
            }
            week.total += record.count;
        }
        weeks.into_values().collect()
    }

    /// National uptake per dose.
    ///
    /// Uses each council's latest figure, weighted by population. When no
    /// reporting council has a known population the plain mean is used.
    pub fn percentage_vaccinated(&self) -> Vec<DoseUptake> {
        let latest = self.latest_by_council();

        Dose::iter()
            .filter_map(|dose| {
                let figures: Vec<(&str, Decimal)> = latest
                    .iter()
                    .filter(|((_, d), _)| *d == dose)
                    .map(|((council, _), pct)| (*council, *pct))
                    .collect();
                if figures.is_empty() {
                    return None;
                }

                let weighted: Vec<(Decimal, Decimal)> = figures
                    .iter()
                    .filter_map(|(council, pct)| {
                        let population = *self.populations.get(*council)?;
                        Some((*pct, Decimal::from(population)))
                    })
                    .collect();
                let total_population: Decimal = weighted.iter().map(|(_, p)| *p).sum();

                let percentage = if total_population > Decimal::ZERO {
                    weighted.iter().map(|(pct, p)| pct * p).sum::<Decimal>() / total_population
                } else {
                    figures.iter().map(|(_, pct)| *pct).sum::<Decimal>()
                        / Decimal::from(figures.len() as u64)
                };

                Some(DoseUptake {
                    dose,
                    percentage: percentage.round_dp(1),
                })
            })
            .collect()
    }

    /// Latest uptake per council, sorted by council.
    pub fn council_breakdown(&self) -> Vec<CouncilUptake> {
        let mut councils: BTreeMap<&str, CouncilUptake> = BTreeMap::new();
        for ((council, dose), pct) in self.latest_by_council() {
            let row = councils.entry(council).or_insert_with(|| CouncilUptake {
                council: council.to_string(),
                ..CouncilUptake::default()
            });
            match dose {
                Dose::First => row.first = Some(pct),
                Dose::Second => row.second = Some(pct),
                Dose::Booster => row.booster = Some(pct),
            }
        }
        councils.into_values().collect()
    }

    /// Cumulative doses per week, oldest first.
    pub fn vaccine_trend(&self) -> Vec<CumulativeDoses> {
        let mut running = CumulativeDoses::default();
        self.vaccines_weekly()
            .into_iter()
            .map(|week| {
                running.date = week.week_ending;
                running.first += week.first;
                running.second += week.second;
                running.booster += week.booster;
                running.clone()
            })
            .collect()
    }

    /// Most recent percentage per council and dose.
    fn latest_by_council(&self) -> HashMap<(&str, Dose), Decimal> {
        // Records are date-sorted, so later entries overwrite earlier ones.
        self.records
            .iter()
            .map(|r| ((r.council.as_str(), r.dose), r.percentage))
            .collect()
    }
}
