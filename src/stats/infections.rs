//! Read-only views over infection records.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dataset::records::{InfectionRecord, PopulationRecord};
use crate::error::QueryError;

use super::{per_100k, percentage, Ranked};

/// Days in a reporting window.
pub const WINDOW_DAYS: u64 = 7;

/// Headline figures for the overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Most recent reporting date.
    pub latest_date: Option<NaiveDate>,
    /// Cases across the whole dataset.
    pub total_cases: u64,
    /// Cases on the latest date.
    pub new_cases: u64,
    /// Cases in the seven days ending at the latest date.
    pub last_7_days: u64,
    /// Cases in the seven days before that.
    pub previous_7_days: u64,
    /// Percentage change between the two windows.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub weekly_change: Option<Decimal>,
    /// Number of distinct locations.
    pub locations: usize,
}

/// Filters accepted by [`Infections::trend`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrendQuery {
    /// First date to include.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Last date to include.
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Restrict to a single location.
    #[serde(default)]
    pub location: Option<String>,
}

/// One day of the case trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Reporting date.
    pub date: NaiveDate,
    /// Cases on that date.
    pub cases: u64,
    /// Trailing seven-day mean.
    #[serde(with = "rust_decimal::serde::float")]
    pub average: Decimal,
}

/// Cases in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// Category name.
    pub category: String,
    /// Cases in the category.
    pub cases: u64,
    /// Share of all cases.
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

/// Case count for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    /// Location name.
    pub location: String,
    /// Cases.
    pub cases: u64,
}

/// Full per-location figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDetail {
    /// Location name.
    pub location: String,
    /// Cases across the whole dataset.
    pub total_cases: u64,
    /// Cases on the latest date.
    pub new_cases: u64,
    /// Residents, when known.
    pub population: Option<u64>,
    /// Total cases per 100 000 residents, when population is known.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub per_100k: Option<Decimal>,
}

/// Result of [`Infections::locations`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocationsView {
    /// Location names only.
    Names(Vec<String>),
    /// Full figures per location.
    Full(Vec<LocationDetail>),
}

/// Recent case rate for a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prevalence {
    /// Location name.
    pub location: String,
    /// Cases in the last seven days.
    pub cases: u64,
    /// Residents.
    pub population: u64,
    /// Cases in the last seven days per 100 000 residents.
    #[serde(with = "rust_decimal::serde::float")]
    pub per_100k: Decimal,
}

/// Infection dataset accessor.
#[derive(Debug, Clone, Default)]
pub struct Infections {
    records: Vec<InfectionRecord>,
    populations: HashMap<String, u64>,
}

impl Infections {
    /// Create an accessor over `records`.
    pub fn new(mut records: Vec<InfectionRecord>, populations: &[PopulationRecord]) -> Self {
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

    /// Most recent reporting date.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Headline figures.
    pub fn summary(&self) -> Summary {
        let latest_date = self.latest_date();
        let total_cases = self.records.iter().map(|r| r.cases).sum();

        let (new_cases, last_7_days, previous_7_days) = match latest_date {
            Some(latest) => {
                let current = window_start(latest);
                let previous = current.pred_opt().map_or(0, |previous_end| {
                    self.cases_between(window_start(previous_end), previous_end)
                });
                (
                    self.cases_between(latest, latest),
                    self.cases_between(current, latest),
                    previous,
                )
            }
            None => (0, 0, 0),
        };

        let weekly_change = (previous_7_days > 0).then(|| {
            let diff = Decimal::from(last_7_days) - Decimal::from(previous_7_days);
            (diff * Decimal::ONE_HUNDRED / Decimal::from(previous_7_days)).round_dp(1)
        });

        Summary {
            latest_date,
            total_cases,
            new_cases,
            last_7_days,
            previous_7_days,
            weekly_change,
            locations: self.location_names().len(),
        }
    }

    /// Daily case series, optionally filtered by date range and location.
    pub fn trend(&self, query: &TrendQuery) -> Result<Vec<TrendPoint>, QueryError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(QueryError::InvalidRange { from, to });
            }
        }

        if let Some(location) = &query.location {
            if !self.records.iter().any(|r| &r.location == location) {
                return Err(QueryError::UnknownLocation(location.clone()));
            }
        }

        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for record in &self.records {
            if query.location.as_ref().is_some_and(|l| l != &record.location) {
                continue;
            }
            *daily.entry(record.date).or_default() += record.cases;
        }

        // Averages look back across the whole series, not just the range.
        let series: Vec<(NaiveDate, u64)> = daily.into_iter().collect();
        let window = WINDOW_DAYS as usize;
        let points = series
            .iter()
            .enumerate()
            .filter(|(_, (date, _))| {
                query.from.map_or(true, |from| *date >= from)
                    && query.to.map_or(true, |to| *date <= to)
            })
            .map(|(idx, (date, cases))| {
                let start = (idx + 1).saturating_sub(window);
                let trailing = &series[start..=idx];
                let sum: u64 = trailing.iter().map(|(_, c)| c).sum();
                TrendPoint {
                    date: *date,
                    cases: *cases,
                    average: (Decimal::from(sum) / Decimal::from(trailing.len() as u64)).round_dp(1),
                }
            })
            .collect();

        Ok(points)
    }

    /// Cases per category with their share of the total.
    pub fn breakdown(&self) -> Vec<CategoryShare> {
        let mut by_category: BTreeMap<&str, u64> = BTreeMap::new();
        for record in &self.records {
            *by_category.entry(record.category.as_str()).or_default() += record.cases;
        }

        let total: u64 = by_category.values().sum();
        by_category
            .into_iter()
            .map(|(category, cases)| CategoryShare {
                category: category.to_string(),
                cases,
                percentage: percentage(cases, total),
            })
            .collect()
    }

    /// Location names, or full per-location figures when `full` is set.
    pub fn locations(&self, full: bool) -> LocationsView {
        if !full {
            return LocationsView::Names(self.location_names());
        }

        let totals = self.totals_by_location(None);
        let new = self.latest_by_location();

        LocationsView::Full(
            totals
                .into_iter()
                .map(|(location, total_cases)| {
                    let population = self.populations.get(location).copied();
                    LocationDetail {
                        location: location.to_string(),
                        total_cases,
                        new_cases: new.get(location).copied().unwrap_or(0),
                        population,
                        per_100k: population.and_then(|p| per_100k(total_cases, p)),
                    }
                })
                .collect(),
        )
    }

    /// Cumulative cases per location, highest first.
    pub fn locations_total(&self) -> Vec<LocationCount> {
        rank_counts(self.totals_by_location(None))
    }

    /// Cases on the latest date per location, highest first.
    pub fn locations_new(&self) -> Vec<LocationCount> {
        rank_counts(self.latest_by_location())
    }

    /// Seven-day case rate per 100 000 residents, highest first.
    ///
    /// Every reporting location with a known population is ranked, including
    /// those with no cases in the window. Locations without a population are
    /// left out.
    pub fn prevalence(&self) -> Vec<Prevalence> {
        let Some(latest) = self.latest_date() else {
            return Vec::new();
        };
        let recent = self.totals_by_location(Some(window_start(latest)));

        let mut rows: Vec<Prevalence> = self
            .location_names()
            .into_iter()
            .filter_map(|location| {
                let population = *self.populations.get(&location)?;
                let cases = recent.get(location.as_str()).copied().unwrap_or(0);
                Some(Prevalence {
                    cases,
                    population,
                    per_100k: per_100k(cases, population)?,
                    location,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.per_100k
                .cmp(&a.per_100k)
                .then_with(|| a.location.cmp(&b.location))
        });
        rows
    }

    /// Latest reporting date rendered with a strftime-style format.
    ///
    /// Returns `Ok(None)` for an empty dataset. Formats that do not parse, or
    /// that ask for fields a date does not have (such as `%H`), are errors.
    pub fn last_updated(&self, format: &str) -> Result<Option<String>, QueryError> {
        let invalid = || QueryError::InvalidDateFormat(format.to_string());

        let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(invalid());
        }

        let Some(date) = self.latest_date() else {
            return Ok(None);
        };
        let mut out = String::new();
        write!(out, "{}", date.format_with_items(items.iter())).map_err(|_| invalid())?;
        Ok(Some(out))
    }

    fn location_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .map(|r| r.location.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn cases_between(&self, from: NaiveDate, to: NaiveDate) -> u64 {
        self.records
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .map(|r| r.cases)
            .sum()
    }

    fn totals_by_location(&self, since: Option<NaiveDate>) -> BTreeMap<&str, u64> {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for record in &self.records {
            if since.is_some_and(|since| record.date < since) {
                continue;
            }
            *totals.entry(record.location.as_str()).or_default() += record.cases;
        }
        totals
    }

    fn latest_by_location(&self) -> BTreeMap<&str, u64> {
        match self.latest_date() {
            Some(latest) => {
                let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
                for record in self.records.iter().filter(|r| r.date == latest) {
                    *counts.entry(record.location.as_str()).or_default() += record.cases;
                }
                counts
            }
            None => BTreeMap::new(),
        }
    }
}

impl Ranked for LocationCount {
    fn rank_key(&self) -> u64 {
        self.cases
    }

    fn name(&self) -> &str {
        &self.location
    }
}

fn rank_counts(counts: BTreeMap<&str, u64>) -> Vec<LocationCount> {
    let mut rows: Vec<LocationCount> = counts
        .into_iter()
        .map(|(location, cases)| LocationCount {
            location: location.to_string(),
            cases,
        })
        .collect();
    super::rank(&mut rows);
    rows
}

/// First day of the seven-day window ending at `end`.
fn window_start(end: NaiveDate) -> NaiveDate {
    end.checked_sub_days(Days::new(WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn record(day: u32, location: &str, category: &str, cases: u64) -> InfectionRecord {
        InfectionRecord {
            date: date(day),
            location: location.to_string(),
            category: category.to_string(),
            cases,
        }
    }

    fn populations() -> Vec<PopulationRecord> {
        vec![
            PopulationRecord {
                location: "Fife".to_string(),
                population: 200_000,
            },
            PopulationRecord {
                location: "Highland".to_string(),
                population: 100_000,
            },
        ]
    }

    /// Fourteen days; Fife 10/day, Highland 5/day in week one and 10/day
    /// in week two. Orkney has no population.
    fn fixture() -> Infections {
        let mut records = Vec::new();
        for day in 1..=14 {
            records.push(record(day, "Fife", "0-19", 4));
            records.push(record(day, "Fife", "20-39", 6));
            records.push(record(day, "Highland", "0-19", if day <= 7 { 5 } else { 10 }));
        }
        records.push(record(14, "Orkney", "60+", 2));
        // Unsorted input must be handled.
        records.reverse();
        Infections::new(records, &populations())
    }

    #[test]
    fn summary_windows() {
        let summary = fixture().summary();

        assert_eq!(summary.latest_date, Some(date(14)));
        assert_eq!(summary.total_cases, 14 * 10 + 7 * 5 + 7 * 10 + 2);
        assert_eq!(summary.new_cases, 22);
        assert_eq!(summary.last_7_days, 7 * 20 + 2);
        assert_eq!(summary.previous_7_days, 7 * 15);
        assert_eq!(summary.weekly_change, Some(dec!(35.2)));
        assert_eq!(summary.locations, 3);
    }

    #[test]
    fn summary_of_empty_dataset() {
        let summary = Infections::default().summary();

        assert_eq!(summary.latest_date, None);
        assert_eq!(summary.total_cases, 0);
        assert_eq!(summary.weekly_change, None);
    }

    #[test]
    fn trend_full_series_with_average() {
        let trend = fixture().trend(&TrendQuery::default()).unwrap();

        assert_eq!(trend.len(), 14);
        assert_eq!(trend[0].cases, 15);
        assert_eq!(trend[0].average, dec!(15));
        assert_eq!(trend[7].cases, 20);
        // Days 2..=8: six days of 15 and one of 20.
        assert_eq!(trend[7].average, dec!(15.7));
        assert_eq!(trend[13].cases, 22);
    }

    #[test]
    fn trend_filters_by_range_and_location() {
        let query = TrendQuery {
            from: Some(date(8)),
            to: Some(date(9)),
            location: Some("Highland".to_string()),
        };
        let trend = fixture().trend(&query).unwrap();

        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, date(8));
        assert_eq!(trend[0].cases, 10);
        // Average still looks back before the range: 6 x 5 + 10.
        assert_eq!(trend[0].average, dec!(5.7));
    }

    #[test]
    fn trend_rejects_bad_queries() {
        let infections = fixture();

        let inverted = TrendQuery {
            from: Some(date(9)),
            to: Some(date(8)),
            location: None,
        };
        assert_eq!(
            infections.trend(&inverted),
            Err(QueryError::InvalidRange {
                from: date(9),
                to: date(8)
            })
        );

        let unknown = TrendQuery {
            location: Some("Atlantis".to_string()),
            ..TrendQuery::default()
        };
        assert!(matches!(
            infections.trend(&unknown),
            Err(QueryError::UnknownLocation(_))
        ));
    }

    #[test]
    fn breakdown_shares() {
        let breakdown = fixture().breakdown();
        let categories: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();

        assert_eq!(categories, vec!["0-19", "20-39", "60+"]);
        let total: u64 = breakdown.iter().map(|c| c.cases).sum();
        assert_eq!(total, fixture().summary().total_cases);
        assert_eq!(breakdown[2].cases, 2);
        assert_eq!(breakdown[1].percentage, dec!(34.0));
    }

    #[test]
    fn locations_names_and_full() {
        let infections = fixture();

        assert_eq!(
            infections.locations(false),
            LocationsView::Names(vec![
                "Fife".to_string(),
                "Highland".to_string(),
                "Orkney".to_string()
            ])
        );

        let LocationsView::Full(details) = infections.locations(true) else {
            panic!("expected full view");
        };
        assert_eq!(details.len(), 3);
        assert_eq!(details[0].total_cases, 140);
        assert_eq!(details[0].new_cases, 10);
        assert_eq!(details[0].per_100k, Some(dec!(70)));
        assert_eq!(details[2].population, None);
        assert_eq!(details[2].per_100k, None);
    }

    #[test]
    fn locations_ranked() {
        let infections = fixture();
        let total = infections.locations_total();
        let new = infections.locations_new();

        assert_eq!(total[0].location, "Fife");
        assert_eq!(total[1].location, "Highland");
        assert_eq!(total[2].cases, 2);
        // Ties broken by name.
        assert_eq!(new[0].location, "Fife");
        assert_eq!(new[0].cases, 10);
        assert_eq!(new[1].location, "Highland");
    }

    #[test]
    fn prevalence_ranks_by_rate() {
        let prevalence = fixture().prevalence();

        assert_eq!(prevalence.len(), 2);
        assert_eq!(prevalence[0].location, "Highland");
        assert_eq!(prevalence[0].cases, 70);
        assert_eq!(prevalence[0].per_100k, dec!(70));
        assert_eq!(prevalence[1].per_100k, dec!(35));
    }

    #[test]
    fn last_updated_formats() {
        let infections = fixture();

        assert_eq!(
            infections.last_updated("%d %B %Y").unwrap(),
            Some("14 January 2021".to_string())
        );
        assert!(infections.last_updated("%Q").is_err());
        assert_eq!(Infections::default().last_updated("%Y").unwrap(), None);
    }

    #[test]
    fn last_updated_rejects_time_fields() {
        let infections = Infections::new(vec![record(1, "Fife", "0-19", 1)], &[]);

        assert_eq!(
            infections.last_updated("%H:%M"),
            Err(QueryError::InvalidDateFormat("%H:%M".to_string()))
        );
        assert!(infections.last_updated("%d %B %Y, %H:%M").is_err());
    }

    #[test]
    fn prevalence_keeps_quiet_locations() {
        let populations = vec![
            PopulationRecord {
                location: "Fife".to_string(),
                population: 100_000,
            },
            PopulationRecord {
                location: "Orkney".to_string(),
                population: 20_000,
            },
        ];
        let records = vec![record(1, "Orkney", "60+", 5), record(28, "Fife", "0-19", 10)];
        let prevalence = Infections::new(records, &populations).prevalence();

        assert_eq!(prevalence.len(), 2);
        assert_eq!(prevalence[0].location, "Fife");
        assert_eq!(prevalence[0].per_100k, dec!(10));
        assert_eq!(prevalence[1].location, "Orkney");
        assert_eq!(prevalence[1].cases, 0);
        assert_eq!(prevalence[1].population, 20_000);
        assert_eq!(prevalence[1].per_100k, Decimal::ZERO);
    }
}
