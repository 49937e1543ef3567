//! Read-only statistics accessors.
//!
//! This module handles:
//! - Infection views (summary, trend, breakdown, locations, prevalence)
//! - Vaccination views (weekly doses, uptake, council breakdown, trend)
//! - Shared rate helpers

pub mod infections;
pub mod vaccine;

use rust_decimal::Decimal;

pub use infections::{
    CategoryShare, Infections, LocationCount, LocationDetail, LocationsView, Prevalence, Summary,
    TrendPoint, TrendQuery,
};
pub use vaccine::{CouncilUptake, CumulativeDoses, DoseUptake, Vaccine, WeeklyDoses};

/// `part` as a percentage of `total`, one decimal place.
pub fn percentage(part: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(1)
}

/// Rate per 100 000 residents, one decimal place. `None` for zero population.
pub fn per_100k(cases: u64, population: u64) -> Option<Decimal> {
    if population == 0 {
        return None;
    }
    Some((Decimal::from(cases) * Decimal::from(100_000u64) / Decimal::from(population)).round_dp(1))
}

/// Rows that can be ranked highest first, ties broken by name.
pub trait Ranked {
    /// Value to rank by.
    fn rank_key(&self) -> u64;
    /// Tie-breaking name.
    fn name(&self) -> &str;
}

/// Sort `rows` descending by key, then ascending by name.
pub fn rank<T: Ranked>(rows: &mut [T]) {
    rows.sort_by(|a, b| {
        b.rank_key()
            .cmp(&a.rank_key())
            .then_with(|| a.name().cmp(b.name()))
    });
}
