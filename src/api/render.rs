//! Page templates.
//!
//! Pages extend `templates/base.html`, which draws the tab bar from each
//! page's `tab` field. Charts are drawn client-side from the JSON API;
//! elements carry a `data-source` attribute naming the endpoint to read.
//! Values are formatted here and escaped by askama.

use askama::Template;
use askama_web::WebTemplate;
use axum::http::StatusCode;
use rust_decimal::Decimal;

use crate::stats::{DoseUptake, LocationDetail, Summary, WeeklyDoses};

/// Top-level navigation tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Infection overview.
    Overview,
    /// Vaccination figures.
    Vaccine,
    /// Per-location table.
    Locations,
}

/// A headline figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub label: String,
    pub value: String,
}

impl Card {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One row of the weekly doses table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRow {
    pub week_ending: String,
    pub first: String,
    pub second: String,
    pub booster: String,
    pub total: String,
}

/// One row of the locations table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRow {
    pub location: String,
    pub total_cases: String,
    pub new_cases: String,
    pub per_100k: String,
}

/// Infection overview page.
#[derive(Debug, Template, WebTemplate)]
#[template(path = "overview.html")]
pub struct OverviewPage {
    pub tab: Option<Tab>,
    pub last_updated: Option<String>,
    pub cards: Vec<Card>,
}

impl OverviewPage {
    pub fn new(summary: &Summary, last_updated: Option<String>) -> Self {
        let change = summary
            .weekly_change
            .map(|c| {
                let sign = if c > Decimal::ZERO { "+" } else { "" };
                format!("{}{}", sign, percent(c))
            })
            .unwrap_or_else(|| "n/a".to_string());

        Self {
            tab: Some(Tab::Overview),
            last_updated,
            cards: vec![
                Card::new("Total cases", thousands(summary.total_cases)),
                Card::new("New cases", thousands(summary.new_cases)),
                Card::new("Last 7 days", thousands(summary.last_7_days)),
                Card::new("Change on previous week", change),
                Card::new("Locations reporting", summary.locations.to_string()),
            ],
        }
    }
}

/// Vaccination page.
#[derive(Debug, Template, WebTemplate)]
#[template(path = "vaccine.html")]
pub struct VaccinePage {
    pub tab: Option<Tab>,
    pub last_updated: Option<String>,
    pub cards: Vec<Card>,
    /// Most recent week first.
    pub weeks: Vec<WeekRow>,
}

impl VaccinePage {
    pub fn new(weekly: &[WeeklyDoses], uptake: &[DoseUptake], last_updated: Option<String>) -> Self {
        Self {
            tab: Some(Tab::Vaccine),
            last_updated,
            cards: uptake
                .iter()
                .map(|dose| Card::new(format!("{} dose", dose.dose), percent(dose.percentage)))
                .collect(),
            weeks: weekly
                .iter()
                .rev()
                .map(|week| WeekRow {
                    week_ending: week.week_ending.format("%d %b %Y").to_string(),
                    first: thousands(week.first),
                    second: thousands(week.second),
                    booster: thousands(week.booster),
                    total: thousands(week.total),
                })
                .collect(),
        }
    }
}

/// Per-location page.
#[derive(Debug, Template, WebTemplate)]
#[template(path = "locations.html")]
pub struct LocationsPage {
    pub tab: Option<Tab>,
    pub last_updated: Option<String>,
    pub rows: Vec<LocationRow>,
}

impl LocationsPage {
    pub fn new(details: &[LocationDetail], last_updated: Option<String>) -> Self {
        Self {
            tab: Some(Tab::Locations),
            last_updated,
            rows: details
                .iter()
                .map(|row| LocationRow {
                    location: row.location.clone(),
                    total_cases: thousands(row.total_cases),
                    new_cases: thousands(row.new_cases),
                    per_100k: row
                        .per_100k
                        .map(|rate| rate.normalize().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect(),
        }
    }
}

/// Error page. No tab is active.
#[derive(Debug, Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub tab: Option<Tab>,
    pub last_updated: Option<String>,
    pub status: String,
    pub message: String,
}

impl ErrorPage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            tab: None,
            last_updated: None,
            status: status.to_string(),
            message: message.into(),
        }
    }
}

/// Format a count with thousands separators.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}
