//! HTML page handlers.

use axum::extract::State;

use crate::stats::LocationsView;

use super::handlers::AppState;
use super::render::{LocationsPage, OverviewPage, VaccinePage};
use super::response::PageResult;

/// Date format shown in the page header.
pub const LAST_UPDATED_FORMAT: &str = "%d %B %Y";

/// Infection overview.
pub async fn index(State(state): State<AppState>) -> PageResult<OverviewPage> {
    let summary = state.infections.summary();
    let last_updated = state.infections.last_updated(LAST_UPDATED_FORMAT)?;

    Ok(OverviewPage::new(&summary, last_updated))
}

/// Vaccination figures.
pub async fn vaccine(State(state): State<AppState>) -> PageResult<VaccinePage> {
    let weekly = state.vaccines.vaccines_weekly();
    let uptake = state.vaccines.percentage_vaccinated();
    let last_updated = state.infections.last_updated(LAST_UPDATED_FORMAT)?;

    Ok(VaccinePage::new(&weekly, &uptake, last_updated))
}

/// Per-location table.
pub async fn locations(State(state): State<AppState>) -> PageResult<LocationsPage> {
    let details = match state.infections.locations(true) {
        LocationsView::Full(details) => details,
        LocationsView::Names(_) => Vec::new(),
    };
    let last_updated = state.infections.last_updated(LAST_UPDATED_FORMAT)?;

    Ok(LocationsPage::new(&details, last_updated))
}
