//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;

use crate::dataset::Dataset;
use crate::stats::{
    CategoryShare, CouncilUptake, CumulativeDoses, DoseUptake, Infections, LocationCount,
    LocationsView, Prevalence, TrendPoint, TrendQuery, Vaccine, WeeklyDoses,
};

use super::response::ApiResult;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Infection accessor.
    pub infections: Arc<Infections>,
    /// Vaccination accessor.
    pub vaccines: Arc<Vaccine>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(infections: Infections, vaccines: Vaccine) -> Self {
        Self {
            infections: Arc::new(infections),
            vaccines: Arc::new(vaccines),
            metrics: None,
        }
    }

    /// Build state from a loaded dataset.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let (infections, vaccines) = dataset.into_accessors();
        Self::new(infections, vaccines)
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("infections", &self.infections.len())
            .field("vaccines", &self.vaccines.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Query parameters for `/api/infections/locations`.
#[derive(Debug, Default, Deserialize)]
pub struct LocationsParams {
    /// Boolean-ish flag selecting the full view.
    #[serde(default)]
    pub full: Option<String>,
}

/// Query parameters for `/api/prevalence`.
#[derive(Debug, Default, Deserialize)]
pub struct PrevalenceParams {
    /// Maximum number of rows; all rows when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Interpret a boolean-ish query value.
///
/// Empty, `0`, `false`, `no` and `off` are false; any other value is true.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// Liveness check.
pub async fn ping() -> &'static str {
    "Ok"
}

/// Daily case trend.
pub async fn infections_trend(
    State(state): State<AppState>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> ApiResult<Vec<TrendPoint>> {
    let Query(query) = query?;
    Ok(Json(state.infections.trend(&query)?))
}

/// Cases by category.
pub async fn infections_breakdown(State(state): State<AppState>) -> Json<Vec<CategoryShare>> {
    Json(state.infections.breakdown())
}

/// Location names, or full per-location figures with `?full=1`.
pub async fn infections_locations(
    State(state): State<AppState>,
    params: Result<Query<LocationsParams>, QueryRejection>,
) -> ApiResult<LocationsView> {
    let Query(params) = params?;
    let full = params.full.as_deref().is_some_and(is_truthy);
    Ok(Json(state.infections.locations(full)))
}

/// Cumulative cases per location.
pub async fn locations_total(State(state): State<AppState>) -> Json<Vec<LocationCount>> {
    Json(state.infections.locations_total())
}

/// Latest day's cases per location.
pub async fn locations_new(State(state): State<AppState>) -> Json<Vec<LocationCount>> {
    Json(state.infections.locations_new())
}

/// Prevalence ranking, truncated to `?limit=`.
pub async fn prevalence(
    State(state): State<AppState>,
    params: Result<Query<PrevalenceParams>, QueryRejection>,
) -> ApiResult<Vec<Prevalence>> {
    let Query(params) = params?;
    let mut rows = state.infections.prevalence();
    if let Some(limit) = params.limit {
        rows.truncate(limit);
    }
    Ok(Json(rows))
}

/// Doses per week.
pub async fn vaccines_weekly(State(state): State<AppState>) -> Json<Vec<WeeklyDoses>> {
    Json(state.vaccines.vaccines_weekly())
}

/// National uptake per dose.
pub async fn vaccines_breakdown(State(state): State<AppState>) -> Json<Vec<DoseUptake>> {
    Json(state.vaccines.percentage_vaccinated())
}

/// Uptake per council.
pub async fn vaccines_council(State(state): State<AppState>) -> Json<Vec<CouncilUptake>> {
    Json(state.vaccines.council_breakdown())
}

/// Cumulative doses over time.
pub async fn vaccines_trend(State(state): State<AppState>) -> Json<Vec<CumulativeDoses>> {
    Json(state.vaccines.vaccine_trend())
}

/// Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
