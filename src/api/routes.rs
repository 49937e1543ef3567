//! HTTP route definitions.

use axum::{http::Method, middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::metrics::track_requests;

use super::handlers::{self, AppState};
use super::pages;

/// Create the full router: pages, JSON API and metrics.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/vaccine", get(pages::vaccine))
        .route("/locations", get(pages::locations))
        .merge(api_router())
        // Operational
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON API routes, readable cross-origin.
fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/ping", get(handlers::ping))
        // Infections
        .route("/api/infections/trend", get(handlers::infections_trend))
        .route("/api/infections/breakdown", get(handlers::infections_breakdown))
        .route("/api/infections/locations", get(handlers::infections_locations))
        // Vaccines
        .route("/api/vaccines/breakdown", get(handlers::vaccines_breakdown))
        .route("/api/vaccines/council", get(handlers::vaccines_council))
        .route("/api/vaccines/trend", get(handlers::vaccines_trend))
        .route("/api/prevalence", get(handlers::prevalence))
        // Older flat paths
        .route("/api/trend", get(handlers::infections_trend))
        .route("/api/breakdown", get(handlers::infections_breakdown))
        .route("/api/locations/total", get(handlers::locations_total))
        .route("/api/locations/new", get(handlers::locations_new))
        .route("/api/vaccines/weekly", get(handlers::vaccines_weekly))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
}
