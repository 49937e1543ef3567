//! Prometheus metrics for request tracking and dataset monitoring.
//!
//! This module provides metrics for:
//! - HTTP request latency and counts per matched route
//! - Dataset load and download latency
//! - Records loaded per dataset

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::dataset::Dataset;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Dataset load latency metric name.
pub const METRIC_DATASET_LOAD_LATENCY: &str = "dataset_load_latency_ms";
/// Dataset download latency metric name.
pub const METRIC_DATASET_FETCH_LATENCY: &str = "dataset_fetch_latency_ms";
/// Records loaded gauge metric name.
pub const METRIC_DATASET_RECORDS: &str = "dataset_records";

/// Install the global Prometheus recorder and describe all metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_DATASET_LOAD_LATENCY,
        "Time to load the CSV datasets in milliseconds"
    );
    describe_histogram!(
        METRIC_DATASET_FETCH_LATENCY,
        "Time to download one dataset in milliseconds"
    );

    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests");

    describe_gauge!(METRIC_DATASET_RECORDS, "Records loaded per dataset");

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment the request counter for a route and status.
pub fn inc_http_requests(endpoint: &str, status: u16) {
    counter!(
        METRIC_HTTP_REQUESTS,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record how many records each dataset holds.
pub fn record_dataset_sizes(dataset: &Dataset) {
    gauge!(METRIC_DATASET_RECORDS, "dataset" => "infections").set(dataset.infections.len() as f64);
    gauge!(METRIC_DATASET_RECORDS, "dataset" => "vaccinations")
        .set(dataset.vaccinations.len() as f64);
    gauge!(METRIC_DATASET_RECORDS, "dataset" => "populations").set(dataset.populations.len() as f64);
}

/// Middleware recording latency and count per matched route.
///
/// Install with `route_layer`. Requests without a matched route pass
/// through unrecorded, which keeps arbitrary paths out of the label set.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let Some(endpoint) = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
    else {
        return next.run(request).await;
    };

    let response = next.run(request).await;

    record_http_latency(start, &endpoint);
    inc_http_requests(&endpoint, response.status().as_u16());
    response
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for dataset loading.
pub fn timer_dataset_load() -> LatencyTimer {
    LatencyTimer::new(METRIC_DATASET_LOAD_LATENCY)
}

/// Create a latency timer for a dataset download.
pub fn timer_dataset_fetch() -> LatencyTimer {
    LatencyTimer::new(METRIC_DATASET_FETCH_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("test_metric");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 9.0);
    }

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_http_latency(Instant::now(), "/api/ping");
        inc_http_requests("/api/ping", 200);
        record_dataset_sizes(&Dataset::default());
    }

    #[tokio::test]
    async fn track_requests_passes_unmatched_through() {
        use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
        use tower::ServiceExt;

        // As an outer layer the middleware also sees requests no route matched.
        let app = Router::new()
            .route("/api/ping", get(|| async { "Ok" }))
            .layer(middleware::from_fn(track_requests));

        let matched = app
            .clone()
            .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(matched.status(), StatusCode::OK);

        let unmatched = app
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(unmatched.status(), StatusCode::NOT_FOUND);
    }
}
