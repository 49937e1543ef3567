//! Integration tests for the statistics service.
//!
//! These drive the full router against the built-in sample dataset and
//! against CSV files written to a scratch directory.
//!
//! Run with: cargo test --test integration

use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use scovid19::api::{create_router, AppState};
use scovid19::dataset::sample::SAMPLE_COUNCILS;
use scovid19::dataset::{sample_dataset, Dataset};

fn sample_app() -> Router {
    create_router(AppState::from_dataset(sample_dataset()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let (status, _, body) = get_with_type(app, uri).await;
    (status, body)
}

async fn get_with_type(app: Router, uri: &str) -> (StatusCode, String, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Assert a JSON error response and return its message.
async fn get_error(app: Router, uri: &str) -> String {
    let (status, content_type, body) = get_with_type(app, uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", uri, body);
    assert_eq!(content_type, "application/json", "{}", uri);
    let error: Value = serde_json::from_str(&body).unwrap();
    error["error"].as_str().unwrap().to_string()
}

async fn get_json(app: Router, uri: &str) -> Value {
    let (status, body) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK, "{} -> {}", uri, body);
    serde_json::from_str(&body).unwrap()
}

/// Write a small dataset to a fresh directory.
fn write_fixture(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scovid19-it-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    std::fs::write(
        dir.join("infections.csv"),
        "date,location,category,cases\n\
         2021-02-01,Fife,0-19,10\n\
         2021-02-01,Highland,0-19,30\n\
         2021-02-02,Fife,20-39,20\n\
         2021-02-02,Highland,20-39,5\n\
         2021-02-02,Orkney Islands,60+,1\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("vaccinations.csv"),
        "date,council,dose,count,percentage\n\
         2021-01-31,Fife,First,1000,2.5\n\
         2021-01-31,Highland,First,500,3.5\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("populations.csv"),
        "location,population\nFife,100000\nHighland,100000\n",
    )
    .unwrap();

    dir
}

#[tokio::test]
async fn ping_always_ok() {
    let (status, body) = get(sample_app(), "/api/ping").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Ok");

    let (status, body) = get(create_router(AppState::from_dataset(Dataset::default())), "/api/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Ok");
}

#[tokio::test]
async fn prevalence_respects_limit() {
    let all = get_json(sample_app(), "/api/prevalence").await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), SAMPLE_COUNCILS.len());

    for limit in [0usize, 1, 3, 50] {
        let limited = get_json(sample_app(), &format!("/api/prevalence?limit={}", limit)).await;
        let limited = limited.as_array().unwrap();
        assert!(limited.len() <= limit);
        assert_eq!(limited.len(), limit.min(all.len()));
        assert_eq!(limited[..], all[..limited.len()]);
    }
}

#[tokio::test]
async fn prevalence_rejects_malformed_limit() {
    for uri in ["/api/prevalence?limit=ten", "/api/prevalence?limit=-1"] {
        let message = get_error(sample_app(), uri).await;
        assert!(message.contains("query string"), "{} -> {}", uri, message);
    }
}

#[tokio::test]
async fn prevalence_is_sorted_descending() {
    let rows = get_json(sample_app(), "/api/prevalence").await;
    let rates: Vec<f64> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["per_100k"].as_f64().unwrap())
        .collect();

    assert!(rates.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn pages_render_for_sample() {
    for uri in ["/", "/vaccine", "/locations"] {
        let (status, body) = get(sample_app(), uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(body.contains("COVID-19 in Scotland"), "{}", uri);
    }

    let (_, vaccine) = get(sample_app(), "/vaccine").await;
    assert!(vaccine.contains("first dose"));
    assert!(vaccine.contains("Weekly doses"));
}

#[tokio::test]
async fn pages_render_for_empty_dataset() {
    let app = create_router(AppState::from_dataset(Dataset::default()));

    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Last updated"));
}

#[tokio::test]
async fn trend_endpoint_filters_and_validates() {
    let rows = get_json(
        sample_app(),
        "/api/infections/trend?from=2021-03-10&to=2021-03-12&location=Fife",
    )
    .await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["date"], "2021-03-10");

    let message = get_error(
        sample_app(),
        "/api/infections/trend?from=2021-03-12&to=2021-03-10",
    )
    .await;
    assert!(message.contains("invalid date range"));

    let message = get_error(sample_app(), "/api/infections/trend?location=Atlantis").await;
    assert!(message.contains("Atlantis"));

    let message = get_error(sample_app(), "/api/infections/trend?from=yesterday").await;
    assert!(message.contains("query string"), "{}", message);
}

#[tokio::test]
async fn locations_full_flag() {
    let names = get_json(sample_app(), "/api/infections/locations").await;
    assert!(names.as_array().unwrap().iter().all(Value::is_string));

    let names = get_json(sample_app(), "/api/infections/locations?full=false").await;
    assert!(names[0].is_string());

    let full = get_json(sample_app(), "/api/infections/locations?full=true").await;
    let first = &full.as_array().unwrap()[0];
    assert!(first["total_cases"].is_u64());
    assert!(first["new_cases"].is_u64());
}

#[tokio::test]
async fn dataset_directory_round_trip() {
    let dir = write_fixture("roundtrip");
    let app = create_router(AppState::from_dataset(Dataset::load(&dir).unwrap()));

    let total = get_json(app.clone(), "/api/locations/total").await;
    assert_eq!(total[0]["location"], "Highland");
    assert_eq!(total[0]["cases"], 35);

    let new = get_json(app.clone(), "/api/locations/new").await;
    assert_eq!(new[0]["location"], "Fife");
    assert_eq!(new[0]["cases"], 20);

    // Orkney Islands has no population and is left out.
    let prevalence = get_json(app.clone(), "/api/prevalence").await;
    assert_eq!(prevalence.as_array().unwrap().len(), 2);

    let uptake = get_json(app.clone(), "/api/vaccines/breakdown").await;
    assert_eq!(uptake[0]["dose"], "first");
    assert_eq!(uptake[0]["percentage"], 3.0);

    let council = get_json(app.clone(), "/api/vaccines/council").await;
    assert_eq!(council[0]["council"], "Fife");
    assert_eq!(council[0]["first"], 2.5);
    assert!(council[0]["second"].is_null());

    let weekly = get_json(app.clone(), "/api/vaccines/weekly").await;
    assert_eq!(weekly[0]["total"], 1500);

    let trend = get_json(app.clone(), "/api/vaccines/trend").await;
    assert_eq!(trend[0]["first"], 1500);

    let breakdown = get_json(app, "/api/infections/breakdown").await;
    assert_eq!(breakdown.as_array().unwrap().len(), 3);

    std::fs::remove_dir_all(&dir).ok();
}
