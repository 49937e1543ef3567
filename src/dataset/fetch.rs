//! Dataset downloads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{AppError, DatasetError};

use super::loader::{read_csv, INFECTIONS_FILE, POPULATIONS_FILE, VACCINATIONS_FILE};
use super::records::{InfectionRecord, PopulationRecord, VaccinationRecord};

/// Build the HTTP client used for downloads.
pub fn http_client() -> Result<reqwest::Client, AppError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("scovid19/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Download every configured dataset into the data directory.
///
/// Returns the paths written. Sources without a URL are skipped.
pub async fn fetch_datasets(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Vec<PathBuf>, AppError> {
    let dir = config.data_dir();
    tokio::fs::create_dir_all(&dir).await?;

    let mut written = Vec::new();

    match config.infections_url.as_deref() {
        Some(url) => {
            written.push(fetch_one::<InfectionRecord>(client, url, &dir, INFECTIONS_FILE).await?)
        }
        None => warn!("INFECTIONS_URL not set, skipping infections"),
    }
    match config.vaccinations_url.as_deref() {
        Some(url) => written
            .push(fetch_one::<VaccinationRecord>(client, url, &dir, VACCINATIONS_FILE).await?),
        None => warn!("VACCINATIONS_URL not set, skipping vaccinations"),
    }
    match config.populations_url.as_deref() {
        Some(url) => {
            written.push(fetch_one::<PopulationRecord>(client, url, &dir, POPULATIONS_FILE).await?)
        }
        None => warn!("POPULATIONS_URL not set, skipping populations"),
    }

    Ok(written)
}

/// Download one CSV, check it parses as `T`, then replace the local copy.
#[instrument(skip(client, dir))]
async fn fetch_one<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, AppError> {
    let _timer = crate::metrics::timer_dataset_fetch();
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let rows = validate_download::<T>(file_name, &body)?;

    // Write beside the target first so a failed write keeps the old file.
    let target = dir.join(file_name);
    let partial = dir.join(format!("{}.part", file_name));
    tokio::fs::write(&partial, body.as_bytes()).await?;
    tokio::fs::rename(&partial, &target).await?;

    info!(rows, path = %target.display(), "Dataset downloaded");
    Ok(target)
}

/// Parse a downloaded body, rejecting empty or malformed files.
pub fn validate_download<T: DeserializeOwned>(
    name: &str,
    body: &str,
) -> Result<usize, DatasetError> {
    let records: Vec<T> = read_csv(body.as_bytes()).map_err(|e| DatasetError::InvalidDownload {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    if records.is_empty() {
        return Err(DatasetError::InvalidDownload {
            name: name.to_string(),
            reason: "no records".to_string(),
        });
    }

    Ok(records.len())
}
