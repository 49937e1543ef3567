//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Paths ===
    /// Project root; logs are written under `logs/` here.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Directory holding the CSV datasets (defaults to `PROJECT_ROOT/data`).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    // === Server Configuration ===
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit JSON log lines on stdout.
    #[serde(default)]
    pub log_json: bool,

    /// Also append logs to `PROJECT_ROOT/logs/app.log`.
    #[serde(default = "default_true")]
    pub log_to_file: bool,

    // === Dataset Sources ===
    /// Download URL for the infections CSV.
    #[serde(default)]
    pub infections_url: Option<String>,

    /// Download URL for the vaccinations CSV.
    #[serde(default)]
    pub vaccinations_url: Option<String>,

    /// Download URL for the populations CSV.
    #[serde(default)]
    pub populations_url: Option<String>,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            data_dir: None,
            host: default_host(),
            port: default_port(),
            rust_log: default_log_level(),
            log_json: false,
            log_to_file: true,
            infections_url: None,
            vaccinations_url: None,
            populations_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("HOST must not be empty".to_string());
        }

        for (name, url) in self.sources() {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(format!("{} must be an http(s) URL", name));
                }
            }
        }

        Ok(())
    }

    /// Effective dataset directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.project_root.join("data"))
    }

    /// Log file path, if file logging is enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_to_file
            .then(|| self.project_root.join("logs").join("app.log"))
    }

    /// Configured download sources keyed by environment variable name.
    pub fn sources(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("INFECTIONS_URL", self.infections_url.as_deref()),
            ("VACCINATIONS_URL", self.vaccinations_url.as_deref()),
            ("POPULATIONS_URL", self.populations_url.as_deref()),
        ]
    }
}
