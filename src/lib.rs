//! Scottish COVID-19 statistics service.
//!
//! Serves infection and vaccination figures as server-rendered HTML pages
//! and a small JSON API. Datasets are CSV files loaded once at startup and
//! exposed through two read-only accessors.
//!
//! ```text
//! GET /api/prevalence?limit=3
//! [{"location":"Glasgow City","cases":...,"population":635640,"per_100k":...}, ...]
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`dataset`]: CSV records, loading, downloads and sample data
//! - [`stats`]: The `Infections` and `Vaccine` accessors
//! - [`api`]: HTTP pages, JSON endpoints and routing
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod stats;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
