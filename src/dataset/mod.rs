//! Dataset module.
//!
//! This module handles:
//! - Record types read from CSV
//! - Loading the dataset directory
//! - Downloading fresh copies of the datasets
//! - A built-in sample dataset for demos and tests

pub mod fetch;
pub mod loader;
pub mod records;
pub mod sample;

pub use fetch::{fetch_datasets, http_client};
pub use loader::Dataset;
pub use records::{Dose, InfectionRecord, PopulationRecord, VaccinationRecord};
pub use sample::sample_dataset;
