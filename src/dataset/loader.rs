//! CSV dataset loading.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::error::DatasetError;
use crate::stats::{Infections, Vaccine};

use super::records::{InfectionRecord, PopulationRecord, VaccinationRecord};

/// Infection records file name.
pub const INFECTIONS_FILE: &str = "infections.csv";
/// Vaccination records file name.
pub const VACCINATIONS_FILE: &str = "vaccinations.csv";
/// Population records file name.
pub const POPULATIONS_FILE: &str = "populations.csv";

/// All records backing the two accessors.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Infection records.
    pub infections: Vec<InfectionRecord>,
    /// Vaccination records.
    pub vaccinations: Vec<VaccinationRecord>,
    /// Population records.
    pub populations: Vec<PopulationRecord>,
}

impl Dataset {
    /// Load every dataset file from `dir`.
    ///
    /// The populations file is optional; without it prevalence and weighted
    /// uptake are unavailable.
    #[instrument(skip(dir), fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self, DatasetError> {
        let infections = read_csv_file(&dir.join(INFECTIONS_FILE))?;
        let vaccinations = read_csv_file(&dir.join(VACCINATIONS_FILE))?;

        let populations_path = dir.join(POPULATIONS_FILE);
        let populations = if populations_path.exists() {
            read_csv_file(&populations_path)?
        } else {
            warn!(
                "No population file at {}; prevalence will be empty",
                populations_path.display()
            );
            Vec::new()
        };

        let dataset = Self {
            infections,
            vaccinations,
            populations,
        };

        info!(
            infections = dataset.infections.len(),
            vaccinations = dataset.vaccinations.len(),
            populations = dataset.populations.len(),
            "Dataset loaded"
        );

        Ok(dataset)
    }

    /// Total number of records across all files.
    pub fn len(&self) -> usize {
        self.infections.len() + self.vaccinations.len() + self.populations.len()
    }

    /// Whether the dataset holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the two accessors, sharing the population table.
    pub fn into_accessors(self) -> (Infections, Vaccine) {
        let infections = Infections::new(self.infections, &self.populations);
        let vaccine = Vaccine::new(self.vaccinations, &self.populations);
        (infections, vaccine)
    }
}

/// Read every record of a CSV file with a header row.
pub fn read_csv_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| parse_error(path, source))?;

    collect_records(reader).map_err(|source| parse_error(path, source))
}

/// Read every record of CSV data held in memory or streamed.
pub fn read_csv<T: DeserializeOwned, R: Read>(data: R) -> Result<Vec<T>, DatasetError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    Ok(collect_records(reader)?)
}

fn collect_records<T: DeserializeOwned, R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<T>, csv::Error> {
    reader.deserialize().collect()
}

fn parse_error(path: &Path, source: csv::Error) -> DatasetError {
    DatasetError::Parse {
        path: PathBuf::from(path),
        source,
    }
}
