use std::fmt;
use std::fmt::Formatter;
use log::{error, info, warn};
use serde_json::Value;
use crate::bulletin_parser::parse_forecasts;
use crate::errors::{ParseFailure, StorageError};
use crate::observation_normalizer::normalize_observations;
use crate::repository::{CleanupReport, Repository};

/// Source of the raw forecast bulletin text
pub trait BulletinFetcher {
    type Error: fmt::Display;

    fn fetch(&self) -> Result<String, Self::Error>;
}

/// Source of the raw station reading entries
pub trait ObservationFetcher {
    type Error: fmt::Display;

    fn fetch(&self) -> Result<Vec<Value>, Self::Error>;
}

/// Outcome of one fetch and store stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Stored(usize),
    NoData,
    FetchFailed(String),
    ParseFailed(ParseFailure),
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            StageOutcome::Stored(n) => write!(f, "stored {} records", n),
            StageOutcome::NoData => write!(f, "no data"),
            StageOutcome::FetchFailed(e) => write!(f, "fetch failed ({})", e),
            StageOutcome::ParseFailed(e) => write!(f, "parse failed ({})", e),
        }
    }
}

/// What a single ingestion run did
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub forecasts: StageOutcome,
    pub observations: StageOutcome,
    pub cleanup: CleanupReport,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "forecasts: {}, observations: {}, purged: {} forecasts / {} observations",
               self.forecasts, self.observations, self.cleanup.forecasts, self.cleanup.observations)
    }
}

/// Runs the fetch, parse and store pipeline once
pub struct Ingestion<B: BulletinFetcher, O: ObservationFetcher> {
    bulletin: B,
    observations: O,
    observation_site: String,
    retention_days: u32,
}

impl<B: BulletinFetcher, O: ObservationFetcher> Ingestion<B, O> {
    /// Returns a new Ingestion ready to run
    ///
    /// # Arguments
    ///
    /// * 'bulletin' - fetcher for the forecast bulletin
    /// * 'observations' - fetcher for the observation feed
    /// * 'observation_site' - location that the observation feed belongs to
    /// * 'retention_days' - days to keep stored data
    pub fn new(bulletin: B, observations: O, observation_site: &str, retention_days: u32) -> Self {
        Self { bulletin, observations, observation_site: observation_site.to_string(), retention_days }
    }

    /// Ensures the schema, stores forecasts and observations and purges old data.
    ///
    /// The forecast and observation stages are independent, a failed fetch or parse in one
    /// of them is logged and the run carries on. A storage error ends the run.
    ///
    /// # Arguments
    ///
    /// * 'repo' - the store to write to
    pub fn run_once(&self, repo: &mut Repository) -> Result<IngestReport, StorageError> {
        repo.init_schema()?;

        let forecasts = self.forecast_stage(repo)?;
        info!("Forecast stage: {}", forecasts);

        let observations = self.observation_stage(repo)?;
        info!("Observation stage: {}", observations);

        let cleanup = repo.cleanup_old_data(self.retention_days)?;

        let report = IngestReport { forecasts, observations, cleanup };
        info!("Data fetch and update process complete: {}", report);

        Ok(report)
    }

    /// Fetches, parses and upserts the bulletin
    ///
    /// # Arguments
    ///
    /// * 'repo' - the store to write to
    fn forecast_stage(&self, repo: &mut Repository) -> Result<StageOutcome, StorageError> {
        let text = match self.bulletin.fetch() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to fetch forecast bulletin: {}", e);
                return Ok(StageOutcome::FetchFailed(e.to_string()));
            },
        };

        let forecasts = match parse_forecasts(&text) {
            Ok(forecasts) => forecasts,
            Err(e) => {
                error!("Could not parse forecast bulletin: {}", e);
                return Ok(StageOutcome::ParseFailed(e));
            },
        };

        if forecasts.is_empty() {
            warn!("Bulletin held no forecasts.");
            return Ok(StageOutcome::NoData);
        }

        Ok(StageOutcome::Stored(repo.upsert_forecasts(&forecasts)?))
    }

    /// Fetches, normalizes and inserts station readings
    ///
    /// # Arguments
    ///
    /// * 'repo' - the store to write to
    fn observation_stage(&self, repo: &mut Repository) -> Result<StageOutcome, StorageError> {
        let entries = match self.observations.fetch() {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to fetch observations: {}", e);
                return Ok(StageOutcome::FetchFailed(e.to_string()));
            },
        };

        let observations = normalize_observations(&entries, &self.observation_site);
        if observations.is_empty() {
            return Ok(StageOutcome::NoData);
        }

        Ok(StageOutcome::Stored(repo.insert_observations(&observations)?))
    }
}
