//! Forecast versus observation store for Bureau of Meteorology data.
//!
//! Ingests the Tasmanian text forecast bulletin and the JSON feed of a single observation
//! station, keeps per-location, per-day records in SQLite and answers comparison queries
//! for a location and date.

pub mod bulletin_parser;
pub mod comparison;
pub mod config;
pub mod errors;
pub mod ingestion;
pub mod initialization;
pub mod manager_bulletin;
pub mod manager_observations;
pub mod models;
pub mod observation_normalizer;
pub mod repository;

pub use comparison::ComparisonService;
pub use errors::{ParseFailure, QueryError, StorageError};
pub use ingestion::{BulletinFetcher, IngestReport, Ingestion, ObservationFetcher, StageOutcome};
pub use models::comparison::ComparisonResult;
pub use repository::Repository;
