use std::fmt;
use std::fmt::Formatter;
use thiserror::Error;
use crate::manager_bulletin::errors::BulletinError;

/// Error depicting errors that occur while loading the configuration file
///
#[derive(Error, Debug)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}

/// Error depicting errors that occur while initializing logging, storage and fetchers
///
#[derive(Error, Debug)]
#[error("InitError: {0}")]
pub struct InitError(pub String);
impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self { InitError(e.to_string()) }
}
impl From<StorageError> for InitError {
    fn from(e: StorageError) -> Self { InitError(e.to_string()) }
}
impl From<BulletinError> for InitError {
    fn from(e: BulletinError) -> Self { InitError(e.to_string()) }
}
impl From<std::io::Error> for InitError {
    fn from(e: std::io::Error) -> Self { InitError(format!("log file error: {}", e)) }
}
impl From<log4rs::config::runtime::ConfigErrors> for InitError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { InitError(format!("log config error: {}", e)) }
}
impl From<log::SetLoggerError> for InitError {
    fn from(e: log::SetLoggerError) -> Self { InitError(format!("logger already set: {}", e)) }
}

/// Faults in the backing store. These are never retried and abort an ingestion run
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("StorageError::Sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("StorageError::Io: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a bulletin yields no forecasts at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("ParseFailure::MissingIssueDate: no 'Issued at ... on <Weekday> <Day> <Month> <Year>' line found")]
    MissingIssueDate,
    #[error("ParseFailure::InvalidIssueDate: {0}")]
    InvalidIssueDate(String),
}

/// Reasons a single observation entry is dropped
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedEntry {
    NotAnObject,
    MissingField(&'static str),
    BadField(&'static str, String),
    BadTemperature(String),
}

impl fmt::Display for MalformedEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MalformedEntry::NotAnObject => write!(f, "MalformedEntry::NotAnObject"),
            MalformedEntry::MissingField(name) => write!(f, "MalformedEntry::MissingField: {}", name),
            MalformedEntry::BadField(name, value) => write!(f, "MalformedEntry::BadField: {} = {}", name, value),
            MalformedEntry::BadTemperature(value) => write!(f, "MalformedEntry::BadTemperature: {}", value),
        }
    }
}

/// Errors returned to the presentation shell from comparison queries
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("QueryError::InvalidDate: '{0}' is not a YYYY-MM-DD date")]
    InvalidDate(String),
    #[error("QueryError::Storage: {0}")]
    Storage(#[from] StorageError),
}
