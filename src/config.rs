use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Database {
    pub db_path: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

#[derive(Deserialize)]
pub struct Bulletin {
    #[serde(default = "default_ftp_host")]
    pub ftp_host: String,
    #[serde(default = "default_ftp_port")]
    pub ftp_port: u16,
    #[serde(default = "default_ftp_dir")]
    pub ftp_dir: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

#[derive(Deserialize)]
pub struct Observations {
    #[serde(default = "default_observation_url")]
    pub url: String,
    #[serde(default = "default_observation_location")]
    pub location: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    pub database: Database,
    pub bulletin: Bulletin,
    pub observations: Observations,
}

fn default_retention_days() -> u32 { 14 }
fn default_ftp_host() -> String { "ftp.bom.gov.au".to_string() }
fn default_ftp_port() -> u16 { 21 }
fn default_ftp_dir() -> String { "/anon/gen/fwo/".to_string() }
fn default_file_name() -> String { "IDT16710.txt".to_string() }
fn default_observation_url() -> String { "http://www.bom.gov.au/fwo/IDT60801/IDT60801.94951.json".to_string() }
fn default_observation_location() -> String { "Dunalley (Henry anson)".to_string() }
fn default_timeout_secs() -> u64 { 15 }
fn default_user_agent() -> String { format!("bomwatch/{}", env!("CARGO_PKG_VERSION")) }

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)?;
    parse_config(&toml)
}

/// Parses and validates configuration given as a TOML string
///
/// # Arguments
///
/// * 'toml' - the configuration document
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml)?;

    if config.observations.location.trim().is_empty() {
        return Err(ConfigError::from("observations.location must not be empty"));
    }
    if config.observations.timeout_secs == 0 {
        return Err(ConfigError::from("observations.timeout_secs must be greater than zero"));
    }

    Ok(config)
}
