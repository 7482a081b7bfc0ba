use std::path::Path;
use log::info;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::{load_config, Config, General};
use crate::errors::InitError;
use crate::ingestion::Ingestion;
use crate::manager_bulletin::BoMBulletin;
use crate::manager_observations::BoMObservations;
use crate::repository::Repository;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} - {l} - {m}{n}";

/// Everything needed for one ingestion run
pub struct Mgr {
    pub ingestion: Ingestion<BoMBulletin, BoMObservations>,
    pub repo: Repository,
}

/// Loads configuration, sets up logging and returns the ingestion pipeline with its store
///
/// # Arguments
///
/// * 'config_file' - path to the configuration file
pub fn init(config_file: &str) -> Result<Mgr, InitError> {
    let config = load_config(config_file)?;
    setup_logger(&config.general)?;

    info!("bomwatch version: {}", env!("CARGO_PKG_VERSION"));

    init_with_config(&config)
}

/// Instantiates fetchers, store and pipeline from configuration
///
/// # Arguments
///
/// * 'config' - the loaded configuration
pub fn init_with_config(config: &Config) -> Result<Mgr, InitError> {
    let bulletin = BoMBulletin::new(&config.bulletin)?;
    let observations = BoMObservations::new(&config.observations);

    let repo = Repository::open(Path::new(&config.database.db_path), &config.observations.location)?;

    let ingestion = Ingestion::new(
        bulletin,
        observations,
        &config.observations.location,
        config.database.retention_days,
    );

    Ok(Mgr { ingestion, repo })
}

/// Installs a log4rs logger writing to the configured log file and optionally to stdout
///
/// # Arguments
///
/// * 'general' - general configuration holding log path, level and stdout flag
pub fn setup_logger(general: &General) -> Result<(), InitError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&general.log_path)?;

    let mut builder = log4rs::config::Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let log_config = builder.build(root.build(general.log_level))?;
    log4rs::init_config(log_config)?;

    Ok(())
}
