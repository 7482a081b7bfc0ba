use std::env;
use anyhow::{Context, Result};
use bomwatch::initialization::init;
use log::error;

fn main() -> Result<()> {
    let config_file = env::var("CONFIG_FILE").unwrap_or("config.toml".to_string());

    let mut mgr = init(&config_file)
        .with_context(|| format!("initialization from {} failed", config_file))?;

    match mgr.ingestion.run_once(&mut mgr.repo) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Ingestion aborted: {}", e);
            Err(e).context("ingestion aborted on storage error")
        },
    }
}
