pub mod errors;

use std::time::Duration;
use log::{info, warn};
use serde_json::Value;
use ureq::Agent;
use crate::config::Observations;
use crate::ingestion::ObservationFetcher;
use crate::manager_observations::errors::ObservationError;
use crate::models::bom_observations::ObservationFeed;

/// Struct for retrieving the latest station readings from the BoM JSON feed
pub struct BoMObservations {
    agent: Agent,
    url: String,
    user_agent: String,
}

impl BoMObservations {
    /// Returns a new instance of the BoMObservations struct
    ///
    /// # Arguments
    ///
    /// * 'config' - observation feed configuration, the timeout applies to the whole request
    pub fn new(config: &Observations) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        let agent = agent_config.into();

        Self { agent, url: config.url.to_string(), user_agent: config.user_agent.to_string() }
    }

    /// Fetches the feed and returns the raw entries of its observations.data array
    ///
    fn download(&self) -> Result<Vec<Value>, ObservationError> {
        info!("Fetching observations from {}", self.url);

        let json = self.agent
            .get(&self.url)
            .header("User-Agent", &self.user_agent)
            .call()?
            .body_mut()
            .read_to_string()?;

        let entries = entries_from_json(&json)?;
        if entries.is_empty() {
            warn!("No observation data found in JSON response.");
        } else {
            info!("Fetched {} observation entries.", entries.len());
        }

        Ok(entries)
    }
}

impl ObservationFetcher for BoMObservations {
    type Error = ObservationError;

    fn fetch(&self) -> Result<Vec<Value>, ObservationError> {
        self.download()
    }
}

/// Extracts the observations.data array from a feed document. A document without the
/// array gives an empty list
///
/// # Arguments
///
/// * 'json' - the feed document
pub fn entries_from_json(json: &str) -> Result<Vec<Value>, ObservationError> {
    let feed: ObservationFeed = serde_json::from_str(json)?;
    Ok(feed.observations.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_data_array_is_extracted() {
        let json = r#"{"observations": {"notice": [], "header": [{"name": "Dunalley"}],
            "data": [{"air_temp": 12.3}, {"air_temp": null}, "odd"]}}"#;
        let entries = entries_from_json(json).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn missing_array_gives_empty_list() {
        assert!(entries_from_json("{}").unwrap().is_empty());
        assert!(entries_from_json(r#"{"observations": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn invalid_document_is_an_error() {
        assert!(matches!(entries_from_json("<html>"), Err(ObservationError::Document(_))));
        assert!(matches!(entries_from_json(r#"{"observations": {"data": 5}}"#), Err(ObservationError::Document(_))));
    }
}
