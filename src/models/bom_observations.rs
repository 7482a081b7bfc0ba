use serde::Deserialize;
use serde_json::Value;

/// Top level of the observation JSON document
#[derive(Deserialize)]
pub struct ObservationFeed {
    #[serde(default)]
    pub observations: ObservationBlock,
}

/// Entries are kept as raw JSON so that a single malformed entry can be dropped
/// without losing the rest of the feed
#[derive(Deserialize, Default)]
pub struct ObservationBlock {
    #[serde(default)]
    pub data: Vec<Value>,
}

/// The fields of a station reading that are of interest
#[derive(Deserialize, Debug)]
pub struct RawObservationEntry {
    #[serde(default)]
    pub local_date_time_full: Option<Value>,
    #[serde(default)]
    pub aifstime_utc: Option<Value>,
    #[serde(default)]
    pub air_temp: Option<Value>,
}
