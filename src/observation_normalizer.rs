use log::{debug, info, warn};
use serde_json::Value;
use crate::errors::MalformedEntry;
use crate::models::bom_observations::RawObservationEntry;
use crate::models::observation::Observation;

/// Outcome of normalizing a single feed entry
enum Normalized {
    Reading(Observation),
    NoTemperature,
}

/// Turns raw station readings into observations for the configured location.
///
/// Entries without air temperature are skipped silently, since sensor gaps are expected.
/// Malformed entries are dropped one by one and logged, the rest of the batch is kept.
///
/// # Arguments
///
/// * 'entries' - raw entries from the observation feed
/// * 'location' - the single observation site the feed belongs to
pub fn normalize_observations(entries: &[Value], location: &str) -> Vec<Observation> {
    let mut observations: Vec<Observation> = Vec::with_capacity(entries.len());
    let mut dropped: usize = 0;
    let mut skipped: usize = 0;

    for (i, entry) in entries.iter().enumerate() {
        match normalize_entry(entry, location) {
            Ok(Normalized::Reading(o)) => observations.push(o),
            Ok(Normalized::NoTemperature) => skipped += 1,
            Err(e) => {
                warn!("Dropping observation entry {}: {}", i, e);
                dropped += 1;
            },
        }
    }

    if skipped > 0 {
        debug!("Skipped {} observation entries without air temperature.", skipped);
    }
    info!("Normalized {} observation records ({} dropped).", observations.len(), dropped);

    observations
}

/// Normalizes one entry
///
/// # Arguments
///
/// * 'entry' - the raw JSON entry
/// * 'location' - the observation site
fn normalize_entry(entry: &Value, location: &str) -> Result<Normalized, MalformedEntry> {
    if !entry.is_object() {
        return Err(MalformedEntry::NotAnObject);
    }
    let raw: RawObservationEntry = serde_json::from_value(entry.clone())
        .map_err(|_| MalformedEntry::NotAnObject)?;

    let air_temp = match raw.air_temp {
        None | Some(Value::Null) => return Ok(Normalized::NoTemperature),
        Some(v) => temperature(&v)?,
    };

    let local = datetime_part(raw.local_date_time_full, "local_date_time_full")?;
    let utc = datetime_part(raw.aifstime_utc, "aifstime_utc")?;

    Ok(Normalized::Reading(Observation {
        location: location.to_string(),
        observation_datetime: format!("{}{}", local, utc),
        air_temp: Some(air_temp),
    }))
}

/// Returns a datetime field verbatim, so that the composite key stays stable between runs
///
/// # Arguments
///
/// * 'value' - the field value, if present
/// * 'name' - field name used in error reporting
fn datetime_part(value: Option<Value>, name: &'static str) -> Result<String, MalformedEntry> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        None | Some(Value::Null) => Err(MalformedEntry::MissingField(name)),
        Some(v) => Err(MalformedEntry::BadField(name, v.to_string())),
    }
}

/// Converts an air temperature given either as a JSON number or a numeric string
///
/// # Arguments
///
/// * 'value' - the air temperature value
fn temperature(value: &Value) -> Result<f64, MalformedEntry> {
    let t = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    t.filter(|t| t.is_finite())
        .ok_or_else(|| MalformedEntry::BadTemperature(value.to_string()))
}
