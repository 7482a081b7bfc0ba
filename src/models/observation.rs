use chrono::NaiveDate;

/// A single station reading ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    pub observation_datetime: String,
    pub air_temp: Option<f64>,
}

/// A station reading as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub location: String,
    pub observation_datetime: String,
    pub air_temp: Option<f64>,
    pub last_updated_at: String,
}

impl ObservationRecord {
    /// Returns the local calendar date of the observation, if it can be read
    ///
    pub fn observation_date(&self) -> Option<NaiveDate> {
        observation_date(&self.observation_datetime)
    }
}

/// Reads the local calendar date from the leading part of a composite observation datetime.
///
/// The feed's local date time is given as `YYYYMMDDhhmmss`, and it is followed directly by
/// the UTC time in the same format. An ISO (`YYYY-MM-DD`) leading date is also accepted in
/// case the feed switches to ISO timestamps. Anything else gives None.
///
/// # Arguments
///
/// * 'observation_datetime' - the composite datetime string as stored
pub fn observation_date(observation_datetime: &str) -> Option<NaiveDate> {
    if let Some(compact) = observation_datetime.get(0..8) {
        if compact.bytes().all(|b| b.is_ascii_digit()) {
            return NaiveDate::parse_from_str(compact, "%Y%m%d").ok();
        }
    }

    // ISO fallback, the current feed never takes this branch
    observation_datetime.get(0..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}
