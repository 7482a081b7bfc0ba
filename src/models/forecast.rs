use chrono::NaiveDate;

/// A maximum temperature forecast for one location and day as read from a bulletin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub location: String,
    pub forecast_date: NaiveDate,
    pub max_temp: Option<i32>,
}

/// A forecast as persisted, i.e. together with the time it was last written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRecord {
    pub location: String,
    pub forecast_date: NaiveDate,
    pub max_temp: Option<i32>,
    pub last_updated_at: String,
}
