use std::fmt;
use std::fmt::Formatter;
use chrono::NaiveDate;
use crate::models::forecast::ForecastRecord;
use crate::models::observation::ObservationRecord;

/// Forecast and observations for one location and date
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub location: String,
    pub date: NaiveDate,
    pub forecast: Option<ForecastRecord>,
    pub observations: Vec<ObservationRecord>,
}

impl ComparisonResult {
    /// Forecasted maximum temperature, if there is a forecast holding a value
    ///
    pub fn forecast_max(&self) -> Option<i32> {
        self.forecast.as_ref().and_then(|f| f.max_temp)
    }

    /// Highest observed air temperature of the day. Derived on every call, never stored
    ///
    pub fn observed_max(&self) -> Option<f64> {
        self.observations
            .iter()
            .filter_map(|o| o.air_temp)
            .fold(None, |max: Option<f64>, t| Some(max.map_or(t, |m| m.max(t))))
    }

    /// Observed maximum minus forecasted maximum
    ///
    pub fn deviation(&self) -> Option<f64> {
        Some(self.observed_max()? - self.forecast_max()? as f64)
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Comparison for {} on {}", self.location, self.date.format("%A, %d %B %Y"))?;

        match self.forecast_max() {
            Some(t) => writeln!(f, "Forecasted Max Temperature: {} °C", t)?,
            None => writeln!(f, "No forecast data available for this location and date.")?,
        }

        match self.observed_max() {
            Some(t) => write!(f, "Highest Observed Temperature: {:.1} °C ({} readings)", t, self.observations.len()),
            None => write!(f, "No observation data available for this location and date."),
        }
    }
}
