use chrono::NaiveDate;
use crate::errors::QueryError;
use crate::models::comparison::ComparisonResult;
use crate::repository::Repository;

/// Read-only queries for the presentation layer
pub struct ComparisonService<'a> {
    repo: &'a Repository,
}

impl<'a> ComparisonService<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Locations that can be compared, always including the observation site
    ///
    pub fn available_locations(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.repo.get_available_locations()?)
    }

    /// Forecast and observations for a location on a date given as `YYYY-MM-DD`.
    ///
    /// Missing data is not an error, the result then holds no forecast and/or no observations.
    ///
    /// # Arguments
    ///
    /// * 'location' - location name as listed by available_locations
    /// * 'date_iso' - ISO-8601 calendar date
    pub fn compare(&self, location: &str, date_iso: &str) -> Result<ComparisonResult, QueryError> {
        let date = NaiveDate::parse_from_str(date_iso, "%Y-%m-%d")
            .map_err(|_| QueryError::InvalidDate(date_iso.to_string()))?;

        let (forecast, observations) = self.repo.get_comparison_data(location, date)?;

        Ok(ComparisonResult {
            location: location.to_string(),
            date,
            forecast,
            observations,
        })
    }
}
