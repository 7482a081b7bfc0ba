//! SQLite store for forecasts and observations.
//!
//! Forecasts are keyed by (location, forecast_date) and upserted, observations are
//! append-only. Both carry `last_updated_at`, which is used only for retention.

use std::path::Path;
use chrono::{DateTime, Days, NaiveDate, SecondsFormat, Utc};
use log::info;
use rusqlite::{params, Connection};
use crate::errors::StorageError;
use crate::models::forecast::{Forecast, ForecastRecord};
use crate::models::observation::{Observation, ObservationRecord};

pub type Result<T> = std::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS forecasts (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        location        TEXT NOT NULL,
        forecast_date   TEXT NOT NULL,
        max_temp        INTEGER,
        last_updated_at TEXT NOT NULL,
        UNIQUE(location, forecast_date)
    );

    CREATE TABLE IF NOT EXISTS observations (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        location             TEXT NOT NULL,
        observation_datetime TEXT NOT NULL,
        air_temp             REAL,
        last_updated_at      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_obs_location ON observations(location);";

/// Number of rows removed by a retention purge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub forecasts: usize,
    pub observations: usize,
}

/// SQLite-backed weather store
pub struct Repository {
    conn: Connection,
    observation_site: String,
}

impl Repository {
    /// Open (or create) the database at the given path.
    ///
    /// The schema is not created here, see [`Repository::init_schema`].
    ///
    /// # Arguments
    ///
    /// * 'path' - path to the database file
    /// * 'observation_site' - the observation location that is always offered as available
    pub fn open(path: &Path, observation_site: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        Ok(Self { conn, observation_site: observation_site.to_string() })
    }

    /// Creates the tables if they don't exist
    ///
    pub fn init_schema(&self) -> Result<()> {
        info!("Initialising database...");
        self.conn.execute_batch(SCHEMA)?;
        info!("Database initialised.");
        Ok(())
    }

    /// Inserts forecasts, or on (location, forecast_date) conflict overwrites max_temp and
    /// last_updated_at. The batch is committed as a whole or not at all.
    ///
    /// # Arguments
    ///
    /// * 'forecasts' - the forecasts to write
    pub fn upsert_forecasts(&mut self, forecasts: &[Forecast]) -> Result<usize> {
        self.upsert_forecasts_at(forecasts, Utc::now())
    }

    /// Same as [`Repository::upsert_forecasts`] with an explicit write time
    ///
    /// # Arguments
    ///
    /// * 'forecasts' - the forecasts to write
    /// * 'now' - timestamp stored as last_updated_at
    pub fn upsert_forecasts_at(&mut self, forecasts: &[Forecast], now: DateTime<Utc>) -> Result<usize> {
        if forecasts.is_empty() {
            info!("No forecast data to upsert.");
            return Ok(0);
        }

        info!("Upserting {} forecast records.", forecasts.len());
        let timestamp = iso8601(now);

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO forecasts (location, forecast_date, max_temp, last_updated_at) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(location, forecast_date) DO UPDATE SET \
                    max_temp = excluded.max_temp, \
                    last_updated_at = excluded.last_updated_at",
            )?;
            for f in forecasts {
                stmt.execute(params![f.location, f.forecast_date, f.max_temp, timestamp])?;
            }
        }
        tx.commit()?;

        Ok(forecasts.len())
    }

    /// Appends observations as one batch
    ///
    /// # Arguments
    ///
    /// * 'observations' - the observations to write
    pub fn insert_observations(&mut self, observations: &[Observation]) -> Result<usize> {
        self.insert_observations_at(observations, Utc::now())
    }

    /// Same as [`Repository::insert_observations`] with an explicit write time
    ///
    /// # Arguments
    ///
    /// * 'observations' - the observations to write
    /// * 'now' - timestamp stored as last_updated_at
    pub fn insert_observations_at(&mut self, observations: &[Observation], now: DateTime<Utc>) -> Result<usize> {
        if observations.is_empty() {
            info!("No observation data to insert.");
            return Ok(0);
        }

        info!("Inserting {} observation records.", observations.len());
        let timestamp = iso8601(now);

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO observations (location, observation_datetime, air_temp, last_updated_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for o in observations {
                stmt.execute(params![o.location, o.observation_datetime, o.air_temp, timestamp])?;
            }
        }
        tx.commit()?;

        Ok(observations.len())
    }

    /// Returns the forecast for the location and date, if any, together with all observations
    /// for the location whose local calendar date is the given date, in insertion order.
    ///
    /// # Arguments
    ///
    /// * 'location' - location as stored, case-sensitive
    /// * 'date' - the calendar date to compare
    pub fn get_comparison_data(&self, location: &str, date: NaiveDate)
        -> Result<(Option<ForecastRecord>, Vec<ObservationRecord>)> {
        info!("Fetching comparison data for {} on {}", location, date);

        let mut stmt = self.conn.prepare(
            "SELECT location, forecast_date, max_temp, last_updated_at \
             FROM forecasts WHERE location = ?1 AND forecast_date = ?2",
        )?;
        let mut rows = stmt.query_map(params![location, date], |row| {
            Ok(ForecastRecord {
                location: row.get(0)?,
                forecast_date: row.get(1)?,
                max_temp: row.get(2)?,
                last_updated_at: row.get(3)?,
            })
        })?;
        let forecast = rows.next().transpose()?;

        let mut stmt = self.conn.prepare(
            "SELECT location, observation_datetime, air_temp, last_updated_at \
             FROM observations WHERE location = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![location], |row| {
            Ok(ObservationRecord {
                location: row.get(0)?,
                observation_datetime: row.get(1)?,
                air_temp: row.get(2)?,
                last_updated_at: row.get(3)?,
            })
        })?;

        let mut observations = Vec::new();
        for row in rows {
            let record = row?;
            if record.observation_date() == Some(date) {
                observations.push(record);
            }
        }

        Ok((forecast, observations))
    }

    /// Distinct forecast locations in lexicographic order. The observation site is always
    /// included, also when it has no forecasts.
    ///
    pub fn get_available_locations(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT location FROM forecasts ORDER BY location ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut locations = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        if !locations.contains(&self.observation_site) {
            locations.push(self.observation_site.clone());
            locations.sort();
        }

        Ok(locations)
    }

    /// Deletes forecasts and observations last written before today minus retention days
    ///
    /// # Arguments
    ///
    /// * 'retention_days' - number of days to keep
    pub fn cleanup_old_data(&mut self, retention_days: u32) -> Result<CleanupReport> {
        self.cleanup_old_data_at(retention_days, Utc::now().date_naive())
    }

    /// Same as [`Repository::cleanup_old_data`] with an explicit current date
    ///
    /// # Arguments
    ///
    /// * 'retention_days' - number of days to keep
    /// * 'today' - the current UTC date
    pub fn cleanup_old_data_at(&mut self, retention_days: u32, today: NaiveDate) -> Result<CleanupReport> {
        info!("Cleaning up old data (older than {} days)...", retention_days);
        let cutoff = today
            .checked_sub_days(Days::new(retention_days as u64))
            .unwrap_or(NaiveDate::MIN);

        let tx = self.conn.transaction()?;
        let forecasts = tx.execute(
            "DELETE FROM forecasts WHERE date(last_updated_at) < ?1",
            params![cutoff],
        )?;
        let observations = tx.execute(
            "DELETE FROM observations WHERE date(last_updated_at) < ?1",
            params![cutoff],
        )?;
        tx.commit()?;

        info!("Deleted {} old forecast records.", forecasts);
        info!("Deleted {} old observation records.", observations);

        Ok(CleanupReport { forecasts, observations })
    }
}

/// Formats a UTC timestamp as ISO-8601 with a trailing Z
fn iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tempfile::tempdir;

    const SITE: &str = "Dunalley (Henry anson)";

    /// Helper: create an in-tempdir Repository with schema.
    /// Returns (Repository, TempDir) so the tempdir stays alive.
    fn test_repo() -> (Repository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let repo = Repository::open(&dir.path().join("weather.db"), SITE).unwrap();
        repo.init_schema().unwrap();
        (repo, dir)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn forecast(location: &str, d: NaiveDate, max_temp: i32) -> Forecast {
        Forecast { location: location.into(), forecast_date: d, max_temp: Some(max_temp) }
    }

    fn observation(datetime: &str, air_temp: f64) -> Observation {
        Observation { location: SITE.into(), observation_datetime: datetime.into(), air_temp: Some(air_temp) }
    }

    fn count(repo: &Repository, table: &str) -> i64 {
        repo.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn init_schema_twice_idempotent() {
        let (repo, _dir) = test_repo();
        repo.init_schema().unwrap();
        assert_eq!(count(&repo, "forecasts"), 0);
        assert_eq!(count(&repo, "observations"), 0);
    }

    #[test]
    fn upsert_replaces_existing_forecast() {
        let (mut repo, _dir) = test_repo();
        let d = date(2021, 1, 1);

        repo.upsert_forecasts(&[forecast("Hobart", d, 28)]).unwrap();
        repo.upsert_forecasts(&[forecast("Hobart", d, 31)]).unwrap();

        assert_eq!(count(&repo, "forecasts"), 1);
        let (f, _) = repo.get_comparison_data("Hobart", d).unwrap();
        assert_eq!(f.unwrap().max_temp, Some(31));
    }

    #[test]
    fn upsert_is_keyed_on_location_and_date() {
        let (mut repo, _dir) = test_repo();
        repo.upsert_forecasts(&[
            forecast("Hobart", date(2021, 1, 1), 28),
            forecast("Hobart", date(2021, 1, 2), 25),
            forecast("hobart", date(2021, 1, 1), 20),
        ]).unwrap();

        assert_eq!(count(&repo, "forecasts"), 3);
    }

    #[test]
    fn failed_batch_leaves_store_unchanged() {
        let (mut repo, _dir) = test_repo();
        let d = date(2021, 1, 1);
        repo.upsert_forecasts(&[forecast("Hobart", d, 28)]).unwrap();

        repo.conn
            .execute_batch(
                "CREATE TRIGGER reject_launceston BEFORE INSERT ON forecasts \
                 WHEN NEW.location = 'Launceston' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = repo.upsert_forecasts(&[forecast("Hobart", d, 35), forecast("Launceston", d, 30)]);
        assert!(result.is_err());

        let (f, _) = repo.get_comparison_data("Hobart", d).unwrap();
        assert_eq!(f.unwrap().max_temp, Some(28));
        assert_eq!(count(&repo, "forecasts"), 1);
    }

    #[test]
    fn empty_batches_are_no_ops() {
        let (mut repo, _dir) = test_repo();
        assert_eq!(repo.upsert_forecasts(&[]).unwrap(), 0);
        assert_eq!(repo.insert_observations(&[]).unwrap(), 0);
    }

    #[test]
    fn observations_are_appended() {
        let (mut repo, _dir) = test_repo();
        let batch = [observation("2021010112000020210101010000", 20.0)];
        repo.insert_observations(&batch).unwrap();
        repo.insert_observations(&batch).unwrap();
        assert_eq!(count(&repo, "observations"), 2);
    }

    #[test]
    fn comparison_filters_observations_by_local_date() {
        let (mut repo, _dir) = test_repo();
        repo.insert_observations(&[
            observation("2021010123300020210101123000", 14.0),
            observation("2021010200000020210101130000", 13.5),
            observation("2021010212000020210102010000", 24.1),
            observation("garbage", 99.0),
        ]).unwrap();
        repo.insert_observations(&[Observation {
            location: "Hobart".into(),
            observation_datetime: "2021010212000020210102010000".into(),
            air_temp: Some(30.0),
        }]).unwrap();

        let (forecast, observations) = repo.get_comparison_data(SITE, date(2021, 1, 2)).unwrap();

        assert!(forecast.is_none());
        let temps = observations.iter().map(|o| o.air_temp).collect::<Vec<_>>();
        assert_eq!(temps, vec![Some(13.5), Some(24.1)]);
    }

    #[test]
    fn comparison_with_no_data_is_empty() {
        let (repo, _dir) = test_repo();
        let (forecast, observations) = repo.get_comparison_data("Nowhere", date(2021, 1, 1)).unwrap();
        assert!(forecast.is_none());
        assert!(observations.is_empty());
    }

    #[test]
    fn available_locations_include_observation_site() {
        let (mut repo, _dir) = test_repo();
        assert_eq!(repo.get_available_locations().unwrap(), vec![SITE.to_string()]);

        repo.upsert_forecasts(&[
            forecast("Hobart", date(2021, 1, 1), 28),
            forecast("Hobart", date(2021, 1, 2), 25),
            forecast("Launceston", date(2021, 1, 1), 30),
            forecast("Bicheno", date(2021, 1, 1), 22),
        ]).unwrap();

        assert_eq!(repo.get_available_locations().unwrap(), vec![
            "Bicheno".to_string(),
            SITE.to_string(),
            "Hobart".to_string(),
            "Launceston".to_string(),
        ]);
    }

    #[test]
    fn observation_site_is_not_duplicated() {
        let (mut repo, _dir) = test_repo();
        repo.upsert_forecasts(&[forecast(SITE, date(2021, 1, 1), 21)]).unwrap();
        assert_eq!(repo.get_available_locations().unwrap(), vec![SITE.to_string()]);
    }

    #[test]
    fn cleanup_respects_retention_window() {
        let (mut repo, _dir) = test_repo();
        let now = Utc::now();
        let today = now.date_naive();

        repo.upsert_forecasts_at(&[forecast("Old", date(2021, 1, 1), 20)], now - TimeDelta::days(15)).unwrap();
        repo.upsert_forecasts_at(&[forecast("Edge", date(2021, 1, 1), 20)], now - TimeDelta::days(14)).unwrap();
        repo.upsert_forecasts_at(&[forecast("Recent", date(2021, 1, 1), 20)], now - TimeDelta::days(13)).unwrap();
        repo.insert_observations_at(&[observation("2021010112000020210101010000", 10.0)], now - TimeDelta::days(20)).unwrap();
        repo.insert_observations_at(&[observation("2021010112000020210101010000", 11.0)], now).unwrap();

        let report = repo.cleanup_old_data_at(14, today).unwrap();

        assert_eq!(report, CleanupReport { forecasts: 1, observations: 1 });
        let mut locations = repo.get_available_locations().unwrap();
        locations.retain(|l| l != SITE);
        assert_eq!(locations, vec!["Edge".to_string(), "Recent".to_string()]);
        assert_eq!(count(&repo, "observations"), 1);
    }

    #[test]
    fn cleanup_on_empty_store() {
        let (mut repo, _dir) = test_repo();
        assert_eq!(repo.cleanup_old_data(14).unwrap(), CleanupReport::default());
    }

    #[test]
    fn last_updated_at_is_utc_iso8601() {
        let (mut repo, _dir) = test_repo();
        let now = DateTime::parse_from_rfc3339("2021-01-01T05:00:00Z").unwrap().with_timezone(&Utc);
        repo.upsert_forecasts_at(&[forecast("Hobart", date(2021, 1, 1), 28)], now).unwrap();

        let (f, _) = repo.get_comparison_data("Hobart", date(2021, 1, 1)).unwrap();
        assert_eq!(f.unwrap().last_updated_at, "2021-01-01T05:00:00.000000Z");
    }
}
