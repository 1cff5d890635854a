//! Engine configuration.
//!
//! Read from a TOML file (`--config`, else `REVIEW_PULSE_CONFIG`), every key
//! optional. `REVIEW_PULSE_API_URL` overrides the backend URL.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geo::{CityCoordinates, DEFAULT_JITTER_DEGREES};
use crate::stats::default_recent_window;
use crate::timeseries::MAX_TREND_DAYS;

pub const CONFIG_ENV: &str = "REVIEW_PULSE_CONFIG";
pub const API_URL_ENV: &str = "REVIEW_PULSE_API_URL";
pub const MAX_RECENT_WINDOW_HOURS: i64 = MAX_TREND_DAYS as i64 * 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub api_base_url: String,
    pub time_zone: Tz,
    pub recent_window_hours: i64,
    pub trend_days: u32,
    pub top_cities: usize,
    pub map_jitter_degrees: f64,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Extra `name = [longitude, latitude]` entries for the map.
    pub cities: BTreeMap<String, [f64; 2]>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            time_zone: Tz::UTC,
            recent_window_hours: 24,
            trend_days: 7,
            top_cities: 5,
            map_jitter_degrees: DEFAULT_JITTER_DEGREES,
            refresh_interval_secs: 30,
            request_timeout_secs: 15,
            cities: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// CLI path, then the config env var, then defaults; the API URL env
    /// var wins over whatever was loaded.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".to_string()));
        }
        if !(1..=MAX_RECENT_WINDOW_HOURS).contains(&self.recent_window_hours) {
            return Err(ConfigError::Invalid(format!(
                "recent_window_hours must be between 1 and {MAX_RECENT_WINDOW_HOURS}"
            )));
        }
        if !(1..=MAX_TREND_DAYS).contains(&self.trend_days) {
            return Err(ConfigError::Invalid(format!(
                "trend_days must be between 1 and {MAX_TREND_DAYS}"
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be positive".to_string(),
            ));
        }
        if !self.map_jitter_degrees.is_finite() || self.map_jitter_degrees < 0.0 {
            return Err(ConfigError::Invalid(
                "map_jitter_degrees must be a non-negative number".to_string(),
            ));
        }
        if let Some((city, _)) = self
            .cities
            .iter()
            .find(|(_, [lon, lat])| !(-180.0..=180.0).contains(lon) || !(-90.0..=90.0).contains(lat))
        {
            return Err(ConfigError::Invalid(format!(
                "coordinates for {city} are out of range"
            )));
        }
        Ok(())
    }

    /// Falls back to the default window when the hours overflow a duration.
    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.recent_window_hours).unwrap_or_else(default_recent_window)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Built-in city table with the configured entries layered on top.
    pub fn city_coordinates(&self) -> CityCoordinates {
        let mut table = CityCoordinates::builtin();
        table.extend(
            self.cities
                .iter()
                .map(|(city, [lon, lat])| (city.clone(), (*lon, *lat))),
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = EngineConfig::parse("", Path::new("empty.toml")).expect("defaults");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.recent_window(), chrono::Duration::hours(24));
        assert_eq!(config.refresh_interval(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn parses_zone_and_extra_cities() {
        let config = EngineConfig::parse(
            r#"
            time_zone = "Asia/Kolkata"
            trend_days = 14
            [cities]
            Goa = [73.8278, 15.4909]
            "#,
            Path::new("custom.toml"),
        )
        .expect("config");

        assert_eq!(config.time_zone, chrono_tz::Asia::Kolkata);
        assert_eq!(config.trend_days, 14);
        let coords = config.city_coordinates();
        assert_eq!(coords.get("Goa"), Some((73.8278, 15.4909)));
        assert!(coords.get("Pune").is_some());
    }

    #[test]
    fn rejects_unknown_zone_and_bad_values() {
        assert!(matches!(
            EngineConfig::parse("time_zone = \"Mars/Olympus\"", Path::new("x.toml")),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            EngineConfig::parse("refresh_interval_secs = 0", Path::new("x.toml")),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::parse("map_jitter_degrees = -1.0", Path::new("x.toml")),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::parse("[cities]\nNowhere = [200.0, 0.0]", Path::new("x.toml")),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_windows_that_overflow_dates() {
        for bad in [
            "trend_days = 0",
            "trend_days = 4000000000",
            "recent_window_hours = 0",
            "recent_window_hours = 9223372036854775807",
        ] {
            assert!(
                matches!(
                    EngineConfig::parse(bad, Path::new("x.toml")),
                    Err(ConfigError::Invalid(_))
                ),
                "{bad} should be rejected"
            );
        }

        let widest = EngineConfig::parse(
            &format!("trend_days = {MAX_TREND_DAYS}\nrecent_window_hours = {MAX_RECENT_WINDOW_HOURS}"),
            Path::new("x.toml"),
        )
        .expect("upper bounds are valid");
        assert_eq!(widest.recent_window(), chrono::Duration::days(MAX_TREND_DAYS as i64));

        let unchecked = EngineConfig {
            recent_window_hours: i64::MAX,
            ..EngineConfig::default()
        };
        assert_eq!(unchecked.recent_window(), default_recent_window());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "api_base_url = \"http://reviews.internal:9000\"").expect("write");
        let config = EngineConfig::load(file.path()).expect("config");
        assert_eq!(config.api_base_url, "http://reviews.internal:9000");

        let missing = EngineConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
