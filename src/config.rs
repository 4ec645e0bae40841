//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-config.toml file.
//! It provides a centralized way to configure the NOAA station, the weather city,
//! the two time zones, the tide panel geometry and the prediction cache.

use crate::chart::{ChartGeometry, Margins};
use crate::zones::{DisplayZone, SourceZone};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "tide-config.toml";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// NOAA station configuration
    pub station: StationConfig,
    /// OpenWeather header panel
    pub weather: WeatherConfig,
    /// Source and display time zones
    pub time: TimeConfig,
    /// Tide panel geometry
    pub chart: ChartConfig,
    /// Prediction cache
    pub cache: CacheConfig,
}

/// NOAA tide station configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    /// NOAA station ID (e.g., "8418150" for Portland, ME)
    pub id: String,
    /// Human-readable station name, shown in the frame header
    pub name: String,
    /// Vertical datum for predictions (MLLW gives the usual 0-9+ ft chart values)
    pub datum: String,
    /// "english" for feet, "metric" for meters
    pub units: String,
    /// Prediction interval: "h" hourly, "6" six-minute, "hilo" highs/lows only
    pub interval: String,
}

/// OpenWeather configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// When false the page carries tides only
    pub enabled: bool,
    /// City for the geocoder, e.g. "Portland, ME"
    pub city: String,
    /// One Call 3.0 key; `OPENWEATHERMAP_API_KEY` is used when unset
    pub api_key: Option<String>,
}

/// Time zone configuration, as IANA names
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Zone the raw prediction timestamps are written in.
    ///
    /// `GMT` requests GMT predictions from NOAA. Any other zone requests
    /// station-local time (`lst_ldt`), so it must be the station's own zone
    /// or every instant ends up shifted.
    pub source_zone: String,
    /// Zone used for every label on the frame
    pub display_zone: String,
}

/// Tide panel geometry in pixels
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub stroke_width: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

/// Raw prediction cache
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file location (cleared on reboot when under /tmp)
    pub path: PathBuf,
    /// Cache TTL in minutes
    pub ttl_minutes: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            id: "8418150".to_string(),
            name: "Portland, ME".to_string(),
            datum: "MLLW".to_string(),
            units: "english".to_string(),
            interval: "h".to_string(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            enabled: true,
            city: "Portland, ME".to_string(),
            api_key: None,
        }
    }
}

/// Environment variable holding the OpenWeather key
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

impl WeatherConfig {
    /// Configured key, else the environment's. Blank keys count as unset.
    pub fn api_key(&self) -> Option<String> {
        let usable = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(usable)
            .or_else(|| env::var(API_KEY_ENV).ok().filter(usable))
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        TimeConfig {
            source_zone: "GMT".to_string(),
            display_zone: "America/New_York".to_string(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        let g = ChartGeometry::default();
        ChartConfig {
            width: g.width,
            height: g.height,
            stroke_width: g.stroke_width,
            margin_top: g.margins.top,
            margin_right: g.margins.right,
            margin_bottom: g.margins.bottom,
            margin_left: g.margins.left,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            path: PathBuf::from("/tmp/tide_frame_cache.json"),
            ttl_minutes: 60,
        }
    }
}

impl TimeConfig {
    /// Parsed source zone; an unknown name falls back to GMT.
    pub fn source_zone(&self) -> SourceZone {
        self.source_zone.parse().unwrap_or_else(|e| {
            warn!(zone = %self.source_zone, error = %e, "invalid source zone, using GMT");
            SourceZone::default()
        })
    }

    /// Parsed display zone; an unknown name falls back to US Eastern.
    pub fn display_zone(&self) -> DisplayZone {
        self.display_zone.parse().unwrap_or_else(|e| {
            warn!(zone = %self.display_zone, error = %e, "invalid display zone, using America/New_York");
            DisplayZone::default()
        })
    }
}

impl ChartConfig {
    pub fn geometry(&self) -> ChartGeometry {
        ChartGeometry {
            width: self.width,
            height: self.height,
            margins: Margins {
                top: self.margin_top,
                right: self.margin_right,
                bottom: self.margin_bottom,
                left: self.margin_left,
            },
            stroke_width: self.stroke_width,
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(station = %config.station.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults (Portland, ME)");
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.station.id, "8418150");
        assert_eq!(config.station.name, "Portland, ME");
        assert_eq!(config.station.datum, "MLLW");
        assert_eq!(config.cache.ttl_minutes, 60);
        assert!(config.weather.enabled);
        assert_eq!(config.weather.city, "Portland, ME");
        assert_eq!(config.chart.geometry(), ChartGeometry::default());
        assert_eq!(config.time.source_zone(), SourceZone::GMT);
        assert_eq!(config.time.display_zone(), DisplayZone::US_EASTERN);
    }

    #[test]
    fn config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.station.id, "8418150");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"
[station]
id = "8443970"
name = "Boston, MA"

[time]
display_zone = "America/Los_Angeles"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.station.id, "8443970");
        assert_eq!(config.station.interval, "h");
        assert_eq!(config.time.source_zone(), SourceZone::GMT);
        assert_eq!(
            config.time.display_zone(),
            "America/Los_Angeles".parse::<DisplayZone>().unwrap()
        );
        assert_eq!(config.chart.width, 800.0);
    }

    #[test]
    fn weather_section_parses() {
        let config: Config = toml::from_str(
            r#"
[weather]
city = "Bar Harbor, ME"
api_key = "abc123"
"#,
        )
        .unwrap();
        assert!(config.weather.enabled);
        assert_eq!(config.weather.city, "Bar Harbor, ME");
        assert_eq!(config.weather.api_key().as_deref(), Some("abc123"));

        let roundtrip: Config = toml::from_str(&toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(roundtrip, config);
    }

    #[test]
    fn invalid_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "station = [not valid").unwrap();
        assert_eq!(Config::load_from_path(file.path()), Config::default());
    }

    #[test]
    fn invalid_zone_falls_back() {
        let mut config = Config::default();
        config.time.display_zone = "Atlantis/Central".into();
        config.time.source_zone = "nowhere".into();
        assert_eq!(config.time.display_zone(), DisplayZone::default());
        assert_eq!(config.time.source_zone(), SourceZone::default());
    }

    #[test]
    fn save_and_reload() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.station.name = "Bar Harbor, ME".into();
        config.save(file.path()).unwrap();
        assert_eq!(Config::load_from_path(file.path()), config);
    }
}
