//! # NOAA Tide Prediction Fetching and Caching
//!
//! This module is the fetch collaborator: it pulls raw tide predictions from
//! NOAA's CO-OPS `datagetter` API and hands them to the pipeline untouched.
//!
//! ## Data Source
//! - **URL**: `https://api.tidesandcurrents.noaa.gov/api/prod/datagetter`
//! - **Product**: `predictions`, JSON, hourly by default
//! - **Span**: `now - 12h` to `now + 12h`, requested in GMT
//!
//! The response looks like:
//! ```json
//! { "predictions": [ { "t": "2025-07-24 00:00", "v": "3.215" }, ... ] }
//! ```
//! or, on a bad request, `{ "error": { "message": "..." } }`.
//!
//! ## Caching Strategy
//! Raw predictions are cached as JSON with a TTL checked against the file's
//! modification time. The cache stores predictions, not frames, so every
//! refresh still recomputes the window, extrema and chart around the real `now`.
//! A cache written for a different request (station, datum, units, interval
//! or source zone) is ignored. Within one TTL the cached span trails the live
//! window by at most `ttl_minutes`.
//!
//! Cache write failures are logged and otherwise ignored.

use crate::config::Config;
use crate::normalize::ParseError;
use crate::window::HALF_SPAN_HOURS;
use crate::zones::SourceZone;
use crate::{TideData, TidePrediction};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{fs, io, time::SystemTime};
use thiserror::Error;
use tracing::{debug, info, warn};

const BASE_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Date layout NOAA expects for `begin_date` / `end_date`
const REQUEST_DATE_FORMAT: &str = "%Y%m%d %H:%M";

/// Errors that can occur while fetching predictions.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// NOAA answered with an error payload or a non-success status
    #[error("NOAA API error: {0}")]
    Api(String),

    /// Response body was not the expected JSON
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    /// Predictions could not be normalized
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Deserialize)]
struct DataGetterResponse {
    #[serde(default)]
    predictions: Option<Vec<NoaaPrediction>>,
    #[serde(default)]
    error: Option<NoaaErrorBody>,
}

#[derive(Debug, Deserialize)]
struct NoaaPrediction {
    t: String,
    v: String,
}

#[derive(Debug, Deserialize)]
struct NoaaErrorBody {
    message: String,
}

/// Request settings a cached batch was fetched with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct CacheKey {
    station: String,
    datum: String,
    units: String,
    interval: String,
    source_zone: String,
}

impl CacheKey {
    fn for_config(config: &Config) -> Self {
        Self {
            station: config.station.id.clone(),
            datum: config.station.datum.clone(),
            units: config.station.units.clone(),
            interval: config.station.interval.clone(),
            source_zone: config.time.source_zone().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedPredictions {
    #[serde(flatten)]
    key: CacheKey,
    predictions: Vec<TidePrediction>,
}

/// `begin_date` and `end_date` for a request centred on `now`.
pub fn request_window(now: DateTime<Utc>, zone: SourceZone) -> (String, String) {
    let half = Duration::hours(HALF_SPAN_HOURS);
    let fmt = |t: DateTime<Utc>| zone.naive(t).format(REQUEST_DATE_FORMAT).to_string();
    (fmt(now - half), fmt(now + half))
}

/// NOAA only knows GMT and station-local time.
fn noaa_time_zone(zone: SourceZone) -> &'static str {
    if zone == SourceZone::GMT {
        "gmt"
    } else {
        "lst_ldt"
    }
}

/// Query parameters for the `datagetter` predictions request.
pub fn query_params(config: &Config, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let zone = config.time.source_zone();
    let (begin_date, end_date) = request_window(now, zone);
    vec![
        ("begin_date", begin_date),
        ("end_date", end_date),
        ("station", config.station.id.clone()),
        ("product", "predictions".to_string()),
        ("datum", config.station.datum.clone()),
        ("time_zone", noaa_time_zone(zone).to_string()),
        ("units", config.station.units.clone()),
        ("interval", config.station.interval.clone()),
        ("format", "json".to_string()),
        ("application", "tide-frame".to_string()),
    ]
}

/// Fetch raw predictions around `now`, cache first.
///
/// On error the caller should fall back to [`crate::fallback::approximate`]
/// or keep the previous frame.
pub async fn fetch(config: &Config, now: DateTime<Utc>) -> Result<TideData, FetchError> {
    if let Some(predictions) = cached_predictions(config) {
        return Ok(TideData {
            predictions,
            offline: false,
        });
    }

    let params = query_params(config, now);
    info!(station = %config.station.id, "fetching NOAA predictions");
    let response = reqwest::Client::new()
        .get(BASE_URL)
        .query(&params)
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;

    let predictions = match parse_response(&body) {
        Ok(predictions) => predictions,
        Err(e) if !status.is_success() => {
            return Err(FetchError::Api(format!("HTTP {status}: {e}")));
        }
        Err(e) => return Err(e),
    };
    info!(count = predictions.len(), "received NOAA predictions");

    // Don't cache a batch the pipeline would reject
    crate::normalize::normalize(&predictions, config.time.source_zone())?;

    let cached = CachedPredictions {
        key: CacheKey::for_config(config),
        predictions,
    };
    if let Err(e) = save_cache(&config.cache.path, &cached) {
        warn!(error = %e, "failed to write prediction cache");
    }

    Ok(TideData {
        predictions: cached.predictions,
        offline: false,
    })
}

/// Predictions from a fresh cache written for the same request as `config`.
fn cached_predictions(config: &Config) -> Option<Vec<TidePrediction>> {
    let key = CacheKey::for_config(config);
    match load_cache(&config.cache.path, config.cache.ttl_minutes * 60) {
        Ok(cached) if cached.key == key => {
            debug!(count = cached.predictions.len(), "using cached predictions");
            Some(cached.predictions)
        }
        Ok(cached) => {
            debug!(cached = ?cached.key, wanted = ?key, "cache was written for another request");
            None
        }
        Err(e) => {
            debug!(error = %e, "prediction cache unavailable");
            None
        }
    }
}

/// Decode a `datagetter` body into raw predictions.
fn parse_response(body: &str) -> Result<Vec<TidePrediction>, FetchError> {
    let response: DataGetterResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(FetchError::Api(error.message));
    }
    let predictions = response
        .predictions
        .ok_or_else(|| FetchError::Api("response has no predictions".to_string()))?;

    Ok(predictions
        .into_iter()
        .map(|p| TidePrediction::new(p.t, p.v))
        .collect())
}

/// Load cached predictions if younger than `ttl_secs`.
fn load_cache(path: &Path, ttl_secs: u64) -> Result<CachedPredictions, io::Error> {
    let meta = fs::metadata(path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();

    if age > ttl_secs {
        return Err(io::Error::other("stale"));
    }

    let data = fs::read(path)?;
    let cached = serde_json::from_slice(&data)?;
    Ok(cached)
}

fn save_cache(path: &Path, cached: &CachedPredictions) -> Result<(), io::Error> {
    let data = serde_json::to_vec(cached)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawHeight;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 16, 30, 0).unwrap()
    }

    #[test]
    fn request_window_spans_a_day() {
        let (begin, end) = request_window(now(), SourceZone::GMT);
        assert_eq!(begin, "20250724 04:30");
        assert_eq!(end, "20250725 04:30");
    }

    #[test]
    fn query_uses_station_and_gmt() {
        let params = query_params(&Config::default(), now());
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("station"), Some("8418150"));
        assert_eq!(get("product"), Some("predictions"));
        assert_eq!(get("time_zone"), Some("gmt"));
        assert_eq!(get("format"), Some("json"));
        assert_eq!(get("begin_date"), Some("20250724 04:30"));
    }

    #[test]
    fn local_source_zone_requests_station_time() {
        let mut config = Config::default();
        config.time.source_zone = "America/New_York".into();
        let params = query_params(&config, now());
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("time_zone"), Some("lst_ldt"));
        // 16:30 UTC is 12:30 EDT
        assert_eq!(get("begin_date"), Some("20250724 00:30"));
        assert_eq!(get("end_date"), Some("20250725 00:30"));
    }

    #[test]
    fn parses_predictions() {
        let body = r#"{"predictions":[{"t":"2025-07-24 00:00","v":"3.215"},{"t":"2025-07-24 01:00","v":"-0.042"}]}"#;
        let predictions = parse_response(body).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].time, "2025-07-24 00:00");
        assert_eq!(predictions[1].height, RawHeight::Text("-0.042".into()));
    }

    #[test]
    fn surfaces_api_error_message() {
        let body = r#"{"error":{"message":"No Predictions data was found."}}"#;
        match parse_response(body) {
            Err(FetchError::Api(msg)) => assert_eq!(msg, "No Predictions data was found."),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_garbage_body() {
        assert!(matches!(
            parse_response("<html>502</html>"),
            Err(FetchError::Json(_))
        ));
        assert!(matches!(parse_response("{}"), Err(FetchError::Api(_))));
    }

    #[test]
    fn cache_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let cached = CachedPredictions {
            key: CacheKey::for_config(&Config::default()),
            predictions: sample_predictions(),
        };
        save_cache(file.path(), &cached).unwrap();

        let loaded = load_cache(file.path(), 3600).unwrap();
        assert_eq!(loaded.key, cached.key);
        assert_eq!(loaded.predictions, cached.predictions);
    }

    fn sample_predictions() -> Vec<TidePrediction> {
        vec![
            TidePrediction::new("2025-07-24 05:00", "1.5"),
            TidePrediction::new("2025-07-24 06:00", 2.0),
        ]
    }

    /// Config pointing at a temp cache written for `written_for`.
    fn cached_config(file: &NamedTempFile, written_for: &Config) -> Config {
        let cached = CachedPredictions {
            key: CacheKey::for_config(written_for),
            predictions: sample_predictions(),
        };
        save_cache(file.path(), &cached).unwrap();

        let mut config = written_for.clone();
        config.cache.path = file.path().to_path_buf();
        config
    }

    #[test]
    fn cache_hit_for_same_request() {
        let file = NamedTempFile::new().unwrap();
        let config = cached_config(&file, &Config::default());
        assert_eq!(cached_predictions(&config), Some(sample_predictions()));
    }

    #[test]
    fn cache_for_other_request_is_skipped() {
        let file = NamedTempFile::new().unwrap();
        let mut config = cached_config(&file, &Config::default());
        config.station.id = "9414290".into();
        assert_eq!(cached_predictions(&config), None);

        let mut config = cached_config(&file, &Config::default());
        config.station.units = "metric".into();
        assert_eq!(cached_predictions(&config), None);

        let mut config = cached_config(&file, &Config::default());
        config.station.datum = "MSL".into();
        assert_eq!(cached_predictions(&config), None);

        let mut config = cached_config(&file, &Config::default());
        config.station.interval = "6".into();
        assert_eq!(cached_predictions(&config), None);

        let mut config = cached_config(&file, &Config::default());
        config.time.source_zone = "America/New_York".into();
        assert_eq!(cached_predictions(&config), None);
    }

    #[test]
    fn stale_cache_is_skipped() {
        let file = NamedTempFile::new().unwrap();
        let config = cached_config(&file, &Config::default());
        let two_hours_ago = SystemTime::now() - std::time::Duration::from_secs(2 * 3600);
        file.as_file().set_modified(two_hours_ago).unwrap();

        assert_eq!(config.cache.ttl_minutes, 60);
        assert_eq!(cached_predictions(&config), None);
    }

    #[test]
    fn station_only_cache_is_skipped() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{"station":"8418150","predictions":[{"time":"2025-07-24 05:00","height":"1.5"}]}"#,
        )
        .unwrap();
        let mut config = Config::default();
        config.cache.path = file.path().to_path_buf();
        assert_eq!(cached_predictions(&config), None);
    }

    #[test]
    fn missing_or_corrupt_cache_is_an_error() {
        assert!(load_cache(Path::new("/nonexistent/tide_cache.json"), 3600).is_err());

        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), b"not json").unwrap();
        assert!(load_cache(file.path(), 3600).is_err());
    }
}
