//! # Weather Panel
//!
//! Current conditions and a short daily forecast for the page header, from
//! OpenWeather. A city name is geocoded first, then the One Call 3.0 API is
//! asked for current and daily data in imperial units.
//!
//! ## Data Source
//! - **Geocoding**: `https://api.openweathermap.org/geo/1.0/direct?q=<city>&limit=1`
//! - **Forecast**: `https://api.openweathermap.org/data/3.0/onecall`,
//!   excluding minutely, hourly and alerts
//!
//! [`WeatherPanel`] is the resolved, drawable form: rounded temperatures,
//! weekday labels in the display zone, and an icon per box. After sunset
//! the current-conditions icon becomes the moon in its current phase.
//!
//! Weather is optional. A failed fetch still yields a panel that says so,
//! with a moon phase estimated locally from the mean lunation.

use crate::config::WeatherConfig;
use crate::fallback;
use crate::zones::DisplayZone;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const GEO_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const ONE_CALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Forecast boxes after today's
pub const FORECAST_DAYS: usize = 4;

pub const UNAVAILABLE_MESSAGE: &str = "Weather unavailable";

/// Errors that can occur while fetching weather.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenWeather API key not configured")]
    MissingApiKey,

    #[error("city not found: {0}")]
    CityNotFound(String),

    /// OpenWeather answered with a non-success status
    #[error("OpenWeather API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    current: CurrentWire,
    #[serde(default)]
    daily: Vec<DailyWire>,
}

#[derive(Debug, Deserialize)]
struct CurrentWire {
    temp: f64,
    #[serde(default)]
    sunset: Option<i64>,
    #[serde(default)]
    weather: Vec<Conditions>,
}

#[derive(Debug, Deserialize)]
struct DailyWire {
    dt: i64,
    temp: TempRange,
    #[serde(default)]
    moon_phase: f64,
    #[serde(default)]
    weather: Vec<Conditions>,
}

#[derive(Debug, Deserialize)]
struct TempRange {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// One OpenWeather condition, e.g. `Rain` / `light rain`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub main: String,
    pub description: String,
}

/// Decoded forecast. `days[0]` is today.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub temp_f: f64,
    pub conditions: Conditions,
    pub sunset: Option<DateTime<Utc>>,
    pub days: Vec<DailyForecast>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: DateTime<Utc>,
    pub high_f: f64,
    pub low_f: f64,
    /// 0 and 1 new moon, 0.25 first quarter, 0.5 full, 0.75 last quarter
    pub moon_phase: f64,
    pub conditions: Conditions,
}

impl From<OneCallResponse> for Forecast {
    fn from(response: OneCallResponse) -> Self {
        let first = |conditions: Vec<Conditions>| conditions.into_iter().next().unwrap_or_default();
        Forecast {
            temp_f: response.current.temp,
            conditions: first(response.current.weather),
            sunset: response
                .current
                .sunset
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            days: response
                .daily
                .into_iter()
                .filter_map(|day| {
                    Some(DailyForecast {
                        date: DateTime::from_timestamp(day.dt, 0)?,
                        high_f: day.temp.max,
                        low_f: day.temp.min,
                        moon_phase: day.moon_phase,
                        conditions: first(day.weather),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Classify an OpenWeather `moon_phase` value.
    ///
    /// The four principal phases are exact points; everything between them
    /// is a crescent or gibbous. Out-of-range values read as new.
    pub fn from_fraction(fraction: f64) -> Self {
        use MoonPhase::*;
        match fraction {
            f if f == 0.0 || f == 1.0 => New,
            f if f > 0.0 && f < 0.25 => WaxingCrescent,
            f if f == 0.25 => FirstQuarter,
            f if f > 0.25 && f < 0.5 => WaxingGibbous,
            f if f == 0.5 => Full,
            f if f > 0.5 && f < 0.75 => WaningGibbous,
            f if f == 0.75 => LastQuarter,
            f if f > 0.75 && f < 1.0 => WaningCrescent,
            _ => New,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MoonPhase::New => "new moon",
            MoonPhase::WaxingCrescent => "waxing crescent",
            MoonPhase::FirstQuarter => "first quarter",
            MoonPhase::WaxingGibbous => "waxing gibbous",
            MoonPhase::Full => "full moon",
            MoonPhase::WaningGibbous => "waning gibbous",
            MoonPhase::LastQuarter => "last quarter",
            MoonPhase::WaningCrescent => "waning crescent",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Sun,
    Cloud,
    Drizzle,
    Rain,
    Thunderstorm,
    Snow,
    Moon(MoonPhase),
}

impl WeatherIcon {
    /// Icon for an OpenWeather `main` group or description. Unknown
    /// conditions draw the sun.
    pub fn for_condition(condition: &str) -> Self {
        match condition.trim().to_lowercase().as_str() {
            "clouds" | "few clouds" | "scattered clouds" | "broken clouds" | "overcast clouds"
            | "mist" | "fog" | "haze" | "smoke" => WeatherIcon::Cloud,
            "drizzle" | "shower rain" => WeatherIcon::Drizzle,
            "rain" => WeatherIcon::Rain,
            "thunderstorm" => WeatherIcon::Thunderstorm,
            "snow" => WeatherIcon::Snow,
            _ => WeatherIcon::Sun,
        }
    }

    /// Short text stand-in for the ASCII preview.
    pub fn label(self) -> &'static str {
        match self {
            WeatherIcon::Sun => "sun",
            WeatherIcon::Cloud => "cloud",
            WeatherIcon::Drizzle => "drizzle",
            WeatherIcon::Rain => "rain",
            WeatherIcon::Thunderstorm => "storm",
            WeatherIcon::Snow => "snow",
            WeatherIcon::Moon(phase) => phase.name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayPanel {
    /// e.g. `Tue`
    pub weekday: String,
    pub icon: WeatherIcon,
    /// e.g. `75°F`
    pub high: String,
    pub low: String,
}

/// Header weather section, ready to draw.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherPanel {
    /// e.g. `Weather for Portland`
    pub title: String,
    pub icon: WeatherIcon,
    /// e.g. `72°F`; empty when unavailable
    pub temperature: String,
    pub description: String,
    /// Today's high and low, e.g. `75°`
    pub high: Option<String>,
    pub low: Option<String>,
    pub days: Vec<DayPanel>,
    pub available: bool,
}

fn degrees(temp_f: f64) -> String {
    format!("{}°", temp_f.round() as i64)
}

fn title(city: &str) -> String {
    let name = city.split(',').next().unwrap_or(city).trim();
    format!("Weather for {name}")
}

impl WeatherPanel {
    /// Resolve a forecast into drawable labels.
    ///
    /// Without a forecast the panel reports the outage and shows the moon
    /// phase estimated for `now`.
    pub fn resolve(
        forecast: Option<&Forecast>,
        city: &str,
        now: DateTime<Utc>,
        display: DisplayZone,
    ) -> Self {
        let Some(forecast) = forecast else {
            let phase = MoonPhase::from_fraction(fallback::moon_phase_fraction(now));
            return WeatherPanel {
                title: title(city),
                icon: WeatherIcon::Moon(phase),
                temperature: String::new(),
                description: UNAVAILABLE_MESSAGE.to_string(),
                high: None,
                low: None,
                days: Vec::new(),
                available: false,
            };
        };

        let today = forecast.days.first();
        let after_sunset = forecast.sunset.is_some_and(|sunset| now > sunset);
        let icon = if after_sunset {
            let phase = today.map_or(0.0, |day| day.moon_phase);
            WeatherIcon::Moon(MoonPhase::from_fraction(phase))
        } else {
            WeatherIcon::for_condition(&forecast.conditions.main)
        };

        let days = forecast
            .days
            .iter()
            .skip(1)
            .take(FORECAST_DAYS)
            .map(|day| DayPanel {
                weekday: display.format(day.date, "%a"),
                icon: WeatherIcon::for_condition(&day.conditions.main),
                high: format!("{}F", degrees(day.high_f)),
                low: format!("{}F", degrees(day.low_f)),
            })
            .collect();

        WeatherPanel {
            title: title(city),
            icon,
            temperature: format!("{}F", degrees(forecast.temp_f)),
            description: forecast.conditions.description.clone(),
            high: today.map(|day| degrees(day.high_f)),
            low: today.map(|day| degrees(day.low_f)),
            days,
            available: true,
        }
    }
}

/// Query parameters for the One Call request.
fn one_call_params(lat: f64, lon: f64, key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("lat", lat.to_string()),
        ("lon", lon.to_string()),
        ("exclude", "minutely,hourly,alerts".to_string()),
        ("units", "imperial".to_string()),
        ("appid", key.to_string()),
    ]
}

fn parse_geocode(body: &str, city: &str) -> Result<(f64, f64), WeatherError> {
    let results: Vec<GeoResult> = serde_json::from_str(body)?;
    results
        .into_iter()
        .next()
        .map(|r| (r.lat, r.lon))
        .ok_or_else(|| WeatherError::CityNotFound(city.to_string()))
}

fn parse_one_call(success: bool, body: &str) -> Result<Forecast, WeatherError> {
    if !success {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| "failed to fetch weather data".to_string());
        return Err(WeatherError::Api(message));
    }
    let response: OneCallResponse = serde_json::from_str(body)?;
    Ok(response.into())
}

/// Geocode the configured city and fetch its forecast.
pub async fn fetch(config: &WeatherConfig) -> Result<Forecast, WeatherError> {
    let key = config.api_key().ok_or(WeatherError::MissingApiKey)?;
    let client = reqwest::Client::new();

    info!(city = %config.city, "fetching weather");
    let response = client
        .get(GEO_URL)
        .query(&[("q", config.city.as_str()), ("limit", "1"), ("appid", key.as_str())])
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(WeatherError::Api(format!("geocoding failed: HTTP {status}")));
    }
    let (lat, lon) = parse_geocode(&body, &config.city)?;
    debug!(lat, lon, "geocoded city");

    let response = client
        .get(ONE_CALL_URL)
        .query(&one_call_params(lat, lon, &key))
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;
    let forecast = parse_one_call(status.is_success(), &body)?;
    info!(days = forecast.days.len(), "received weather");

    Ok(forecast)
}
