//! # Tide Frame Core Library
//!
//! This library turns a raw list of NOAA tide predictions into everything the
//! 800×480 e-ink frame needs to draw the tide panel: a chart in pixel space,
//! the next high and low tide, and an estimate of the current height.
//!
//! ## Pipeline
//!
//! Every refresh recomputes the whole frame from scratch:
//!
//! 1. [`normalize`]: raw `{time, height}` records → chronologically sorted [`TideSeries`]
//! 2. [`window`]: restrict the series to `now ± 12h` for charting
//! 3. [`extrema`]: first local maximum / minimum strictly after `now` (full series)
//! 4. [`current`]: nearest prediction to `now`
//! 5. [`chart`]: linear time → x and height → y mapping with stroke-aware clamping
//! 6. [`render_model`]: polyline, ticks, "now" marker and annotations
//!
//! Stages are pure functions over owned values. Nothing is cached between
//! refreshes except the raw predictions (see [`noaa`]).
//!
//! The page header carries the current weather and a four-day forecast from
//! [`weather`], resolved separately and attached to the finished frame.
//!
//! ## Time zones
//!
//! Raw prediction times are naive wall-clock strings. They are resolved in a
//! [`zones::SourceZone`] (GMT by default) before any arithmetic, and all
//! labels are formatted in a separate [`zones::DisplayZone`]
//! (US Eastern by default). The two are distinct types so they cannot be
//! swapped by accident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod chart;
pub mod config;
pub mod current;
pub mod extrema;
pub mod fallback;
pub mod framebuffer;
pub mod noaa;
pub mod normalize;
pub mod render_model;
pub mod renderer;
pub mod weather;
pub mod window;
pub mod zones;

/// Height field of a raw prediction.
///
/// NOAA sends heights as strings (`"3.215"`), other feeds send numbers.
/// Both are accepted and parsed by [`normalize::parse_height`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHeight {
    Number(f64),
    Text(String),
}

impl From<f64> for RawHeight {
    fn from(value: f64) -> Self {
        RawHeight::Number(value)
    }
}

impl From<String> for RawHeight {
    fn from(value: String) -> Self {
        RawHeight::Text(value)
    }
}

impl From<&str> for RawHeight {
    fn from(value: &str) -> Self {
        RawHeight::Text(value.to_string())
    }
}

/// A single raw tide prediction as delivered by the fetch collaborator.
///
/// `time` is a naive timestamp such as `"2025-07-24 13:00"` with no offset.
///
/// # Example
/// ```
/// use tide_frame_lib::{RawHeight, TidePrediction};
///
/// let p = TidePrediction::new("2025-07-24 13:00", "4.211");
/// assert_eq!(p.height, RawHeight::Text("4.211".into()));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidePrediction {
    pub time: String,
    pub height: RawHeight,
}

impl TidePrediction {
    pub fn new(time: impl Into<String>, height: impl Into<RawHeight>) -> Self {
        Self {
            time: time.into(),
            height: height.into(),
        }
    }
}

/// One refresh cycle's worth of raw predictions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideData {
    pub predictions: Vec<TidePrediction>,
    /// True when the predictions come from the offline model instead of NOAA
    #[serde(default)]
    pub offline: bool,
}

/// A resolved tide height at an absolute instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidePoint {
    pub instant: DateTime<Utc>,
    /// Height above chart datum in feet
    pub height_ft: f64,
}

impl TidePoint {
    pub fn new(instant: DateTime<Utc>, height_ft: f64) -> Self {
        Self { instant, height_ft }
    }
}

/// Chronologically ordered tide points.
///
/// Instants are non-decreasing. Duplicate instants are kept in their
/// original relative order.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use tide_frame_lib::{TidePoint, TideSeries};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap();
/// let series = TideSeries {
///     points: vec![TidePoint::new(t0, 2.1)],
///     offline: false,
/// };
/// assert_eq!(series.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideSeries {
    pub points: Vec<TidePoint>,
    /// Carried over from [`TideData::offline`]
    pub offline: bool,
}

impl TideSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
