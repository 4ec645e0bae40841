//! # Render Model
//!
//! Assembles the drawable tide panel and runs the full refresh pipeline.
//!
//! [`build_frame`] is the single entry point the binary uses: raw predictions
//! in, a [`TideFrame`] out. The frame holds only resolved geometry and
//! formatted strings, so any surface (e-ink buffer, ASCII, JSON) can draw it
//! without touching chrono or the scale again.

use crate::chart::{ChartGeometry, ChartScale};
use crate::config::Config;
use crate::current;
use crate::extrema::{self, Extrema};
use crate::normalize::{self, ParseError};
use crate::weather::WeatherPanel;
use crate::window::AnalysisWindow;
use crate::zones::{DisplayZone, SourceZone};
use crate::{TideData, TidePoint};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Message shown in place of the chart when the window holds no data
pub const NO_DATA_MESSAGE: &str = "No valid chart data to display.";

/// Message shown when predictions exist but no high/low follows `now`
pub const NO_EXTREMA_MESSAGE: &str = "Next high/low not found in the upcoming window.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tick {
    /// x for time ticks, y for height ticks
    pub position: f64,
    pub label: String,
}

/// Geometry-resolved tide panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrawableModel {
    pub geometry: ChartGeometry,
    /// Mapped `(x, y)` pairs in chronological order
    pub polyline: Vec<(f64, f64)>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub now_marker_x: Option<f64>,
    /// Set when the window held no points. `polyline` is then empty.
    pub no_data: bool,
}

impl DrawableModel {
    pub fn empty(geometry: ChartGeometry) -> Self {
        Self {
            geometry,
            polyline: Vec::new(),
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            now_marker_x: None,
            no_data: true,
        }
    }

    /// Map windowed points onto `geometry`. Order of `points` is preserved.
    pub fn build(
        points: &[TidePoint],
        geometry: ChartGeometry,
        now: DateTime<Utc>,
        display: DisplayZone,
    ) -> Self {
        let Some(scale) = ChartScale::fit(points, geometry) else {
            return Self::empty(geometry);
        };

        let polyline = points
            .iter()
            .map(|p| (scale.x(p.instant), scale.y(p.height_ft)))
            .collect();

        let x_ticks = scale
            .x_ticks()
            .into_iter()
            .map(|t| Tick {
                position: scale.x(t),
                label: display.hour_label(t),
            })
            .collect();

        let y_ticks = scale
            .y_ticks()
            .into_iter()
            .map(|h| Tick {
                position: scale.y(h as f64),
                label: h.to_string(),
            })
            .collect();

        Self {
            geometry,
            polyline,
            x_ticks,
            y_ticks,
            now_marker_x: scale.now_x(now),
            no_data: false,
        }
    }
}

/// Everything needed to turn raw predictions into a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameOptions {
    pub source_zone: SourceZone,
    pub display_zone: DisplayZone,
    pub geometry: ChartGeometry,
}

impl From<&Config> for FrameOptions {
    fn from(config: &Config) -> Self {
        Self {
            source_zone: config.time.source_zone(),
            display_zone: config.time.display_zone(),
            geometry: config.chart.geometry(),
        }
    }
}

/// One refresh cycle's output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TideFrame {
    pub now: DateTime<Utc>,
    pub window: AnalysisWindow,
    pub model: DrawableModel,
    pub extrema: Extrema,
    pub current: Option<TidePoint>,
    pub offline: bool,
    /// Number of normalized predictions before windowing
    pub prediction_count: usize,
    /// Header weather section; `None` when weather is turned off
    pub weather: Option<WeatherPanel>,
    #[serde(skip)]
    pub display_zone: DisplayZone,
}

impl TideFrame {
    pub fn with_weather(mut self, weather: Option<WeatherPanel>) -> Self {
        self.weather = weather;
        self
    }

    /// e.g. `Current Tide: 3.21 ft`
    pub fn current_label(&self) -> Option<String> {
        self.current
            .map(|p| format!("Current Tide: {:.2} ft", p.height_ft))
    }

    /// e.g. `Next High: 8.9 ft at 3:07 PM`
    pub fn next_high_label(&self) -> Option<String> {
        self.extrema.next_high.map(|p| self.extremum_label("High", p))
    }

    pub fn next_low_label(&self) -> Option<String> {
        self.extrema.next_low.map(|p| self.extremum_label("Low", p))
    }

    fn extremum_label(&self, kind: &str, point: TidePoint) -> String {
        format!(
            "Next {kind}: {:.1} ft at {}",
            point.height_ft,
            self.display_zone.clock_label(point.instant)
        )
    }

    /// Notice for data that holds no upcoming high or low.
    pub fn extrema_notice(&self) -> Option<&'static str> {
        (self.extrema.is_empty() && self.prediction_count > 0).then_some(NO_EXTREMA_MESSAGE)
    }

    /// `Last Refresh: 3:07 PM`
    pub fn refresh_label(&self) -> String {
        format!("Last Refresh: {}", self.display_zone.clock_label(self.now))
    }
}

/// Run the whole pipeline for one refresh.
///
/// Only malformed input is an error. Empty windows, short series and missing
/// extrema all produce a valid frame.
pub fn build_frame(
    data: &TideData,
    now: DateTime<Utc>,
    options: &FrameOptions,
) -> Result<TideFrame, ParseError> {
    let series = normalize::normalize_data(data, options.source_zone)?;
    let window = AnalysisWindow::around(now);
    let windowed = window.select(&series);

    let extrema = extrema::find_next(&series.points, now);
    let current = current::nearest(&series.points, now);
    let model = DrawableModel::build(
        &windowed.points,
        options.geometry,
        now,
        options.display_zone,
    );

    debug!(
        predictions = series.len(),
        charted = model.polyline.len(),
        has_high = extrema.next_high.is_some(),
        has_low = extrema.next_low.is_some(),
        "built tide frame"
    );

    Ok(TideFrame {
        now,
        window,
        model,
        extrema,
        current,
        offline: series.offline,
        prediction_count: series.len(),
        weather: None,
        display_zone: options.display_zone,
    })
}
