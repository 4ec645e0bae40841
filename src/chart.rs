//! # Chart Coordinate Mapping
//!
//! Maps the windowed series onto the fixed 800×120 tide panel.
//!
//! ## Horizontal axis
//! ```text
//! x(t) = left + (t - min_time) / (max_time - min_time) * (max_drawable_x - left)
//! max_drawable_x = width - right - 1 - stroke / 2
//! ```
//! The 1px safety gutter and half-stroke inset keep the 3px polyline from
//! bleeding past the right margin on the hard-edged panel. Results are
//! clamped to `max_drawable_x`.
//!
//! ## Vertical axis
//! The height domain is snapped outward to whole feet (`floor(min)`,
//! `ceil(max)`) so y ticks land on integer marks. Pixel y grows downward, so
//! the mapping is inverted.
//!
//! Degenerate spans (single instant or flat heights) are treated as width 1
//! instead of dividing by zero.

use crate::TidePoint;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of x-axis ticks, including both ends of the time domain
pub const X_TICK_COUNT: usize = 5;

/// Upper bound on y-axis ticks, both ends included
pub const MAX_Y_TICKS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Pixel geometry of the tide panel.
///
/// The defaults are the values the display layout is built around and
/// should only be changed together with it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub stroke_width: f64,
}

impl Default for ChartGeometry {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 120.0,
            margins: Margins {
                top: 20.0,
                right: 40.0,
                bottom: 20.0,
                left: 40.0,
            },
            stroke_width: 3.0,
        }
    }
}

impl ChartGeometry {
    /// Rightmost pixel column inside the right margin.
    pub fn max_x(&self) -> f64 {
        self.width - self.margins.right - 1.0
    }

    /// Rightmost x a stroke centre may reach.
    pub fn max_drawable_x(&self) -> f64 {
        self.max_x() - self.stroke_width / 2.0
    }

    pub fn drawable_width(&self) -> f64 {
        self.max_drawable_x() - self.margins.left
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }

    /// y of the x axis.
    pub fn baseline_y(&self) -> f64 {
        self.height - self.margins.bottom
    }
}

/// Linear mapping fitted to one series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartScale {
    geometry: ChartGeometry,
    min_time: DateTime<Utc>,
    max_time: DateTime<Utc>,
    min_height: i64,
    max_height: i64,
}

impl ChartScale {
    /// Fit the domain to `points`. Returns `None` for an empty slice.
    pub fn fit(points: &[TidePoint], geometry: ChartGeometry) -> Option<Self> {
        let first = points.first()?;

        let (mut min_time, mut max_time) = (first.instant, first.instant);
        let (mut lo, mut hi) = (first.height_ft, first.height_ft);
        for p in points {
            min_time = min_time.min(p.instant);
            max_time = max_time.max(p.instant);
            lo = lo.min(p.height_ft);
            hi = hi.max(p.height_ft);
        }

        Some(Self {
            geometry,
            min_time,
            max_time,
            min_height: lo.floor() as i64,
            max_height: hi.ceil() as i64,
        })
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    fn time_span_ms(&self) -> f64 {
        let span = (self.max_time - self.min_time).num_milliseconds();
        if span == 0 {
            1.0
        } else {
            span as f64
        }
    }

    fn height_span(&self) -> f64 {
        let span = self.max_height.saturating_sub(self.min_height);
        if span == 0 {
            1.0
        } else {
            span as f64
        }
    }

    pub fn x(&self, instant: DateTime<Utc>) -> f64 {
        let g = &self.geometry;
        let offset = (instant - self.min_time).num_milliseconds() as f64;
        let x = g.margins.left + offset / self.time_span_ms() * g.drawable_width();
        x.min(g.max_drawable_x())
    }

    pub fn y(&self, height_ft: f64) -> f64 {
        let g = &self.geometry;
        let plot = g.plot_height();
        g.margins.top + plot - (height_ft - self.min_height as f64) / self.height_span() * plot
    }

    /// Five evenly spaced instants across the time domain, ends included.
    pub fn x_ticks(&self) -> Vec<DateTime<Utc>> {
        let span = (self.max_time - self.min_time).num_milliseconds() as f64;
        let steps = (X_TICK_COUNT - 1) as f64;
        (0..X_TICK_COUNT)
            .map(|i| {
                let offset = (span * i as f64 / steps).round() as i64;
                self.min_time + Duration::milliseconds(offset)
            })
            .collect()
    }

    /// Whole-foot ticks from the snapped minimum up to the snapped maximum.
    ///
    /// Every foot gets a tick while that stays within [`MAX_Y_TICKS`];
    /// wider ranges step by a whole number of feet instead.
    pub fn y_ticks(&self) -> Vec<i64> {
        let span = self.max_height.saturating_sub(self.min_height);
        let intervals = MAX_Y_TICKS as i64 - 1;
        let step = (span / intervals + i64::from(span % intervals != 0)).max(1);
        std::iter::successors(Some(self.min_height), |h| h.checked_add(step))
            .take_while(|h| *h <= self.max_height)
            .collect()
    }

    /// x of the "now" marker, or `None` once `now` has left the time domain.
    pub fn now_x(&self, now: DateTime<Utc>) -> Option<f64> {
        (self.min_time <= now && now <= self.max_time).then(|| self.x(now))
    }
}
