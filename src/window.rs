//! Analysis window selection: the ±12 hour span that gets charted.

use crate::{TidePoint, TideSeries};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Half-width of the analysis window in hours
pub const HALF_SPAN_HOURS: i64 = 12;

/// Symmetric window `[now - 12h, now + 12h]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn around(now: DateTime<Utc>) -> Self {
        let half = Duration::hours(HALF_SPAN_HOURS);
        Self {
            begin: now - half,
            end: now + half,
        }
    }

    /// Inclusive of both boundary instants.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.begin <= instant && instant <= self.end
    }

    /// Points of `series` inside the window, in their original order.
    ///
    /// An empty result is the normal "nothing to chart" outcome.
    pub fn select(&self, series: &TideSeries) -> TideSeries {
        let points: Vec<TidePoint> = series
            .points
            .iter()
            .filter(|p| self.contains(p.instant))
            .copied()
            .collect();
        debug!(
            kept = points.len(),
            dropped = series.len() - points.len(),
            "selected analysis window"
        );
        TideSeries {
            points,
            offline: series.offline,
        }
    }
}
