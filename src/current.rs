//! Current tide estimate: the prediction closest in time to `now`.
//!
//! This is a lookup, not interpolation. With hourly predictions the value can
//! be up to 30 minutes stale.

use crate::TidePoint;
use chrono::{DateTime, Utc};

/// Point minimizing `|instant - now|`.
///
/// Ties go to the point encountered first in `points`, whatever its order.
pub fn nearest(points: &[TidePoint], now: DateTime<Utc>) -> Option<TidePoint> {
    let now_ms = now.timestamp_millis();
    let mut best: Option<(TidePoint, u64)> = None;

    for point in points {
        let diff = point.instant.timestamp_millis().abs_diff(now_ms);
        if best.map_or(true, |(_, best_diff)| diff < best_diff) {
            best = Some((*point, diff));
        }
    }

    best.map(|(point, _)| point)
}
