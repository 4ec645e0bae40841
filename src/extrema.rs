//! # Next High / Low Tide Detection
//!
//! Scans the full sorted series (not the chart window, so points near the
//! window edge still have both neighbours) for the first local maximum and
//! the first local minimum strictly after `now`.
//!
//! Only strict inequalities qualify. A point equal to either neighbour is
//! neither a high nor a low, so a plateau of three or more equal heights
//! yields no extremum at all.

use crate::TidePoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Next high and low tide after the reference instant.
///
/// A `None` field means no such tide was found in the available data; it is
/// not an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    pub next_high: Option<TidePoint>,
    pub next_low: Option<TidePoint>,
}

impl Extrema {
    pub fn is_empty(&self) -> bool {
        self.next_high.is_none() && self.next_low.is_none()
    }
}

/// Find the first local maximum and minimum after `now`.
///
/// `points` must be in chronological order. Fewer than three points always
/// yield an empty result.
pub fn find_next(points: &[TidePoint], now: DateTime<Utc>) -> Extrema {
    let mut result = Extrema::default();
    if points.len() < 3 {
        return result;
    }

    for i in 1..points.len() - 1 {
        let cur = points[i];
        if cur.instant <= now {
            continue;
        }
        let prev = points[i - 1].height_ft;
        let next = points[i + 1].height_ft;

        if result.next_high.is_none() && cur.height_ft > prev && cur.height_ft > next {
            result.next_high = Some(cur);
        }
        if result.next_low.is_none() && cur.height_ft < prev && cur.height_ft < next {
            result.next_low = Some(cur);
        }
        if result.next_high.is_some() && result.next_low.is_some() {
            break;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap()
    }

    fn series(heights: &[f64]) -> Vec<TidePoint> {
        heights
            .iter()
            .enumerate()
            .map(|(h, &ft)| TidePoint::new(t0() + Duration::hours(h as i64), ft))
            .collect()
    }

    #[test]
    fn finds_first_high_and_low_after_now() {
        let points = series(&[3.0, 3.0, 6.0, 2.0, 5.5]);
        let now = t0() + Duration::minutes(90);

        let result = find_next(&points, now);
        assert_eq!(result.next_high, Some(points[2]));
        assert_eq!(result.next_low, Some(points[3]));
    }

    #[test]
    fn ignores_extrema_at_or_before_now() {
        let points = series(&[1.0, 5.0, 1.0, 6.0, 0.5, 7.0]);
        // index 1 high and index 2 low are not after now
        let now = t0() + Duration::hours(2);

        let result = find_next(&points, now);
        assert_eq!(result.next_high, Some(points[3]));
        assert_eq!(result.next_low, Some(points[4]));
    }

    #[test]
    fn first_qualifying_extremum_wins() {
        let points = series(&[1.0, 4.0, 2.0, 8.0, 0.0, 9.0]);
        let now = t0();

        let result = find_next(&points, now);
        assert_eq!(result.next_high.unwrap().height_ft, 4.0);
        assert_eq!(result.next_low.unwrap().height_ft, 2.0);
    }

    #[test]
    fn short_series_has_no_extrema() {
        let now = t0() - Duration::hours(1);
        assert!(find_next(&[], now).is_empty());
        assert!(find_next(&series(&[1.0]), now).is_empty());
        assert!(find_next(&series(&[1.0, 2.0]), now).is_empty());
    }

    #[test]
    fn plateaus_are_not_extrema() {
        let points = series(&[1.0, 4.0, 4.0, 1.0, 1.0, 1.0, 3.0]);
        let result = find_next(&points, t0() - Duration::hours(1));
        assert!(result.is_empty());
    }

    #[test]
    fn endpoints_are_never_extrema() {
        let points = series(&[9.0, 5.0, 4.0, 3.0, 0.0]);
        assert!(find_next(&points, t0() - Duration::hours(1)).is_empty());
    }

    #[test]
    fn result_never_equals_a_neighbour() {
        let heights = [2.0, 2.0, 3.0, 3.0, 1.0, 2.0, 2.0, 4.0, 1.0, 1.0];
        let points = series(&heights);
        let result = find_next(&points, t0() - Duration::hours(1));

        for found in [result.next_high, result.next_low].into_iter().flatten() {
            let i = points.iter().position(|p| *p == found).unwrap();
            assert_ne!(points[i - 1].height_ft, found.height_ft);
            assert_ne!(points[i + 1].height_ft, found.height_ft);
        }
        assert_eq!(result.next_high, Some(points[7]));
        assert_eq!(result.next_low, Some(points[4]));
    }

    #[test]
    fn only_high_found_before_series_ends() {
        let points = series(&[1.0, 2.0, 5.0, 3.0, 2.5]);
        let result = find_next(&points, t0());
        assert_eq!(result.next_high, Some(points[2]));
        assert!(result.next_low.is_none());
    }
}
