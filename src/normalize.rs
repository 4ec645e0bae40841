//! # Tide Record Normalizer
//!
//! Converts raw `{time, height}` predictions into a [`TideSeries`] sorted by
//! absolute instant. Any malformed record aborts the whole batch: a partial
//! series would silently shift extrema and the chart domain.

use crate::zones::SourceZone;
use crate::{RawHeight, TideData, TidePoint, TidePrediction, TideSeries};
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Accepted layouts for naive prediction timestamps.
///
/// NOAA's `datagetter` uses the first; the rest cover hand-made fixtures
/// and other feeds.
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Largest believable height magnitude. Anything beyond is a feed sentinel
/// or a unit mix-up, and would blow up the chart's integer tick range.
pub const MAX_ABS_HEIGHT_FT: f64 = 1000.0;

/// A raw record that could not be turned into a [`TidePoint`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("record {index}: unparsable time {value:?}")]
    BadTime { index: usize, value: String },

    #[error("record {index}: invalid height {value:?}")]
    BadHeight { index: usize, value: String },
}

/// Parse a naive timestamp and resolve it in `zone`.
pub fn parse_time(value: &str, zone: SourceZone) -> Option<DateTime<Utc>> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(|naive| zone.resolve(naive))
}

/// Parse a height in feet. Non-finite values and anything beyond
/// [`MAX_ABS_HEIGHT_FT`] are rejected.
pub fn parse_height(raw: &RawHeight) -> Option<f64> {
    let value = match raw {
        RawHeight::Number(n) => *n,
        RawHeight::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value.abs() <= MAX_ABS_HEIGHT_FT).then_some(value)
}

/// Normalize raw predictions into a chronologically sorted series.
///
/// The sort is stable, so records sharing an instant keep their input order.
pub fn normalize(records: &[TidePrediction], zone: SourceZone) -> Result<TideSeries, ParseError> {
    let mut points = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let height_ft = parse_height(&record.height).ok_or_else(|| ParseError::BadHeight {
            index,
            value: match &record.height {
                RawHeight::Number(n) => n.to_string(),
                RawHeight::Text(s) => s.clone(),
            },
        })?;
        let instant = parse_time(&record.time, zone).ok_or_else(|| ParseError::BadTime {
            index,
            value: record.time.clone(),
        })?;
        points.push(TidePoint { instant, height_ft });
    }

    points.sort_by_key(|p| p.instant);
    debug!(count = points.len(), zone = %zone, "normalized tide predictions");

    Ok(TideSeries {
        points,
        offline: false,
    })
}

/// Normalize a [`TideData`] batch, keeping its offline flag.
pub fn normalize_data(data: &TideData, zone: SourceZone) -> Result<TideSeries, ParseError> {
    let mut series = normalize(&data.predictions, zone)?;
    series.offline = data.offline;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sorts_by_instant() {
        let records = vec![
            TidePrediction::new("2025-07-24 02:00", "1.5"),
            TidePrediction::new("2025-07-24 00:00", "3.0"),
            TidePrediction::new("2025-07-24 01:00", 2.25),
        ];
        let series = normalize(&records, SourceZone::GMT).unwrap();

        let heights: Vec<f64> = series.points.iter().map(|p| p.height_ft).collect();
        assert_eq!(heights, vec![3.0, 2.25, 1.5]);
        for w in series.points.windows(2) {
            assert!(w[0].instant <= w[1].instant);
        }
        assert_eq!(
            series.points[0].instant,
            Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn duplicate_instants_keep_input_order() {
        let records = vec![
            TidePrediction::new("2025-07-24 01:00", "9.0"),
            TidePrediction::new("2025-07-24 00:00", "1.0"),
            TidePrediction::new("2025-07-24 01:00", "2.0"),
            TidePrediction::new("2025-07-24 01:00", "3.0"),
        ];
        let series = normalize(&records, SourceZone::GMT).unwrap();
        let heights: Vec<f64> = series.points.iter().map(|p| p.height_ft).collect();
        assert_eq!(heights, vec![1.0, 9.0, 2.0, 3.0]);
    }

    #[test]
    fn source_zone_shifts_instants() {
        let records = vec![TidePrediction::new("2025-07-24 09:00", 1.0)];
        let eastern: SourceZone = "America/New_York".parse().unwrap();
        let series = normalize(&records, eastern).unwrap();
        assert_eq!(
            series.points[0].instant,
            Utc.with_ymd_and_hms(2025, 7, 24, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_non_numeric_height() {
        let records = vec![
            TidePrediction::new("2025-07-24 00:00", "1.0"),
            TidePrediction::new("2025-07-24 01:00", "high"),
        ];
        let err = normalize(&records, SourceZone::GMT).unwrap_err();
        assert_eq!(
            err,
            ParseError::BadHeight {
                index: 1,
                value: "high".into()
            }
        );
    }

    #[test]
    fn rejects_nan_height() {
        let records = vec![TidePrediction::new("2025-07-24 00:00", "NaN")];
        assert!(matches!(
            normalize(&records, SourceZone::GMT),
            Err(ParseError::BadHeight { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_sentinel_heights() {
        let records = vec![
            TidePrediction::new("2025-07-24 00:00", "2.0"),
            TidePrediction::new("2025-07-24 01:00", 1e18),
        ];
        assert!(matches!(
            normalize(&records, SourceZone::GMT),
            Err(ParseError::BadHeight { index: 1, .. })
        ));
        assert_eq!(parse_height(&"-99999999".into()), None);
        assert_eq!(parse_height(&RawHeight::Number(-1000.0)), Some(-1000.0));
    }

    #[test]
    fn rejects_bad_time() {
        let records = vec![TidePrediction::new("yesterday at noon", "1.0")];
        assert!(matches!(
            normalize(&records, SourceZone::GMT),
            Err(ParseError::BadTime { index: 0, .. })
        ));
    }

    #[test]
    fn accepts_alternate_layouts() {
        for value in [
            "2025-07-24 13:00:00",
            "2025-07-24T13:00",
            "2025/07/24 13:00",
            "07/24/2025 13:00",
            "  2025-07-24 13:00 ",
        ] {
            assert_eq!(
                parse_time(value, SourceZone::GMT),
                Some(Utc.with_ymd_and_hms(2025, 7, 24, 13, 0, 0).unwrap()),
                "layout {value:?}"
            );
        }
    }

    #[test]
    fn empty_input_is_empty_series() {
        let series = normalize(&[], SourceZone::GMT).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn offline_flag_is_carried() {
        let data = TideData {
            predictions: vec![TidePrediction::new("2025-07-24 00:00", 1.0)],
            offline: true,
        };
        assert!(normalize_data(&data, SourceZone::GMT).unwrap().offline);
    }
}
