//! # Fallback Tide Model
//!
//! When NOAA can't be reached the frame still needs a plausible tide curve.
//! This module synthesizes hourly raw predictions with a two-constituent
//! equilibrium model and marks them offline, so the frame shows an OFFLINE
//! badge instead of going blank.
//!
//! ## Model Characteristics
//!
//! - **M2** (principal lunar, 12.42 h): the semidiurnal backbone
//! - **S2** (principal solar, 12.00 h): beats against M2 to give the
//!   spring–neap envelope, largest near new and full moon
//! - **Mean level**: 5.0 ft above chart datum, amplitudes from Portland, ME harmonics
//!
//! The phase of S2 relative to M2 is taken from the moon's age, measured
//! from a known new moon with the mean synodic month. That is accurate to
//! about a day, which is plenty for a placeholder curve.
//!
//! The output goes through the same normalizer as live data: naive GMT
//! strings, one per hour, from 13 hours before the current hour to 13 hours
//! after it. That covers the ±12 h window with a neighbour on each side.

use crate::{TideData, TidePrediction};
use chrono::{DateTime, Duration, DurationRound, Utc};
use std::f64::consts::TAU;

/// Lunar M2 amplitude for Portland, ME (ft)
const A_M2: f64 = 4.51;
const P_M2_HRS: f64 = 12.42;

/// Solar S2 amplitude for Portland, ME (ft)
const A_S2: f64 = 0.68;

/// High-water interval (moon transit → local high water) ≈ 3 h 35 m
const LUNITIDAL_OFFSET_HRS: f64 = 3.59;

const MEAN_LEVEL_FT: f64 = 5.0;

const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// Hours generated on each side of the current hour
const SPAN_HOURS: i64 = 13;

/// New moon of 2000-01-06 18:14 UTC, the usual epoch for mean lunations
const REFERENCE_NEW_MOON_UNIX: i64 = 947_182_440;

/// Moon age in days since the last mean new moon.
fn moon_age_days(at: DateTime<Utc>) -> f64 {
    let days = (at.timestamp() - REFERENCE_NEW_MOON_UNIX) as f64 / 86_400.0;
    days.rem_euclid(SYNODIC_MONTH_DAYS)
}

/// Lunation fraction at `at`: 0 new, 0.5 full, approaching 1 at the next new moon.
///
/// Rounded to two places, the resolution OpenWeather reports `moon_phase` at.
pub fn moon_phase_fraction(at: DateTime<Utc>) -> f64 {
    (moon_age_days(at) / SYNODIC_MONTH_DAYS * 100.0).round() / 100.0
}

/// Model tide height at an instant.
pub fn height_at(at: DateTime<Utc>) -> f64 {
    let hours = at.timestamp() as f64 / 3600.0 + LUNITIDAL_OFFSET_HRS;
    let theta_m2 = hours / P_M2_HRS * TAU;
    // S2 leads M2 by twice the moon's phase angle, which also makes it
    // advance at the solar semidiurnal rate
    let moon_phase = moon_age_days(at) / SYNODIC_MONTH_DAYS * TAU;
    let theta_s2 = theta_m2 + 2.0 * moon_phase;

    MEAN_LEVEL_FT + A_M2 * theta_m2.sin() + A_S2 * theta_s2.sin()
}

/// Synthesize hourly predictions around `now`, flagged offline.
pub fn approximate(now: DateTime<Utc>) -> TideData {
    let hour = now
        .duration_trunc(Duration::hours(1))
        .unwrap_or(now);
    let start = hour - Duration::hours(SPAN_HOURS);

    let predictions = (0..=2 * SPAN_HOURS)
        .map(|h| {
            let t = start + Duration::hours(h);
            let ft = (height_at(t) * 1000.0).round() / 1000.0;
            TidePrediction::new(t.format("%Y-%m-%d %H:%M").to_string(), ft)
        })
        .collect();

    TideData {
        predictions,
        offline: true,
    }
}
