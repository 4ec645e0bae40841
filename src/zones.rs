//! Source and display time zones.
//!
//! Prediction strings carry no offset, so they are pinned to a [`SourceZone`]
//! before comparison. Labels on the frame use a [`DisplayZone`]. Keeping them
//! as separate types stops one from silently standing in for the other.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Zone used to interpret naive prediction timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceZone(Tz);

impl SourceZone {
    pub const GMT: SourceZone = SourceZone(Tz::GMT);

    /// Resolve a naive wall-clock time to an absolute instant.
    ///
    /// Returns `None` for wall-clock times skipped by a DST transition.
    /// Ambiguous times (repeated hour) resolve to the earlier instant.
    pub fn resolve(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.0
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Wall-clock time of `instant` in this zone.
    pub fn naive(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.0).naive_local()
    }
}

impl Default for SourceZone {
    fn default() -> Self {
        Self::GMT
    }
}

impl FromStr for SourceZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Tz>().map(Self).map_err(|e| e.to_string())
    }
}

impl fmt::Display for SourceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

/// Zone used for every human-readable time on the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayZone(Tz);

impl DisplayZone {
    pub const US_EASTERN: DisplayZone = DisplayZone(Tz::America__New_York);

    /// Format `instant` with a chrono format string in this zone.
    pub fn format(&self, instant: DateTime<Utc>, fmt: &str) -> String {
        instant.with_timezone(&self.0).format(fmt).to_string()
    }

    /// Hour-only label, e.g. `3 PM`.
    pub fn hour_label(&self, instant: DateTime<Utc>) -> String {
        self.format(instant, "%-I %p")
    }

    /// Hour and minute label, e.g. `3:07 PM`.
    pub fn clock_label(&self, instant: DateTime<Utc>) -> String {
        self.format(instant, "%-I:%M %p")
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::US_EASTERN
    }
}

impl FromStr for DisplayZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Tz>().map(Self).map_err(|e| e.to_string())
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn gmt_resolution_is_identity() {
        let naive = NaiveDate::from_ymd_opt(2025, 7, 24)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let instant = SourceZone::GMT.resolve(naive).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 7, 24, 13, 0, 0).unwrap());
        assert_eq!(SourceZone::GMT.naive(instant), naive);
    }

    #[test]
    fn skipped_wall_clock_time_does_not_resolve() {
        let zone: SourceZone = "America/New_York".parse().unwrap();
        // 2025-03-09 02:30 does not exist in US Eastern
        let naive = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(zone.resolve(naive).is_none());
    }

    #[test]
    fn display_labels_use_display_zone() {
        // 17:00 UTC in July is 1 PM EDT
        let instant = Utc.with_ymd_and_hms(2025, 7, 24, 17, 5, 0).unwrap();
        let zone = DisplayZone::default();
        assert_eq!(zone.hour_label(instant), "1 PM");
        assert_eq!(zone.clock_label(instant), "1:05 PM");
    }

    #[test]
    fn unknown_zone_names_are_rejected() {
        assert!("Mars/Olympus_Mons".parse::<DisplayZone>().is_err());
        assert!("Not/AZone".parse::<SourceZone>().is_err());
    }
}
