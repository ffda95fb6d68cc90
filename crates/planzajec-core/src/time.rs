//! Civil calendar used to interpret upstream timestamps.
//!
//! The upstream reports every date and time as naive local values. This
//! module provides [`ScheduleCalendar`], which pins those values to one
//! named timezone and produces offset-bearing datetimes.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

/// Timezone the upstream source operates in.
pub const DEFAULT_TIMEZONE: &str = "Europe/Warsaw";

/// Format of an upstream `date time` pair.
const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Errors from interpreting local dates and times.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// The timezone name is not in the tz database.
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    /// The input does not match `YYYY-MM-DD HH:MM`.
    #[error("cannot parse {input:?} as a local date and time")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The local time falls into a DST gap.
    #[error("local time {0} does not exist in the calendar")]
    Nonexistent(NaiveDateTime),
}

/// A fixed civil calendar (one named timezone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleCalendar {
    tz: Tz,
}

impl Default for ScheduleCalendar {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Europe::Warsaw,
        }
    }
}

impl ScheduleCalendar {
    /// Loads the calendar for an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownTimezone`] if the name is not known.
    pub fn new(timezone: &str) -> Result<Self, CalendarError> {
        let tz = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| CalendarError::UnknownTimezone(timezone.to_string()))?;
        Ok(Self { tz })
    }

    /// Returns the underlying timezone.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Returns the IANA name of the timezone.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Interprets a `YYYY-MM-DD` date and an `HH:MM` time in this calendar.
    ///
    /// Ambiguous local times (DST fold) resolve to the earlier instant.
    pub fn parse_local(&self, date: &str, time: &str) -> Result<DateTime<FixedOffset>, CalendarError> {
        let input = format!("{} {}", date.trim(), time.trim());
        let naive = NaiveDateTime::parse_from_str(&input, LOCAL_DATETIME_FORMAT)
            .map_err(|source| CalendarError::Parse { input, source })?;

        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.fixed_offset())
            .ok_or(CalendarError::Nonexistent(naive))
    }

    /// Start of a reporting day: `00:00` local time.
    pub fn day_start(&self, date: &str) -> Result<DateTime<FixedOffset>, CalendarError> {
        self.parse_local(date, "00:00")
    }

    /// End of a reporting day: `23:59` local time.
    pub fn day_end(&self, date: &str) -> Result<DateTime<FixedOffset>, CalendarError> {
        self.parse_local(date, "23:59")
    }

    /// Converts a datetime into this calendar's local time.
    pub fn to_local(&self, dt: &DateTime<FixedOffset>) -> DateTime<Tz> {
        dt.with_timezone(&self.tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_warsaw() {
        assert_eq!(ScheduleCalendar::default().name(), DEFAULT_TIMEZONE);
        assert_eq!(
            ScheduleCalendar::new(DEFAULT_TIMEZONE).unwrap(),
            ScheduleCalendar::default()
        );
    }

    #[test]
    fn unknown_timezone_fails() {
        let err = ScheduleCalendar::new("Mars/Olympus").unwrap_err();
        assert!(matches!(err, CalendarError::UnknownTimezone(_)));
    }

    #[test]
    fn parses_summer_and_winter_offsets() {
        let calendar = ScheduleCalendar::default();

        let summer = calendar.parse_local("2024-10-07", "09:45").unwrap();
        assert_eq!(summer.to_rfc3339(), "2024-10-07T09:45:00+02:00");

        let winter = calendar.parse_local("2024-12-02", "09:45").unwrap();
        assert_eq!(winter.to_rfc3339(), "2024-12-02T09:45:00+01:00");
    }

    #[test]
    fn day_bounds() {
        let calendar = ScheduleCalendar::default();
        assert_eq!(
            calendar.day_start("2024-10-01").unwrap().to_rfc3339(),
            "2024-10-01T00:00:00+02:00"
        );
        assert_eq!(
            calendar.day_end("2025-02-28").unwrap().to_rfc3339(),
            "2025-02-28T23:59:00+01:00"
        );
    }

    #[test]
    fn rejects_malformed_input() {
        let calendar = ScheduleCalendar::default();
        assert!(matches!(
            calendar.parse_local("07.10.2024", "09:45"),
            Err(CalendarError::Parse { .. })
        ));
        assert!(calendar.parse_local("2024-10-07", "").is_err());
        assert!(calendar.parse_local("2024-10-07", "25:00").is_err());
    }

    #[test]
    fn dst_gap_is_rejected() {
        let calendar = ScheduleCalendar::default();
        assert!(matches!(
            calendar.parse_local("2025-03-30", "02:30"),
            Err(CalendarError::Nonexistent(_))
        ));
    }

    #[test]
    fn ambiguous_time_resolves_to_earliest() {
        let calendar = ScheduleCalendar::default();
        let folded = calendar.parse_local("2024-10-27", "02:30").unwrap();
        assert_eq!(folded.to_rfc3339(), "2024-10-27T02:30:00+02:00");
    }
}
