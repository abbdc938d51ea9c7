//! Hour-of-day buckets and the weekday order used for reporting.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Timelike, Weekday};

use crate::models::types::{Result, TransitError};

/// Weekdays in reporting order. Sunday leads, matching the local calendar
/// rather than ISO or alphabetical order.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Position of a weekday in [`WEEKDAY_ORDER`].
pub fn weekday_rank(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

#[cfg(feature = "serde")]
pub(crate) fn serialize_weekday<S: serde::Serializer>(
    weekday: &Weekday,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*weekday))
}

/// One hour of the day, written `"HH:00"` (24-hour clock, zero-padded).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourBucket(u8);

impl HourBucket {
    pub fn new(hour: u32) -> Result<Self> {
        if hour > 23 {
            return Err(TransitError::InvalidHour(format!("{:02}:00", hour)));
        }
        Ok(Self(hour as u8))
    }

    /// Bucket of a timestamp, read in the timestamp's own zone.
    pub fn of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self(timestamp.hour() as u8)
    }

    pub fn hour(&self) -> u32 {
        self.0 as u32
    }
}

impl FromStr for HourBucket {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TransitError::InvalidHour(s.to_string());

        let (hour, minutes) = s.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minutes != "00" || !hour.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        Self::new(hour).map_err(|_| invalid())
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HourBucket {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
