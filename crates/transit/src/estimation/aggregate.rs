//! Turning resolved pairs into per-hour, per-weekday mean durations.

use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};

use crate::estimation::resolver::ResolvedPair;
use crate::models::calendar::{weekday_rank, HourBucket};

/// One kept inter-stop travel time
#[derive(Clone, Debug, PartialEq)]
pub struct DurationSample {
    pub hour_of_day: HourBucket,
    pub weekday: Weekday,
    pub duration_minutes: f64,
}

/// Mean duration of one `(hour, weekday)` group
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HourlyDuration {
    pub hour: HourBucket,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::models::calendar::serialize_weekday")
    )]
    pub weekday: Weekday,
    pub mean_duration_minutes: f64,
    pub samples: usize,
}

/// Mean duration on one weekday, within an already chosen hour
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WeekdayDuration {
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::models::calendar::serialize_weekday")
    )]
    pub weekday: Weekday,
    pub mean_duration_minutes: f64,
    pub samples: usize,
}

/// Samples from every pair with a duration strictly between zero and
/// `max_duration_minutes`. Bucketing uses the pair's logged timestamp, which
/// is already in the configured zone.
pub fn collect_samples(pairs: &[ResolvedPair], max_duration_minutes: f64) -> Vec<DurationSample> {
    let mut discarded = 0usize;
    let samples: Vec<DurationSample> = pairs
        .iter()
        .filter_map(|pair| {
            let duration = pair.duration_minutes?;
            if !(duration > 0.0 && duration < max_duration_minutes) {
                discarded += 1;
                return None;
            }
            Some(DurationSample {
                hour_of_day: HourBucket::of(&pair.logged_at),
                weekday: pair.logged_at.weekday(),
                duration_minutes: duration,
            })
        })
        .collect();

    tracing::debug!(
        kept = samples.len(),
        discarded,
        max_duration_minutes,
        "filtered duration samples"
    );
    samples
}

/// Mean duration per `(hour, weekday)`, ordered by hour and then
/// Sunday-first weekday order.
pub fn group_by_hour_and_weekday(samples: &[DurationSample]) -> Vec<HourlyDuration> {
    let mut groups: BTreeMap<(HourBucket, usize), (Weekday, f64, usize)> = BTreeMap::new();
    for sample in samples {
        let entry = groups
            .entry((sample.hour_of_day, weekday_rank(sample.weekday)))
            .or_insert((sample.weekday, 0.0, 0));
        entry.1 += sample.duration_minutes;
        entry.2 += 1;
    }

    groups
        .into_iter()
        .map(|((hour, _), (weekday, total, count))| HourlyDuration {
            hour,
            weekday,
            mean_duration_minutes: total / count as f64,
            samples: count,
        })
        .collect()
}

/// The rows of `profile` for a single hour. Empty when that hour has no
/// samples.
pub fn durations_for_hour(profile: &[HourlyDuration], hour: HourBucket) -> Vec<WeekdayDuration> {
    profile
        .iter()
        .filter(|row| row.hour == hour)
        .map(|row| WeekdayDuration {
            weekday: row.weekday,
            mean_duration_minutes: row.mean_duration_minutes,
            samples: row.samples,
        })
        .collect()
}
