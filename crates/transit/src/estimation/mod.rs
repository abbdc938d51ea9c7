//! Transit-time estimation from historical GPS pings.
//!
//! Pipeline, leaves first:
//!
//! - [`track`]: pings normalized to the local zone and grouped into
//!   per-vehicle tracks
//! - [`crossing`]: instants at which a track's segments pass a stop
//! - [`resolver`]: each crossing paired with a crossing of the previous stop
//! - [`aggregate`]: durations filtered and averaged per hour and weekday
//! - [`engine`]: query entry points tying the stages together

pub mod aggregate;
pub mod config;
pub mod crossing;
pub mod engine;
pub mod resolver;
pub mod track;

pub use aggregate::{DurationSample, HourlyDuration, WeekdayDuration};
pub use config::{EngineConfig, PredecessorPolicy};
pub use crossing::{Crossing, CrossingDetector};
pub use engine::{
    estimate_transit_times, estimate_with_profile, hourly_profile, select_stops, TransitTimeQuery,
    TransitTimeTable,
};
pub use resolver::{Resolution, ResolvedPair, SequenceResolver};
pub use track::{LocalPing, PositionTrack, Segment};
