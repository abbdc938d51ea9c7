//! Core input records and errors for transit-time estimation.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone};
use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Data Structures
// ============================================================================

/// One GPS position report from a vehicle.
///
/// Locations follow the `geo` convention: `x` is longitude, `y` is latitude.
/// The timestamp keeps whatever offset it was recorded with; the civil zone
/// used for hour/weekday bucketing is applied later, explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct Ping {
    pub track_id: TrackIdentifier,
    pub timestamp: DateTime<FixedOffset>,
    pub location: Point,
}

impl Ping {
    pub fn new<Tz: TimeZone>(
        track_id: impl Into<TrackIdentifier>,
        timestamp: DateTime<Tz>,
        location: Point,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            timestamp: timestamp.fixed_offset(),
            location,
        }
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }

    /// Pings with NaN or infinite coordinates can't take part in any
    /// geometric test.
    pub fn is_finite(&self) -> bool {
        self.location.x().is_finite() && self.location.y().is_finite()
    }
}

/// A stop of a route, with its ordinal position along that route.
///
/// `stop_sequence` is 1-based and its ordering gives the direction of travel.
#[derive(Clone, Debug, PartialEq)]
pub struct StopGeometry {
    pub stop_id: StopIdentifier,
    pub route_id: RouteIdentifier,
    pub name: Option<Arc<str>>,
    pub location: Point,
    pub stop_sequence: u32,
}

impl StopGeometry {
    pub fn new(
        stop_id: impl Into<StopIdentifier>,
        route_id: impl Into<RouteIdentifier>,
        location: Point,
        stop_sequence: u32,
    ) -> Self {
        Self {
            stop_id: stop_id.into(),
            route_id: route_id.into(),
            name: None,
            location,
            stop_sequence,
        }
    }

    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(name.as_ref().into());
        self
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }

    /// Display label: the stop name when known, otherwise its id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.stop_id.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Missing stop geometry on route {route}: {found} of the 2 requested stops resolved")]
    MissingGeometry { route: RouteIdentifier, found: usize },

    #[error("Invalid hour bucket: {0:?} (expected \"HH:00\")")]
    InvalidHour(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    #[test]
    fn test_ping_keeps_instant_across_zones() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        let local = utc.with_timezone(&chrono_tz::America::Sao_Paulo);

        let from_utc = Ping::new("11031", utc, Point::new(-46.63, -23.55));
        let from_local = Ping::new("11031", local, Point::new(-46.63, -23.55));

        assert_eq!(from_utc.timestamp, from_local.timestamp);
        assert_eq!(from_local.timestamp.hour(), 8);
        assert_eq!(from_utc.lat(), -23.55);
        assert_eq!(from_utc.lon(), -46.63);
    }

    #[test]
    fn test_ping_finite_check() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        assert!(Ping::new("1", t, Point::new(0.0, 0.0)).is_finite());
        assert!(!Ping::new("1", t, Point::new(f64::NAN, 0.0)).is_finite());
    }

    #[test]
    fn test_stop_label_falls_back_to_id() {
        let stop = StopGeometry::new("340015329", "8000-10", Point::new(-46.63, -23.55), 3);
        assert_eq!(stop.label(), "340015329");

        let named = stop.with_name("Av. Paulista, 1000");
        assert_eq!(named.label(), "Av. Paulista, 1000");
    }

    #[test]
    fn test_missing_geometry_message() {
        let err = TransitError::MissingGeometry {
            route: RouteIdentifier::new("8000-10"),
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Missing stop geometry on route 8000-10: 1 of the 2 requested stops resolved"
        );
    }
}
