//! # transit-times
//!
//! Running-time statistics between bus stops, derived from historical GPS
//! pings.
//!
//! ## Features
//!
//! - **Explicit time zone**: every ping is normalized to one civil zone before
//!   hour and weekday bucketing
//! - **Crossing detection**: R-tree backed bounding-rectangle test with linear
//!   interpolation of the passing instant
//! - **Fragment stitching**: crossings are paired across segment boundaries
//!   when track ids change mid-route
//! - **Pluggable retrieval**: implement [`TransitDataSource`] over your own
//!   store, or use the in-memory [`StaticDataSource`]
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc, Weekday};
//! use geo::Point;
//! use transit_times::prelude::*;
//!
//! let route = RouteIdentifier::new("8000-10");
//! let stops = vec![
//!     StopGeometry::new("s1", route.clone(), Point::new(-46.6400, -23.5500), 1),
//!     StopGeometry::new("s2", route.clone(), Point::new(-46.6300, -23.5450), 2),
//! ];
//!
//! // One bus passing both stops on a Monday morning (08:00 in Sao Paulo)
//! let start = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
//! let pings = [
//!     (0, -46.6410, -23.5510),
//!     (180, -46.6390, -23.5490),
//!     (360, -46.6210, -23.5410),
//! ]
//! .into_iter()
//! .map(|(s, lon, lat)| {
//!     (route.clone(), Ping::new("11031", start + TimeDelta::seconds(s), Point::new(lon, lat)))
//! });
//!
//! let source = StaticDataSource::from_data(stops, pings);
//! let query = TransitTimeQuery::new("8000-10", "s1", "s2", "08:00").unwrap();
//! let table = estimate_transit_times(&source, &query, &EngineConfig::default()).unwrap();
//!
//! assert_eq!(table.rows.len(), 1);
//! assert_eq!(table.rows[0].weekday, Weekday::Mon);
//! assert!((table.rows[0].mean_duration_minutes - 3.0).abs() < 1e-6);
//! ```

pub mod estimation;
pub mod identifiers;
pub mod models;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::estimation::{
        estimate_transit_times, estimate_with_profile, hourly_profile, EngineConfig, HourlyDuration,
        PredecessorPolicy, TransitTimeQuery, TransitTimeTable, WeekdayDuration,
    };
    pub use crate::identifiers::*;
    pub use crate::models::{calendar::*, traits::*, types::*};
    pub use crate::provider::StaticDataSource;
}

pub use prelude::*;
