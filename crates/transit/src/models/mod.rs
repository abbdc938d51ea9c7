//! Transit data models, types, and traits.

pub mod calendar;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use calendar::{weekday_name, weekday_rank, HourBucket, WEEKDAY_ORDER};
pub use traits::TransitDataSource;
pub use types::{Ping, Result, StopGeometry, TransitError};
