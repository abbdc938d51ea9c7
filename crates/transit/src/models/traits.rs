//! Capability traits for the retrieval layer.
//!
//! The estimation engine never reaches for a global connection; callers hand
//! it a data source that answers these two lookups. Implementations can be
//! in-memory, database-backed, or remote.

use crate::identifiers::RouteIdentifier;
use crate::models::types::{Ping, StopGeometry};

/// Provider of the stop catalog and ping history of a route
pub trait TransitDataSource: Send + Sync {
    /// All stop rows of a route. A stop may appear more than once when the
    /// route's trips visit it at different sequence positions.
    fn stops_for_route(&self, route_id: &RouteIdentifier) -> Vec<StopGeometry>;

    /// Ping history recorded for a route, in no particular order.
    fn pings_for_route(&self, route_id: &RouteIdentifier) -> Vec<Ping>;
}
