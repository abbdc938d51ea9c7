//! In-memory data source backed by a materialized snapshot.
//!
//! Stores the stop catalog and ping history grouped by route so that each
//! query gets its own copy of the working set.

use std::collections::HashMap;
use std::sync::Arc;

use crate::identifiers::*;
use crate::models::{traits::*, types::*};

/// In-memory data source with per-route lookup maps
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone, Debug, Default)]
pub struct StaticDataSource {
    stops: HashMap<RouteIdentifier, Arc<[StopGeometry]>>,
    pings: HashMap<RouteIdentifier, Arc<[Ping]>>,
}

impl StaticDataSource {
    /// Create a new empty data source
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a data source from raw rows.
    ///
    /// Stops are grouped by their own `route_id`; pings carry no route, so
    /// they come paired with the route they were recorded on.
    pub fn from_data(
        stops: Vec<StopGeometry>,
        pings: impl IntoIterator<Item = (RouteIdentifier, Ping)>,
    ) -> Self {
        let mut stop_groups: HashMap<RouteIdentifier, Vec<StopGeometry>> = HashMap::new();
        for stop in stops {
            stop_groups.entry(stop.route_id.clone()).or_default().push(stop);
        }

        let mut ping_groups: HashMap<RouteIdentifier, Vec<Ping>> = HashMap::new();
        for (route_id, ping) in pings {
            ping_groups.entry(route_id).or_default().push(ping);
        }

        Self {
            stops: stop_groups
                .into_iter()
                .map(|(route, stops)| (route, stops.into()))
                .collect(),
            pings: ping_groups
                .into_iter()
                .map(|(route, pings)| (route, pings.into()))
                .collect(),
        }
    }

    pub fn route_count(&self) -> usize {
        let mut routes: Vec<&RouteIdentifier> = self.stops.keys().chain(self.pings.keys()).collect();
        routes.sort();
        routes.dedup();
        routes.len()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.values().map(|p| p.len()).sum()
    }
}

impl TransitDataSource for StaticDataSource {
    fn stops_for_route(&self, route_id: &RouteIdentifier) -> Vec<StopGeometry> {
        self.stops
            .get(route_id)
            .map(|stops| stops.to_vec())
            .unwrap_or_default()
    }

    fn pings_for_route(&self, route_id: &RouteIdentifier) -> Vec<Ping> {
        self.pings
            .get(route_id)
            .map(|pings| pings.to_vec())
            .unwrap_or_default()
    }
}
