//! Entry points: one query in, one table out.
//!
//! Every call loads its own working set from the data source and derives
//! everything else locally. Nothing is cached between calls.

use crate::estimation::aggregate::{
    collect_samples, durations_for_hour, group_by_hour_and_weekday, HourlyDuration,
    WeekdayDuration,
};
use crate::estimation::config::EngineConfig;
use crate::estimation::crossing::CrossingDetector;
use crate::estimation::resolver::SequenceResolver;
use crate::estimation::track::{build_tracks, normalize_pings};
use crate::identifiers::*;
use crate::models::{calendar::HourBucket, traits::TransitDataSource, types::*};

/// Travel time between two stops of a route, at one hour of the day
#[derive(Clone, Debug, PartialEq)]
pub struct TransitTimeQuery {
    pub route_id: RouteIdentifier,
    pub first_stop: StopIdentifier,
    pub second_stop: StopIdentifier,
    pub hour: HourBucket,
}

impl TransitTimeQuery {
    /// `hour` is written `"HH:00"`.
    pub fn new(
        route_id: impl Into<RouteIdentifier>,
        first_stop: impl Into<StopIdentifier>,
        second_stop: impl Into<StopIdentifier>,
        hour: &str,
    ) -> Result<Self> {
        Ok(Self {
            route_id: route_id.into(),
            first_stop: first_stop.into(),
            second_stop: second_stop.into(),
            hour: hour.parse()?,
        })
    }
}

/// Mean travel time per weekday for the queried hour
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransitTimeTable {
    pub route_id: RouteIdentifier,
    pub first_stop: StopIdentifier,
    pub second_stop: StopIdentifier,
    pub first_stop_name: Option<String>,
    pub second_stop_name: Option<String>,
    pub hour: HourBucket,
    /// Sunday first; weekdays without samples are absent
    pub rows: Vec<WeekdayDuration>,
}

impl TransitTimeTable {
    fn empty(query: &TransitTimeQuery) -> Self {
        Self {
            route_id: query.route_id.clone(),
            first_stop: query.first_stop.clone(),
            second_stop: query.second_stop.clone(),
            first_stop_name: None,
            second_stop_name: None,
            hour: query.hour,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Chart title, naming both stops
    pub fn title(&self) -> String {
        format!(
            "Time it takes from {} and {}",
            self.first_stop_name.as_deref().unwrap_or(self.first_stop.as_str()),
            self.second_stop_name.as_deref().unwrap_or(self.second_stop.as_str()),
        )
    }
}

/// Stop rows of the two queried stops, ordered by `stop_sequence`, with
/// duplicate `(stop, sequence)` rows removed.
///
/// Fails with [`TransitError::MissingGeometry`] unless both stops resolve on
/// the route, and with [`TransitError::InvalidData`] on non-finite
/// coordinates.
pub fn select_stops(stops: Vec<StopGeometry>, query: &TransitTimeQuery) -> Result<Vec<StopGeometry>> {
    let mut selected: Vec<StopGeometry> = stops
        .into_iter()
        .filter(|s| s.stop_id == query.first_stop || s.stop_id == query.second_stop)
        .collect();

    if let Some(bad) = selected
        .iter()
        .find(|s| !(s.lon().is_finite() && s.lat().is_finite()))
    {
        return Err(TransitError::InvalidData(format!(
            "stop {} has non-finite coordinates",
            bad.stop_id
        )));
    }

    selected.sort_by_key(|s| s.stop_sequence);
    selected.dedup_by(|a, b| a.stop_id == b.stop_id && a.stop_sequence == b.stop_sequence);

    let found = [&query.first_stop, &query.second_stop]
        .iter()
        .filter(|id| selected.iter().any(|s| s.stop_id == ***id))
        .count();
    if found < 2 {
        return Err(TransitError::MissingGeometry {
            route: query.route_id.clone(),
            found,
        });
    }

    Ok(selected)
}

/// Mean duration for every `(hour, weekday)` with samples, before any hour
/// filter. An unresolvable stop pair gives an empty profile.
pub fn hourly_profile(
    source: &dyn TransitDataSource,
    query: &TransitTimeQuery,
    config: &EngineConfig,
) -> Result<Vec<HourlyDuration>> {
    let stops = source.stops_for_route(&query.route_id);
    profile_from_stops(source, query, config, stops)
}

fn profile_from_stops(
    source: &dyn TransitDataSource,
    query: &TransitTimeQuery,
    config: &EngineConfig,
    stops: Vec<StopGeometry>,
) -> Result<Vec<HourlyDuration>> {
    let _span = tracing::debug_span!(
        "hourly_profile",
        first_stop = %query.first_stop,
        second_stop = %query.second_stop,
    )
    .entered();

    let stops = match select_stops(stops, query) {
        Ok(stops) => stops,
        Err(err @ TransitError::MissingGeometry { .. }) => {
            tracing::warn!("{err}, returning an empty result");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let pings = source.pings_for_route(&query.route_id);
    let tracks = build_tracks(normalize_pings(&pings, config.time_zone));
    tracing::debug!(
        pings = pings.len(),
        tracks = tracks.len(),
        stop_rows = stops.len(),
        "built position tracks"
    );

    let detector = CrossingDetector::new(&tracks);
    let crossings = detector.detect_all(&stops);
    tracing::debug!(
        segments = detector.segment_count(),
        crossings = crossings.len(),
        "detected stop crossings"
    );

    let pairs = SequenceResolver::new(&crossings, config.predecessor).resolve();
    let samples = collect_samples(&pairs, config.max_duration_minutes);

    Ok(group_by_hour_and_weekday(&samples))
}

/// Mean travel time between the queried stops on each weekday, at the
/// queried hour.
///
/// A table with no rows is a valid answer: the stops may not resolve, or no
/// sample may survive filtering.
pub fn estimate_transit_times(
    source: &dyn TransitDataSource,
    query: &TransitTimeQuery,
    config: &EngineConfig,
) -> Result<TransitTimeTable> {
    estimate_with_profile(source, query, config).map(|(table, _)| table)
}

/// [`estimate_transit_times`] together with the [`hourly_profile`] the table
/// was cut from, computed in one pass.
pub fn estimate_with_profile(
    source: &dyn TransitDataSource,
    query: &TransitTimeQuery,
    config: &EngineConfig,
) -> Result<(TransitTimeTable, Vec<HourlyDuration>)> {
    let _span = tracing::info_span!(
        "estimate_transit_times",
        route = %query.route_id,
        hour = %query.hour,
    )
    .entered();

    let stops = source.stops_for_route(&query.route_id);
    let name_of = |id: &StopIdentifier| {
        stops
            .iter()
            .find(|s| &s.stop_id == id)
            .and_then(|s| s.name.as_deref().map(str::to_string))
    };

    let mut table = TransitTimeTable::empty(query);
    table.first_stop_name = name_of(&query.first_stop);
    table.second_stop_name = name_of(&query.second_stop);

    let profile = profile_from_stops(source, query, config, stops)?;
    table.rows = durations_for_hour(&profile, query.hour);

    tracing::debug!(rows = table.rows.len(), "estimated transit times");
    Ok((table, profile))
}
