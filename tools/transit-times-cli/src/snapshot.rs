use anyhow::{Context, Result};
use chrono::DateTime;
use geo::Point;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use transit_times::{Ping, RouteIdentifier, StaticDataSource, StopGeometry};

/// Materialized working set: stop catalog plus ping history
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub stops: Vec<StopRow>,
    #[serde(default)]
    pub positions: Vec<PositionRow>,
}

/// One stop of a route, GTFS column names
#[derive(Debug, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    pub route_id: String,
    #[serde(default)]
    pub stop_name: Option<String>,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub stop_sequence: u32,
}

/// One GPS ping. Also accepts the short column names of the raw
/// bus_position feed (`p`, `ta`, `py`, `px`).
#[derive(Debug, Deserialize)]
pub struct PositionRow {
    pub route_id: String,
    #[serde(alias = "p")]
    pub track_id: String,
    /// RFC 3339 timestamp with offset
    #[serde(alias = "ta")]
    pub timestamp: String,
    #[serde(alias = "py")]
    pub lat: f64,
    #[serde(alias = "px")]
    pub lon: f64,
}

/// Read a snapshot JSON file
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let snapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(snapshot)
}

impl Snapshot {
    /// Convert rows into an in-memory data source
    pub fn into_source(self) -> Result<StaticDataSource> {
        let stops: Vec<StopGeometry> = self
            .stops
            .into_iter()
            .map(|row| {
                let stop = StopGeometry::new(
                    row.stop_id,
                    row.route_id,
                    Point::new(row.stop_lon, row.stop_lat),
                    row.stop_sequence,
                );
                match row.stop_name {
                    Some(name) => stop.with_name(name),
                    None => stop,
                }
            })
            .collect();

        let pings = self
            .positions
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let timestamp = DateTime::parse_from_rfc3339(&row.timestamp).with_context(|| {
                    format!("Position {} has an invalid timestamp: {:?}", i, row.timestamp)
                })?;
                let ping = Ping::new(row.track_id, timestamp, Point::new(row.lon, row.lat));
                Ok::<_, anyhow::Error>((RouteIdentifier::new(row.route_id), ping))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StaticDataSource::from_data(stops, pings))
    }
}
