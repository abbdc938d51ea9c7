//! Per-vehicle position tracks and the segments between consecutive pings.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use geo::Point;

use crate::identifiers::TrackIdentifier;
use crate::models::types::Ping;

/// A ping whose timestamp has been normalized to the transit system's zone
#[derive(Clone, Debug, PartialEq)]
pub struct LocalPing {
    pub track_id: TrackIdentifier,
    pub timestamp: DateTime<Tz>,
    pub location: Point,
}

/// Converts every ping's timestamp into `zone`.
///
/// This is the only place timestamps change zone; hour and weekday are read
/// from the result. Pings with non-finite coordinates are dropped.
pub fn normalize_pings(pings: &[Ping], zone: Tz) -> Vec<LocalPing> {
    let mut dropped = 0usize;
    let local: Vec<LocalPing> = pings
        .iter()
        .filter(|ping| {
            let keep = ping.is_finite();
            if !keep {
                dropped += 1;
            }
            keep
        })
        .map(|ping| LocalPing {
            track_id: ping.track_id.clone(),
            timestamp: ping.timestamp.with_timezone(&zone),
            location: ping.location,
        })
        .collect();

    if dropped > 0 {
        tracing::warn!(dropped, "skipped pings with non-finite coordinates");
    }
    local
}

/// The stretch between a ping and its predecessor on the same track
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Index of the later ping within its track
    pub ping_index: usize,
    pub start: Point,
    pub end: Point,
    /// Timestamp of the previous ping
    pub started_at: DateTime<Tz>,
    /// Timestamp of the ping that closes the segment
    pub logged_at: DateTime<Tz>,
}

impl Segment {
    /// Time between the two pings, in minutes
    pub fn elapsed_minutes(&self) -> f64 {
        (self.logged_at - self.started_at).num_milliseconds() as f64 / 60_000.0
    }
}

/// Pings of one vehicle run, ordered by timestamp
#[derive(Clone, Debug)]
pub struct PositionTrack {
    pub track_id: TrackIdentifier,
    pings: Vec<LocalPing>,
}

impl PositionTrack {
    /// Sorts `pings` by timestamp. Ties keep their input order.
    pub fn new(track_id: TrackIdentifier, mut pings: Vec<LocalPing>) -> Self {
        pings.sort_by_key(|ping| ping.timestamp);
        Self { track_id, pings }
    }

    pub fn pings(&self) -> &[LocalPing] {
        &self.pings
    }

    /// The immediate predecessor of the ping at `index`, if any
    pub fn previous(&self, index: usize) -> Option<&LocalPing> {
        index.checked_sub(1).and_then(|i| self.pings.get(i))
    }

    /// Segment closed by the ping at `index`. The first ping has no
    /// predecessor and closes no segment.
    pub fn segment(&self, index: usize) -> Option<Segment> {
        let previous = self.previous(index)?;
        let ping = self.pings.get(index)?;
        Some(Segment {
            ping_index: index,
            start: previous.location,
            end: ping.location,
            started_at: previous.timestamp,
            logged_at: ping.timestamp,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (1..self.pings.len()).filter_map(move |i| self.segment(i))
    }

    /// Number of pings eligible for crossing detection
    pub fn eligible_count(&self) -> usize {
        self.pings.len().saturating_sub(1)
    }
}

/// Groups pings by track id and orders each group by time.
///
/// Tracks come back sorted by id so that downstream iteration order does not
/// depend on the order pings were fetched in.
pub fn build_tracks(pings: Vec<LocalPing>) -> Vec<PositionTrack> {
    let mut groups: BTreeMap<TrackIdentifier, Vec<LocalPing>> = BTreeMap::new();
    for ping in pings {
        groups.entry(ping.track_id.clone()).or_default().push(ping);
    }

    groups
        .into_iter()
        .map(|(track_id, pings)| PositionTrack::new(track_id, pings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Timelike, Utc};
    use chrono_tz::America::Sao_Paulo;

    fn ping(track: &str, minute: u32, lon: f64, lat: f64) -> Ping {
        Ping::new(
            track,
            Utc.with_ymd_and_hms(2024, 3, 4, 11, minute, 0).unwrap(),
            Point::new(lon, lat),
        )
    }

    #[test]
    fn test_normalize_converts_zone() {
        let local = normalize_pings(&[ping("a", 0, 0.0, 0.0)], Sao_Paulo);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].timestamp.hour(), 8);
        assert_eq!(local[0].timestamp.timezone(), Sao_Paulo);
    }

    #[test]
    fn test_normalize_drops_non_finite() {
        let local = normalize_pings(
            &[ping("a", 0, f64::NAN, 0.0), ping("a", 1, 1.0, f64::INFINITY), ping("a", 2, 1.0, 1.0)],
            Sao_Paulo,
        );
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn test_build_tracks_groups_and_sorts() {
        let pings = vec![
            ping("b", 5, 5.0, 5.0),
            ping("a", 3, 3.0, 3.0),
            ping("b", 1, 1.0, 1.0),
            ping("a", 0, 0.0, 0.0),
            ping("b", 3, 3.0, 3.0),
        ];
        let tracks = build_tracks(normalize_pings(&pings, Sao_Paulo));

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_id.as_str(), "a");
        assert_eq!(tracks[1].track_id.as_str(), "b");

        let minutes: Vec<u32> = tracks[1].pings().iter().map(|p| p.timestamp.minute()).collect();
        assert_eq!(minutes, vec![1, 3, 5]);
    }

    #[test]
    fn test_predecessor_links() {
        let pings = vec![ping("a", 2, 2.0, 2.0), ping("a", 0, 0.0, 0.0), ping("a", 1, 1.0, 1.0)];
        let track = &build_tracks(normalize_pings(&pings, Sao_Paulo))[0];

        assert!(track.previous(0).is_none());
        assert!(track.segment(0).is_none());
        assert_eq!(track.previous(2).unwrap().timestamp.minute(), 1);

        let segment = track.segment(2).unwrap();
        assert_eq!(segment.start, Point::new(1.0, 1.0));
        assert_eq!(segment.end, Point::new(2.0, 2.0));
        assert_relative_eq!(segment.elapsed_minutes(), 1.0);

        assert_eq!(track.segments().count(), 2);
        assert_eq!(track.eligible_count(), 2);
    }

    #[test]
    fn test_single_ping_track_has_no_segments() {
        let tracks = build_tracks(normalize_pings(&[ping("solo", 0, 1.0, 1.0)], Sao_Paulo));
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].segments().count(), 0);
        assert_eq!(tracks[0].eligible_count(), 0);
    }
}
