//! Detection of the instants at which vehicles pass a stop.
//!
//! A segment "crosses" a stop when the stop lies in the rectangle spanned by
//! the segment's two pings. The crossing instant is then interpolated along
//! the straight line between the pings by planar distance. Neither step
//! looks at the road network.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

use crate::estimation::track::{PositionTrack, Segment};
use crate::identifiers::{StopIdentifier, TrackIdentifier};
use crate::models::types::StopGeometry;
use crate::spatial::{bbox_contains, interpolation_fraction, SegmentIndex};

/// Where a crossing came from
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRef {
    pub track_index: usize,
    pub ping_index: usize,
    pub started_at: DateTime<Tz>,
    pub logged_at: DateTime<Tz>,
}

/// Estimated passage of one vehicle at one stop
#[derive(Clone, Debug, PartialEq)]
pub struct Crossing {
    pub stop_id: StopIdentifier,
    pub stop_sequence: u32,
    pub track_id: TrackIdentifier,
    pub estimated_time: DateTime<Tz>,
    /// Minutes from the segment's first ping to the crossing
    pub offset_minutes: f64,
    pub segment: SegmentRef,
}

/// Interpolated `(offset_minutes, instant)` at which `segment` passes
/// `stop`, or `None` if the stop is outside the segment's rectangle or the
/// segment has zero length.
pub fn estimate_crossing(stop: &StopGeometry, segment: &Segment) -> Option<(f64, DateTime<Tz>)> {
    if !bbox_contains(segment.start, segment.end, stop.location) {
        return None;
    }

    let Some(fraction) = interpolation_fraction(segment.start, segment.end, stop.location) else {
        tracing::trace!(
            stop = %stop.stop_id,
            logged_at = %segment.logged_at,
            "zero-length segment, no crossing"
        );
        return None;
    };

    let offset_minutes = segment.elapsed_minutes() * fraction;
    let offset = TimeDelta::milliseconds((offset_minutes * 60_000.0).round() as i64);
    Some((offset_minutes, segment.started_at + offset))
}

/// Tests segments of a fixed set of tracks against stops
pub struct CrossingDetector<'a> {
    tracks: &'a [PositionTrack],
    index: SegmentIndex,
}

impl<'a> CrossingDetector<'a> {
    pub fn new(tracks: &'a [PositionTrack]) -> Self {
        let segments = tracks.iter().enumerate().flat_map(|(track_index, track)| {
            track
                .segments()
                .map(move |s| (track_index, s.ping_index, s.start, s.end))
        });

        Self {
            tracks,
            index: SegmentIndex::build(segments),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.index.len()
    }

    /// Every crossing of `stop`, in track order then time order
    pub fn detect(&self, stop: &StopGeometry) -> Vec<Crossing> {
        self.index
            .candidates(stop.location)
            .into_iter()
            .filter_map(|(track_index, ping_index)| {
                let track = self.tracks.get(track_index)?;
                let segment = track.segment(ping_index)?;
                let (offset_minutes, estimated_time) = estimate_crossing(stop, &segment)?;

                Some(Crossing {
                    stop_id: stop.stop_id.clone(),
                    stop_sequence: stop.stop_sequence,
                    track_id: track.track_id.clone(),
                    estimated_time,
                    offset_minutes,
                    segment: SegmentRef {
                        track_index,
                        ping_index,
                        started_at: segment.started_at,
                        logged_at: segment.logged_at,
                    },
                })
            })
            .collect()
    }

    /// Crossings of every stop row, stop rows taken in the given order.
    ///
    /// Only one crossing is kept per stop position and segment: when stop
    /// rows repeat, the first one found wins. A stop found in consecutive
    /// segments of one track (overlapping rectangles around a ping) is one
    /// pass, and only the earlier segment is kept. Dropped candidates are
    /// reported as ambiguous.
    pub fn detect_all(&self, stops: &[StopGeometry]) -> Vec<Crossing> {
        let mut seen = HashSet::new();
        let mut crossings = Vec::new();

        for stop in stops {
            let mut duplicates = 0usize;
            let mut overlapping = 0usize;
            let mut last: Option<(usize, usize)> = None;

            for crossing in self.detect(stop) {
                let position = (crossing.segment.track_index, crossing.segment.ping_index);
                let continues_last = matches!(
                    last,
                    Some((track, ping)) if track == position.0 && ping + 1 == position.1
                );
                last = Some(position);

                if continues_last {
                    overlapping += 1;
                    continue;
                }
                if seen.insert((crossing.stop_sequence, position.0, position.1)) {
                    crossings.push(crossing);
                } else {
                    duplicates += 1;
                }
            }

            if duplicates > 0 || overlapping > 0 {
                tracing::warn!(
                    stop = %stop.stop_id,
                    stop_sequence = stop.stop_sequence,
                    duplicates,
                    overlapping,
                    "ambiguous crossing candidates for the same stop pass, keeping the first"
                );
            }
        }

        crossings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::track::{build_tracks, normalize_pings};
    use crate::models::types::Ping;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::Sao_Paulo;
    use geo::Point;

    fn tracks(rows: &[(&str, i64, f64, f64)]) -> Vec<PositionTrack> {
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        let pings: Vec<Ping> = rows
            .iter()
            .map(|(track, seconds, lat, lon)| {
                Ping::new(*track, base + TimeDelta::seconds(*seconds), Point::new(*lon, *lat))
            })
            .collect();
        build_tracks(normalize_pings(&pings, Sao_Paulo))
    }

    fn stop(id: &str, lat: f64, lon: f64, sequence: u32) -> StopGeometry {
        StopGeometry::new(id, "8000-10", Point::new(lon, lat), sequence)
    }

    #[test]
    fn test_midpoint_crossing() {
        let tracks = tracks(&[("T1", 0, 0.0, 0.0), ("T1", 120, 2.0, 2.0)]);
        let detector = CrossingDetector::new(&tracks);

        let crossings = detector.detect(&stop("s", 1.0, 1.0, 1));
        assert_eq!(crossings.len(), 1);

        let crossing = &crossings[0];
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        assert_eq!(crossing.estimated_time, base + TimeDelta::seconds(60));
        assert_relative_eq!(crossing.offset_minutes, 1.0, epsilon = 1e-9);
        assert_eq!(crossing.track_id.as_str(), "T1");
        assert_eq!(crossing.segment.ping_index, 1);
        assert_eq!(crossing.segment.logged_at, base + TimeDelta::seconds(120));
    }

    #[test]
    fn test_stop_outside_rectangle() {
        let tracks = tracks(&[("T1", 0, 0.0, 0.0), ("T1", 120, 2.0, 2.0)]);
        let detector = CrossingDetector::new(&tracks);

        assert!(detector.detect(&stop("s", 3.0, 1.0, 1)).is_empty());
        assert!(detector.detect(&stop("s", 1.0, -1.0, 1)).is_empty());
    }

    #[test]
    fn test_single_ping_track_yields_nothing() {
        let tracks = tracks(&[("T1", 0, 1.0, 1.0)]);
        let detector = CrossingDetector::new(&tracks);

        assert_eq!(detector.segment_count(), 0);
        assert!(detector.detect(&stop("s", 1.0, 1.0, 1)).is_empty());
    }

    #[test]
    fn test_coincident_pings_are_not_a_crossing() {
        let tracks = tracks(&[("T1", 0, 1.0, 1.0), ("T1", 60, 1.0, 1.0)]);
        let detector = CrossingDetector::new(&tracks);

        assert_eq!(detector.segment_count(), 1);
        assert!(detector.detect(&stop("s", 1.0, 1.0, 1)).is_empty());
    }

    #[test]
    fn test_crossing_time_within_segment() {
        let tracks = tracks(&[
            ("T1", 0, -23.5510, -46.6410),
            ("T1", 47, -23.5480, -46.6350),
            ("T1", 161, -23.5440, -46.6290),
        ]);
        let detector = CrossingDetector::new(&tracks);

        for (lat, lon) in [(-23.55, -46.64), (-23.549, -46.636), (-23.545, -46.630), (-23.548, -46.635)] {
            for crossing in detector.detect(&stop("s", lat, lon, 1)) {
                assert!(crossing.segment.started_at <= crossing.estimated_time);
                assert!(crossing.estimated_time <= crossing.segment.logged_at);
            }
        }
    }

    #[test]
    fn test_detect_all_keeps_first_of_duplicate_rows() {
        let tracks = tracks(&[("T1", 0, 0.0, 0.0), ("T1", 120, 2.0, 2.0)]);
        let detector = CrossingDetector::new(&tracks);

        let stops = vec![
            stop("s", 1.0, 1.0, 4),
            stop("s", 1.5, 1.5, 4),
            stop("t", 1.5, 1.5, 5),
        ];
        let crossings = detector.detect_all(&stops);

        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[0].stop_sequence, 4);
        assert_relative_eq!(crossings[0].offset_minutes, 1.0, epsilon = 1e-9);
        assert_eq!(crossings[1].stop_sequence, 5);
    }

    #[test]
    fn test_detect_all_collapses_overlapping_segments() {
        // Both rectangles around the middle ping hold s2
        let tracks = tracks(&[("T1", 0, 0.0, 0.0), ("T1", 120, 1.0, 1.0), ("T1", 240, 2.0, 0.5)]);
        let detector = CrossingDetector::new(&tracks);

        let s2 = stop("s2", 1.0, 0.8, 2);
        assert_eq!(detector.detect(&s2).len(), 2);

        let crossings = detector.detect_all(&[stop("s1", 0.2, 0.2, 1), s2]);
        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[1].stop_sequence, 2);
        assert_eq!(crossings[1].segment.ping_index, 1);
    }

    #[test]
    fn test_vehicle_passing_twice_gives_two_crossings() {
        let tracks = tracks(&[
            ("T1", 0, 0.0, 0.0),
            ("T1", 60, 2.0, 2.0),
            ("T1", 600, 4.0, 4.0),
            ("T1", 1200, 2.0, 2.0),
            ("T1", 1260, 0.0, 0.0),
        ]);
        let detector = CrossingDetector::new(&tracks);

        let crossings = detector.detect(&stop("s", 1.0, 1.0, 1));
        assert_eq!(crossings.len(), 2);
        assert!(crossings[0].estimated_time < crossings[1].estimated_time);
    }
}
