//! Pairing each stop crossing with a crossing of the preceding stop.
//!
//! GPS pings are sparse and track ids are not stable along a whole route, so
//! a crossing rarely has a partner in the same segment. The resolver tries,
//! in this order:
//!
//! 1. a predecessor crossing in the same segment of the same track, accepted
//!    only when it comes strictly earlier;
//! 2. a predecessor crossing in the segment that ends where this one starts,
//!    stitched across the segment boundary. The same track's preceding
//!    segment is preferred; any other track's segment closing at that
//!    instant is only taken when it is absent, to follow runs whose track id
//!    changes between pings;
//! 3. nothing: the duration stays undefined.
//!
//! This is a heuristic. It recovers samples from fragmented tracks but is
//! not an exact reconstruction of the vehicle's path.

use std::collections::{BTreeSet, HashMap};

use chrono::DateTime;
use chrono_tz::Tz;

use crate::estimation::config::PredecessorPolicy;
use crate::estimation::crossing::Crossing;
use crate::identifiers::{StopIdentifier, TrackIdentifier};

/// How a pair's duration was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    SameTrack,
    PreviousTrip,
    Unresolved,
}

/// A crossing together with the predecessor crossing chosen for it
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPair {
    pub track_id: TrackIdentifier,
    pub stop_id: StopIdentifier,
    pub stop_sequence: u32,
    pub time_at_stop: DateTime<Tz>,
    pub time_at_previous_logged_stop: Option<DateTime<Tz>>,
    /// Timestamp of the ping closing the crossing's segment; used for
    /// hour/weekday bucketing
    pub logged_at: DateTime<Tz>,
    pub resolution: Resolution,
    /// Minutes from the previous stop; `None` when unresolved, never zero
    /// as a stand-in
    pub duration_minutes: Option<f64>,
}

fn epoch_minutes(timestamp: &DateTime<Tz>) -> f64 {
    timestamp.timestamp_millis() as f64 / 60_000.0
}

pub struct SequenceResolver<'a> {
    crossings: &'a [Crossing],
    policy: PredecessorPolicy,
    sequences: BTreeSet<u32>,
    /// `(stop_sequence, track, logged_at)` -> first crossing
    same_segment: HashMap<(u32, &'a TrackIdentifier, i64), usize>,
    /// `(stop_sequence, track_index, ping_index)` -> crossing
    by_segment: HashMap<(u32, usize, usize), usize>,
    /// `(stop_sequence, logged_at)` -> crossings on any track
    by_logged_at: HashMap<(u32, i64), Vec<usize>>,
}

impl<'a> SequenceResolver<'a> {
    pub fn new(crossings: &'a [Crossing], policy: PredecessorPolicy) -> Self {
        let mut sequences = BTreeSet::new();
        let mut same_segment = HashMap::new();
        let mut by_segment = HashMap::new();
        let mut by_logged_at: HashMap<(u32, i64), Vec<usize>> = HashMap::new();

        for (i, crossing) in crossings.iter().enumerate() {
            let logged_at = crossing.segment.logged_at.timestamp_millis();
            sequences.insert(crossing.stop_sequence);
            same_segment
                .entry((crossing.stop_sequence, &crossing.track_id, logged_at))
                .or_insert(i);
            by_segment
                .entry((
                    crossing.stop_sequence,
                    crossing.segment.track_index,
                    crossing.segment.ping_index,
                ))
                .or_insert(i);
            by_logged_at
                .entry((crossing.stop_sequence, logged_at))
                .or_default()
                .push(i);
        }

        Self {
            crossings,
            policy,
            sequences,
            same_segment,
            by_segment,
            by_logged_at,
        }
    }

    /// Stop position whose crossings count as "previous" for `stop_sequence`
    pub fn predecessor(&self, stop_sequence: u32) -> Option<u32> {
        match self.policy {
            PredecessorPolicy::Adjacent => stop_sequence.checked_sub(1).filter(|s| *s >= 1),
            PredecessorPolicy::PreviousSelected => {
                self.sequences.range(..stop_sequence).next_back().copied()
            }
        }
    }

    /// One resolved pair per crossing, in crossing order
    pub fn resolve(&self) -> Vec<ResolvedPair> {
        let pairs: Vec<ResolvedPair> = self.crossings.iter().map(|c| self.resolve_one(c)).collect();

        let unresolved = pairs
            .iter()
            .filter(|p| p.resolution == Resolution::Unresolved)
            .count();
        tracing::debug!(
            crossings = self.crossings.len(),
            unresolved,
            "resolved crossings against their predecessor stop"
        );
        pairs
    }

    fn resolve_one(&self, crossing: &Crossing) -> ResolvedPair {
        let pair = |resolution, previous: Option<&Crossing>, duration_minutes| ResolvedPair {
            track_id: crossing.track_id.clone(),
            stop_id: crossing.stop_id.clone(),
            stop_sequence: crossing.stop_sequence,
            time_at_stop: crossing.estimated_time,
            time_at_previous_logged_stop: previous.map(|p| p.estimated_time),
            logged_at: crossing.segment.logged_at,
            resolution,
            duration_minutes,
        };

        let Some(previous_sequence) = self.predecessor(crossing.stop_sequence) else {
            return pair(Resolution::Unresolved, None, None);
        };

        let logged_at = crossing.segment.logged_at.timestamp_millis();
        if let Some(&i) = self
            .same_segment
            .get(&(previous_sequence, &crossing.track_id, logged_at))
        {
            let previous = &self.crossings[i];
            let delta = crossing.offset_minutes - previous.offset_minutes;
            if delta > 0.0 {
                return pair(Resolution::SameTrack, Some(previous), Some(delta));
            }
        }

        if let Some(previous) = self.previous_segment_crossing(crossing, previous_sequence) {
            let delta = crossing.offset_minutes - previous.offset_minutes
                + epoch_minutes(&previous.segment.logged_at)
                - epoch_minutes(&previous.segment.started_at);
            return pair(Resolution::PreviousTrip, Some(previous), Some(delta));
        }

        pair(Resolution::Unresolved, None, None)
    }

    /// Crossing of `previous_sequence` in the segment that closed when
    /// `crossing`'s segment started
    fn previous_segment_crossing(
        &self,
        crossing: &Crossing,
        previous_sequence: u32,
    ) -> Option<&'a Crossing> {
        let crossings = self.crossings;
        let own = crossing
            .segment
            .ping_index
            .checked_sub(1)
            .and_then(|ping| {
                self.by_segment
                    .get(&(previous_sequence, crossing.segment.track_index, ping))
            })
            .map(|&i| &crossings[i])
            .filter(|previous| previous.segment.logged_at == crossing.segment.started_at);
        if own.is_some() {
            return own;
        }

        let started_at = crossing.segment.started_at.timestamp_millis();
        let candidates: Vec<&'a Crossing> = self
            .by_logged_at
            .get(&(previous_sequence, started_at))?
            .iter()
            .map(|&i| &crossings[i])
            .collect();
        if candidates.len() > 1 {
            tracing::warn!(
                stop = %crossing.stop_id,
                track = %crossing.track_id,
                candidates = candidates.len(),
                "multiple predecessor crossings logged at the same instant, keeping the first"
            );
        }
        candidates.first().copied()
    }
}
