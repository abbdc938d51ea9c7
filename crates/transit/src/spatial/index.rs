//! R-tree over ping segments for crossing detection.
//!
//! ## Two-Stage Filtering
//!
//! 1. **R-tree filter**: every segment is stored under the envelope of its two
//!    endpoints, so an envelope query at the stop point returns exactly the
//!    segments whose bounding rectangle holds the stop.
//! 2. **Rectangle test**: candidates are re-checked with
//!    [`bbox_contains`](crate::spatial::queries::bbox_contains) and put back
//!    in track/ping order, so the result matches testing every segment of
//!    every track against the stop.

use geo::Point;
use rstar::{RTree, RTreeObject, AABB};

// ============================================================================
// Segment Spatial Node
// ============================================================================

#[derive(Clone, Debug)]
pub struct SegmentNode {
    pub track_index: usize,
    pub ping_index: usize,
    aabb: AABB<[f64; 2]>,
}

impl SegmentNode {
    pub fn new(track_index: usize, ping_index: usize, start: Point, end: Point) -> Self {
        let aabb = AABB::from_corners([start.x(), start.y()], [end.x(), end.y()]);

        Self {
            track_index,
            ping_index,
            aabb,
        }
    }
}

impl RTreeObject for SegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

// ============================================================================
// Segment Index
// ============================================================================

/// Index of the eligible segments of a set of tracks
pub struct SegmentIndex {
    tree: RTree<SegmentNode>,
}

impl SegmentIndex {
    /// Index `(track_index, ping_index, start, end)` segments. The positions
    /// are handed back unchanged by [`candidates`](Self::candidates), so they
    /// must refer into whatever the caller keeps the segments in.
    pub fn build(segments: impl IntoIterator<Item = (usize, usize, Point, Point)>) -> Self {
        let nodes: Vec<SegmentNode> = segments
            .into_iter()
            .map(|(track_index, ping_index, start, end)| {
                SegmentNode::new(track_index, ping_index, start, end)
            })
            .collect();

        Self {
            tree: RTree::bulk_load(nodes),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// `(track_index, ping_index)` of every segment whose envelope contains
    /// `point`, in track order then ping order.
    pub fn candidates(&self, point: Point) -> Vec<(usize, usize)> {
        let query = AABB::from_point([point.x(), point.y()]);
        let mut hits: Vec<(usize, usize)> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|node| (node.track_index, node.ping_index))
            .collect();
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(
        track: usize,
        ping: usize,
        from: (f64, f64),
        to: (f64, f64),
    ) -> (usize, usize, Point, Point) {
        (track, ping, Point::new(from.0, from.1), Point::new(to.0, to.1))
    }

    #[test]
    fn test_index_len() {
        let index = SegmentIndex::build([
            segment(0, 1, (0.0, 0.0), (1.0, 1.0)),
            segment(0, 2, (1.0, 1.0), (2.0, 2.0)),
        ]);
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_candidates_sorted_and_inclusive() {
        // Inserted out of order on purpose
        let index = SegmentIndex::build([
            segment(1, 1, (2.0, 2.0), (0.0, 0.0)),
            segment(0, 2, (1.0, 1.0), (2.0, 2.0)),
            segment(0, 1, (0.0, 0.0), (1.0, 1.0)),
        ]);

        // (1, 1) is a corner of both of track 0's segments and inside track 1's
        assert_eq!(index.candidates(Point::new(1.0, 1.0)), vec![(0, 1), (0, 2), (1, 1)]);
        assert_eq!(index.candidates(Point::new(1.5, 0.5)), vec![(1, 1)]);
        assert!(index.candidates(Point::new(3.0, 3.0)).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = SegmentIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.candidates(Point::new(0.0, 0.0)).is_empty());
    }
}
