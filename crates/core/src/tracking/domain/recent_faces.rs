use std::collections::VecDeque;

use crate::shared::gender::Gender;
use crate::shared::geometry::Point;
use crate::tracking::domain::track_store::TrackId;

/// A face seen and classified on some recent frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSighting {
    /// Identity the face was counted under.
    pub track_id: TrackId,
    pub center: Point,
    pub gender: Gender,
    pub confidence: f64,
    pub frame_index: u64,
}

/// Fixed-capacity ring of the most recent face sightings.
///
/// Pushing into a full buffer evicts the oldest sighting.
pub struct RecentFaces {
    sightings: VecDeque<FaceSighting>,
    capacity: usize,
}

impl RecentFaces {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sightings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the evicted sighting, if any.
    pub fn push(&mut self, sighting: FaceSighting) -> Option<FaceSighting> {
        let evicted = if self.sightings.len() == self.capacity {
            self.sightings.pop_front()
        } else {
            None
        };
        self.sightings.push_back(sighting);
        evicted
    }

    pub fn extend<I: IntoIterator<Item = FaceSighting>>(&mut self, sightings: I) {
        for s in sightings {
            self.push(s);
        }
    }

    /// Oldest sighting whose center is strictly closer than `threshold`.
    pub fn find_near(&self, center: &Point, threshold: f64) -> Option<&FaceSighting> {
        self.sightings
            .iter()
            .find(|s| s.center.distance_to(center) < threshold)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaceSighting> {
        self.sightings.iter()
    }

    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.sightings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(x: f64, frame_index: u64) -> FaceSighting {
        FaceSighting {
            track_id: TrackId::new(frame_index),
            center: Point::new(x, 0.0),
            gender: Gender::Female,
            confidence: 0.9,
            frame_index,
        }
    }

    #[test]
    fn test_push_below_capacity_keeps_all() {
        let mut buf = RecentFaces::new(3);
        assert!(buf.push(sighting(0.0, 0)).is_none());
        assert!(buf.push(sighting(1.0, 1)).is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_full_buffer_evicts_oldest() {
        let mut buf = RecentFaces::new(2);
        buf.push(sighting(0.0, 0));
        buf.push(sighting(1.0, 1));
        let evicted = buf.push(sighting(2.0, 2)).unwrap();
        assert_eq!(evicted.frame_index, 0);

        let frames: Vec<u64> = buf.iter().map(|s| s.frame_index).collect();
        assert_eq!(frames, vec![1, 2]);
    }

    #[test]
    fn test_extend_respects_capacity() {
        let mut buf = RecentFaces::new(3);
        buf.extend((0..10).map(|i| sighting(i as f64, i)));
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.iter().next().unwrap().frame_index, 7);
    }

    #[test]
    fn test_find_near_is_strict() {
        let mut buf = RecentFaces::new(4);
        buf.push(sighting(0.0, 0));
        assert!(buf.find_near(&Point::new(49.0, 0.0), 50.0).is_some());
        assert!(buf.find_near(&Point::new(50.0, 0.0), 50.0).is_none());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut buf = RecentFaces::new(0);
        buf.push(sighting(0.0, 0));
        buf.push(sighting(1.0, 1));
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut buf = RecentFaces::new(2);
        buf.push(sighting(0.0, 0));
        buf.clear();
        assert!(buf.is_empty());
    }
}
