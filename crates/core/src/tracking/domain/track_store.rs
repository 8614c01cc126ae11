//! Centroid tracker that turns per-frame detection centers into provisional
//! person identities.
//!
//! Association is first-match, not nearest: a detection joins the first
//! recently-seen track (in creation order) whose last center lies strictly
//! closer than the distance threshold.
use std::collections::VecDeque;

use crate::shared::config::TrackingConfig;
use crate::shared::geometry::Point;

/// Stable identifier of a track. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID{}", self.0)
    }
}

/// Result of resolving one detection center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub track_id: TrackId,
    pub is_new: bool,
}

#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    /// `(frame_index, center)` in frame order, one entry per frame.
    history: VecDeque<(u64, Point)>,
}

impl Track {
    fn new(id: TrackId, frame_index: u64, center: Point) -> Self {
        let mut history = VecDeque::new();
        history.push_back((frame_index, center));
        Self { id, history }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn history(&self) -> impl Iterator<Item = &(u64, Point)> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent `(frame_index, center)`. Histories are never empty.
    pub fn last_seen(&self) -> (u64, Point) {
        *self
            .history
            .back()
            .expect("track history always holds at least one entry")
    }

    fn record(&mut self, frame_index: u64, center: Point) {
        match self.history.back_mut() {
            Some(last) if last.0 == frame_index => last.1 = center,
            _ => self.history.push_back((frame_index, center)),
        }
    }

    fn trim_to(&mut self, patience: usize) {
        while self.history.len() > patience {
            self.history.pop_front();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackStoreParams {
    pub distance_threshold: f64,
    pub frame_max: u64,
    pub patience: usize,
    pub retention_frames: u64,
}

impl From<&TrackingConfig> for TrackStoreParams {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            distance_threshold: config.distance_threshold,
            frame_max: config.frame_max,
            patience: config.patience.max(1),
            retention_frames: config.retention_frames.max(config.frame_max),
        }
    }
}

impl Default for TrackStoreParams {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

pub struct TrackStore {
    tracks: Vec<Track>,
    next_id: u64,
    params: TrackStoreParams,
}

impl TrackStore {
    pub fn new(params: TrackStoreParams) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 0,
            params,
        }
    }

    pub fn params(&self) -> &TrackStoreParams {
        &self.params
    }

    /// Resolves a full-frame detection center to a track.
    ///
    /// `frame_index` must be non-decreasing across calls for the recency
    /// window to behave as a sliding window.
    pub fn resolve(&mut self, center: Point, frame_index: u64) -> Resolution {
        let frame_max = self.params.frame_max;
        let threshold = self.params.distance_threshold;

        let matched = self.tracks.iter_mut().find(|track| {
            let (last_frame, last_center) = track.last_seen();
            last_frame.abs_diff(frame_index) <= frame_max
                && last_center.distance_to(&center) < threshold
        });

        if let Some(track) = matched {
            track.record(frame_index, center);
            return Resolution {
                track_id: track.id,
                is_new: false,
            };
        }

        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.tracks.push(Track::new(id, frame_index, center));
        Resolution {
            track_id: id,
            is_new: true,
        }
    }

    /// Per-frame upkeep: trims histories to `patience` entries and drops
    /// tracks unseen for more than `retention_frames`.
    ///
    /// Returns the ids evicted from the active set.
    pub fn maintain(&mut self, current_frame: u64) -> Vec<TrackId> {
        let patience = self.params.patience;
        let retention = self.params.retention_frames;

        let mut evicted = Vec::new();
        self.tracks.retain_mut(|track| {
            track.trim_to(patience);
            let stale = current_frame.saturating_sub(track.last_seen().0) > retention;
            if stale {
                evicted.push(track.id);
            }
            !stale
        });
        evicted
    }

    /// Drops all tracks. The id counter keeps running.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new(TrackStoreParams::default())
    }
}
