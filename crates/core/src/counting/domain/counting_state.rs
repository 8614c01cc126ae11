use serde::Serialize;

use crate::counting::domain::identity_ledger::{AttributionOutcome, IdentityLedger};
use crate::shared::gender::GenderPrediction;
use crate::shared::geometry::Point;
use crate::tracking::domain::track_store::{Resolution, TrackId, TrackStore, TrackStoreParams};

/// Immutable view of the counters at one point in time.
///
/// Built from the single-owner state, so `total_count` always equals
/// `male_count + female_count` and `counted_identities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CountSnapshot {
    pub male_count: u64,
    pub female_count: u64,
    pub total_count: u64,
    pub current_in_roi: usize,
    pub active_tracks: usize,
    pub counted_identities: usize,
}

/// Track store and ledger under a single writer.
///
/// All counting mutations go through `&mut self`, so a frame loop owning
/// this value cannot observe a half-applied reset.
pub struct CountingState {
    tracks: TrackStore,
    ledger: IdentityLedger,
    current_in_roi: usize,
}

impl CountingState {
    pub fn new(params: TrackStoreParams) -> Self {
        Self {
            tracks: TrackStore::new(params),
            ledger: IdentityLedger::new(),
            current_in_roi: 0,
        }
    }

    pub fn resolve(&mut self, center: Point, frame_index: u64) -> Resolution {
        self.tracks.resolve(center, frame_index)
    }

    pub fn attribute_gender(
        &mut self,
        track_id: TrackId,
        prediction: GenderPrediction,
        frame_index: u64,
    ) -> AttributionOutcome {
        self.ledger.attribute_gender(track_id, prediction, frame_index)
    }

    pub fn is_counted(&self, track_id: TrackId) -> bool {
        self.ledger.is_counted(track_id)
    }

    /// Closes a processed frame: records the in-ROI count and runs track upkeep.
    pub fn finish_frame(&mut self, frame_index: u64, current_in_roi: usize) -> Vec<TrackId> {
        self.current_in_roi = current_in_roi;
        self.tracks.maintain(frame_index)
    }

    /// Counting epoch boundary.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.tracks.clear();
        self.current_in_roi = 0;
    }

    pub fn ledger(&self) -> &IdentityLedger {
        &self.ledger
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    pub fn snapshot(&self) -> CountSnapshot {
        CountSnapshot {
            male_count: self.ledger.male_count(),
            female_count: self.ledger.female_count(),
            total_count: self.ledger.total_count(),
            current_in_roi: self.current_in_roi,
            active_tracks: self.tracks.len(),
            counted_identities: self.ledger.len(),
        }
    }
}

impl Default for CountingState {
    fn default() -> Self {
        Self::new(TrackStoreParams::default())
    }
}
