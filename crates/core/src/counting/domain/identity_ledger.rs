use std::collections::HashMap;

use serde::Serialize;

use crate::shared::gender::{Gender, GenderPrediction};
use crate::tracking::domain::track_store::TrackId;

/// Permanent record that a track has been counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountedIdentity {
    pub gender: Gender,
    pub confidence: f64,
    pub counted: bool,
    pub first_seen_frame: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionOutcome {
    /// First classification of this track: counters advanced by one.
    Counted,
    /// Track already counted: gender/confidence refreshed, counters untouched.
    Refreshed,
}

/// Counts each track id at most once per epoch.
///
/// `male_count` and `female_count` only ever move together with an insert,
/// so `total_count()` is always their sum and the number of entries.
#[derive(Debug, Default)]
pub struct IdentityLedger {
    entries: HashMap<TrackId, CountedIdentity>,
    male_count: u64,
    female_count: u64,
}

impl IdentityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute_gender(
        &mut self,
        track_id: TrackId,
        prediction: GenderPrediction,
        frame_index: u64,
    ) -> AttributionOutcome {
        if let Some(entry) = self.entries.get_mut(&track_id) {
            entry.gender = prediction.gender;
            entry.confidence = prediction.confidence;
            return AttributionOutcome::Refreshed;
        }

        match prediction.gender {
            Gender::Male => self.male_count += 1,
            Gender::Female => self.female_count += 1,
        }
        self.entries.insert(
            track_id,
            CountedIdentity {
                gender: prediction.gender,
                confidence: prediction.confidence,
                counted: true,
                first_seen_frame: frame_index,
            },
        );
        AttributionOutcome::Counted
    }

    pub fn get(&self, track_id: TrackId) -> Option<&CountedIdentity> {
        self.entries.get(&track_id)
    }

    pub fn is_counted(&self, track_id: TrackId) -> bool {
        self.entries.contains_key(&track_id)
    }

    pub fn male_count(&self) -> u64 {
        self.male_count
    }

    pub fn female_count(&self) -> u64 {
        self.female_count
    }

    pub fn total_count(&self) -> u64 {
        self.male_count + self.female_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Epoch boundary: forgets every entry and zeroes the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.male_count = 0;
        self.female_count = 0;
    }
}
