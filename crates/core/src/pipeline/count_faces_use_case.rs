use std::path::Path;

use crate::counting::domain::counting_state::CountingState;
use crate::detection::domain::gender_attributor::GenderAttributor;
use crate::pipeline::counting_loop::{CountingLoop, FrameCount, FrameCounter, RunSummary};
use crate::pipeline::frame_annotator::AnnotatedPerson;
use crate::shared::config::TrackingConfig;
use crate::shared::frame::Frame;
use crate::shared::geometry::{PixelRect, Point};
use crate::tracking::domain::recent_faces::{FaceSighting, RecentFaces};
use crate::tracking::domain::track_store::TrackId;
use crate::video::domain::frame_source::FrameSource;

/// Face-only counting: no person detector, faces are deduplicated against
/// the last few sightings and against every face counted this epoch.
pub struct FaceCounter {
    attributor: GenderAttributor,
    recent: RecentFaces,
    counted: Vec<FaceSighting>,
    threshold: f64,
    next_id: u64,
}

impl FaceCounter {
    pub fn new(attributor: GenderAttributor, config: &TrackingConfig) -> Self {
        Self {
            attributor,
            recent: RecentFaces::new(config.tracking_frames),
            counted: Vec::new(),
            threshold: config.face_tracking_threshold,
            next_id: 0,
        }
    }

    pub fn counted_faces(&self) -> &[FaceSighting] {
        &self.counted
    }

    fn known_face(&self, center: &Point) -> Option<TrackId> {
        if let Some(s) = self.recent.find_near(center, self.threshold) {
            return Some(s.track_id);
        }
        self.counted
            .iter()
            .find(|s| s.center.distance_to(center) < self.threshold)
            .map(|s| s.track_id)
    }
}

impl FrameCounter for FaceCounter {
    /// Face confidence comes from the locator's own threshold, so
    /// `_min_confidence` is unused here.
    fn count_frame(
        &mut self,
        frame: &Frame,
        region: &PixelRect,
        _min_confidence: f64,
        frame_index: u64,
        state: &mut CountingState,
    ) -> Result<FrameCount, Box<dyn std::error::Error>> {
        let roi_frame = frame.crop(region).ok_or("ROI lies outside the frame")?;
        let faces = self.attributor.locate_faces(&roi_frame)?;

        let mut seen_this_frame = Vec::with_capacity(faces.len());
        let mut people = Vec::with_capacity(faces.len());
        for local in &faces {
            let face = local.translated(region.x as f64, region.y as f64);
            let center = face.center();

            let attribution = match self.attributor.attribute_face(frame, &face) {
                Ok(attribution) => attribution,
                Err(skip) => {
                    log::debug!("Skipping face on frame {frame_index}: {skip}");
                    continue;
                }
            };
            let prediction = attribution.prediction;

            let track_id = match self.known_face(&center) {
                Some(id) => id,
                None => {
                    let id = TrackId::new(self.next_id);
                    self.next_id += 1;
                    state.attribute_gender(id, prediction, frame_index);
                    self.counted.push(FaceSighting {
                        track_id: id,
                        center,
                        gender: prediction.gender,
                        confidence: prediction.confidence,
                        frame_index,
                    });
                    log::info!(
                        "Counted face {id} as {} ({:.2}) on frame {frame_index}",
                        prediction.gender,
                        prediction.confidence
                    );
                    id
                }
            };

            seen_this_frame.push(FaceSighting {
                track_id,
                center,
                gender: prediction.gender,
                confidence: prediction.confidence,
                frame_index,
            });
            people.push(AnnotatedPerson {
                bbox: face,
                track_id,
                counted: state.is_counted(track_id),
                prediction: Some(prediction),
            });
        }

        // Faces on the same frame never deduplicate against each other.
        self.recent.extend(seen_this_frame);

        Ok(FrameCount {
            in_roi: people.len(),
            people,
        })
    }

    fn reset(&mut self) {
        self.recent.clear();
        self.counted.clear();
    }
}

/// Face-only counting mode.
pub struct CountFacesUseCase {
    source: Box<dyn FrameSource>,
    counter: FaceCounter,
    runner: CountingLoop,
}

impl CountFacesUseCase {
    pub fn new(source: Box<dyn FrameSource>, counter: FaceCounter, runner: CountingLoop) -> Self {
        Self {
            source,
            counter,
            runner,
        }
    }

    pub fn execute(&mut self, input_path: &Path) -> Result<RunSummary, Box<dyn std::error::Error>> {
        self.runner
            .run(self.source.as_mut(), input_path, &mut self.counter)
    }

    pub fn state(&self) -> &CountingState {
        self.runner.state()
    }

    pub fn counter(&self) -> &FaceCounter {
        &self.counter
    }
}
