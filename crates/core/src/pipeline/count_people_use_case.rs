use std::path::Path;

use crate::counting::domain::counting_state::CountingState;
use crate::counting::domain::identity_ledger::AttributionOutcome;
use crate::detection::domain::gender_attributor::GenderAttributor;
use crate::detection::domain::person_detector::PersonDetector;
use crate::pipeline::counting_loop::{CountingLoop, FrameCount, FrameCounter, RunSummary};
use crate::pipeline::frame_annotator::AnnotatedPerson;
use crate::shared::frame::Frame;
use crate::shared::gender::GenderPrediction;
use crate::shared::geometry::PixelRect;
use crate::video::domain::frame_source::FrameSource;

/// Person boxes inside the ROI, tracked by center and counted once each
/// when a face on them is first classified.
pub struct PersonCounter {
    detector: Box<dyn PersonDetector>,
    attributor: GenderAttributor,
}

impl PersonCounter {
    pub fn new(detector: Box<dyn PersonDetector>, attributor: GenderAttributor) -> Self {
        Self {
            detector,
            attributor,
        }
    }
}

impl FrameCounter for PersonCounter {
    fn count_frame(
        &mut self,
        frame: &Frame,
        region: &PixelRect,
        min_confidence: f64,
        frame_index: u64,
        state: &mut CountingState,
    ) -> Result<FrameCount, Box<dyn std::error::Error>> {
        let roi_frame = frame.crop(region).ok_or("ROI lies outside the frame")?;
        let boxes = self.detector.detect(&roi_frame, min_confidence)?;

        let mut people = Vec::with_capacity(boxes.len());
        for local in &boxes {
            let bbox = local.translated(region.x as f64, region.y as f64);
            let resolution = state.resolve(bbox.center(), frame_index);
            let track_id = resolution.track_id;

            let prediction = match self.attributor.attribute_person(frame, &bbox) {
                Ok(attribution) => {
                    let prediction = attribution.prediction;
                    if state.attribute_gender(track_id, prediction, frame_index)
                        == AttributionOutcome::Counted
                    {
                        log::info!(
                            "Counted person {track_id} as {} ({:.2}) on frame {frame_index}",
                            prediction.gender,
                            prediction.confidence
                        );
                    }
                    Some(prediction)
                }
                Err(skip) => {
                    log::debug!("No gender for person {track_id} on frame {frame_index}: {skip}");
                    state
                        .ledger()
                        .get(track_id)
                        .map(|identity| GenderPrediction::new(identity.gender, identity.confidence))
                }
            };

            people.push(AnnotatedPerson {
                bbox,
                track_id,
                counted: state.is_counted(track_id),
                prediction,
            });
        }

        Ok(FrameCount {
            in_roi: people.len(),
            people,
        })
    }
}

/// Person-detection counting mode: detect people in the ROI, track them by
/// center proximity, and count each track once by gender.
pub struct CountPeopleUseCase {
    source: Box<dyn FrameSource>,
    counter: PersonCounter,
    runner: CountingLoop,
}

impl CountPeopleUseCase {
    pub fn new(source: Box<dyn FrameSource>, counter: PersonCounter, runner: CountingLoop) -> Self {
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
}
