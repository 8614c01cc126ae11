//! Person box → face crop → gender, with every failure reported as a skip.
use thiserror::Error;

use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::gender_classifier::GenderClassifier;
use crate::shared::config::FaceConfig;
use crate::shared::frame::Frame;
use crate::shared::gender::GenderPrediction;
use crate::shared::geometry::BoundingBox;

/// Why no gender could be attributed on this frame.
#[derive(Error, Debug)]
pub enum AttributionSkip {
    #[error("box lies outside the frame")]
    EmptyCrop,
    #[error("no face found")]
    NoFace,
    #[error("face too small ({width}x{height})")]
    FaceTooSmall { width: u32, height: u32 },
    #[error("face locator failed: {0}")]
    Locator(String),
    #[error("gender classifier failed: {0}")]
    Classifier(String),
}

/// A successful attribution and the face it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribution {
    pub prediction: GenderPrediction,
    /// Full-frame coordinates.
    pub face: BoundingBox,
}

pub struct GenderAttributor {
    locator: Box<dyn FaceLocator>,
    classifier: Box<dyn GenderClassifier>,
    person_padding: f64,
    min_face_size: u32,
}

impl GenderAttributor {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        classifier: Box<dyn GenderClassifier>,
        config: &FaceConfig,
    ) -> Self {
        Self {
            locator,
            classifier,
            person_padding: config.person_padding,
            min_face_size: config.min_face_size,
        }
    }

    /// Finds the largest face inside the padded person box and classifies it.
    pub fn attribute_person(
        &mut self,
        frame: &Frame,
        person: &BoundingBox,
    ) -> Result<Attribution, AttributionSkip> {
        let rect = person
            .padded_within(self.person_padding, frame.width(), frame.height())
            .ok_or(AttributionSkip::EmptyCrop)?;
        let crop = frame.crop(&rect).ok_or(AttributionSkip::EmptyCrop)?;

        let faces = self
            .locator
            .locate(&crop)
            .map_err(|e| AttributionSkip::Locator(e.to_string()))?;
        let largest = largest_face(&faces).ok_or(AttributionSkip::NoFace)?;
        let face = largest.translated(rect.x as f64, rect.y as f64);

        self.attribute_face(frame, &face)
    }

    /// Classifies an already located face given in full-frame coordinates.
    pub fn attribute_face(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<Attribution, AttributionSkip> {
        let rect = face
            .padded_within(0.0, frame.width(), frame.height())
            .ok_or(AttributionSkip::EmptyCrop)?;
        if rect.width < self.min_face_size || rect.height < self.min_face_size {
            return Err(AttributionSkip::FaceTooSmall {
                width: rect.width,
                height: rect.height,
            });
        }
        let crop = frame.crop(&rect).ok_or(AttributionSkip::EmptyCrop)?;
        let prediction = self
            .classifier
            .classify(&crop)
            .map_err(|e| AttributionSkip::Classifier(e.to_string()))?;
        Ok(Attribution {
            prediction,
            face: *face,
        })
    }

    pub fn locate_faces(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        self.locator.locate(frame)
    }
}

fn largest_face(faces: &[BoundingBox]) -> Option<&BoundingBox> {
    faces
        .iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
}
