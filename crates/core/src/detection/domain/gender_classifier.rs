use crate::shared::frame::Frame;
use crate::shared::gender::GenderPrediction;

/// Domain interface for classifying a face crop.
pub trait GenderClassifier: Send {
    fn classify(&mut self, face: &Frame) -> Result<GenderPrediction, Box<dyn std::error::Error>>;
}
