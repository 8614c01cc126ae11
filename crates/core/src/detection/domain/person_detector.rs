use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Domain interface for person detection.
///
/// Boxes are in the coordinate space of the frame passed in. Only boxes
/// scoring at least `min_confidence` are returned.
pub trait PersonDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
