use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Domain interface for finding faces, typically inside a person crop.
///
/// Boxes are in the coordinate space of the frame passed in.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
