use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;

/// What a frame source knows about its stream once opened.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMetadata {
    /// Dimensions of the first frame. Later frames may differ.
    pub width: u32,
    pub height: u32,
    /// 0 when the stream length is unknown.
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

/// Reads frames from a camera-like source.
///
/// A failed frame read is fatal to the counting loop, so implementations
/// yield `Err` only for real source failures.
pub trait FrameSource: Send {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
