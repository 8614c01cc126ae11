use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, SourceMetadata};

/// Plays a directory of still images as a frame stream, in file name order.
///
/// A single image file is accepted as a one-frame stream. Images are decoded
/// lazily with the `image` crate and converted to RGB.
pub struct ImageSequenceReader {
    paths: Vec<PathBuf>,
}

impl ImageSequenceReader {
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }
}

impl Default for ImageSequenceReader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

impl FrameSource for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else if path.is_file() && is_image_file(path) {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("Not an image or image directory: {}", path.display()).into());
        };

        let first = paths
            .first()
            .ok_or_else(|| format!("No images found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)?;

        let metadata = SourceMetadata {
            width,
            height,
            total_frames: paths.len(),
            source_path: Some(path.to_path_buf()),
        };
        log::info!(
            "Opened {} frame(s) at {}x{} from {}",
            paths.len(),
            width,
            height,
            path.display()
        );
        self.paths = paths;
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.paths.is_empty() {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        }
        Box::new(
            self.paths
                .iter()
                .enumerate()
                .map(|(index, path)| load_frame(path, index)),
        )
    }

    fn close(&mut self) {
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, r: u8) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([r, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_directory_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "b.png", 8, 6, 20);
        write_image(dir.path(), "a.png", 8, 6, 10);
        write_image(dir.path(), "c.png", 8, 6, 30);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut reader = ImageSequenceReader::new();
        let meta = reader.open(dir.path()).unwrap();
        assert_eq!(meta.total_frames, 3);
        assert_eq!((meta.width, meta.height), (8, 6));

        let frames: Vec<Frame> = reader.frames().map(|f| f.unwrap()).collect();
        let reds: Vec<u8> = frames.iter().map(|f| f.data()[0]).collect();
        assert_eq!(reds, vec![10, 20, 30]);
        let indices: Vec<usize> = frames.iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(frames.iter().all(|f| f.channels() == 3));
    }

    #[test]
    fn test_single_image_is_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "only.png", 4, 4, 50);
        let mut reader = ImageSequenceReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!(meta.total_frames, 1);
        assert_eq!(reader.frames().count(), 1);
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_path_is_error() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(Path::new("/nonexistent/frames")).is_err());
    }

    #[test]
    fn test_frames_before_open_yields_error() {
        let mut reader = ImageSequenceReader::new();
        let first = reader.frames().next().unwrap();
        assert!(first.is_err());
    }

    #[test]
    fn test_corrupt_image_yields_error() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a.png", 4, 4, 1);
        std::fs::write(dir.path().join("b.png"), b"not a png").unwrap();

        let mut reader = ImageSequenceReader::new();
        reader.open(dir.path()).unwrap();
        let results: Vec<_> = reader.frames().collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_is_image_file_case_insensitive() {
        assert!(is_image_file(Path::new("frame.JPG")));
        assert!(is_image_file(Path::new("frame.png")));
        assert!(!is_image_file(Path::new("frame.mp4")));
        assert!(!is_image_file(Path::new("frame")));
    }
}
