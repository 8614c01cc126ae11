use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::shared::frame::Frame;

/// Encodes an RGB frame as a JPEG for the live view.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if frame.channels() != 3 {
        return Err(format!("Expected RGB frame, got {} channels", frame.channels()).into());
    }
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder.encode(
        frame.data(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![128; (width * height * 3) as usize], width, height, 3, 0)
    }

    #[test]
    fn test_output_is_jpeg() {
        let jpeg = encode_jpeg(&gray_frame(32, 24), 85).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn test_rejects_non_rgb() {
        let frame = Frame::new(vec![0; 16], 4, 4, 1, 0);
        assert!(encode_jpeg(&frame, 85).is_err());
    }
}
