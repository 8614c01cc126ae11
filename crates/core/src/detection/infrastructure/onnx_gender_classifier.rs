//! Two-class gender classifier over a ResNet-style ONNX model.
//!
//! Input is NHWC `[1, 200, 100, 3]` float32 with Caffe preprocessing: BGR
//! channel order and per-channel ImageNet mean subtraction, no scaling.
//! Output is `[1, 2]` probabilities ordered `[FEMALE, MALE]`.
use std::path::Path;

use crate::detection::domain::gender_classifier::GenderClassifier;
use crate::detection::infrastructure::onnx_session::load_session;
use crate::shared::frame::Frame;
use crate::shared::gender::GenderPrediction;

pub const INPUT_HEIGHT: usize = 200;
pub const INPUT_WIDTH: usize = 100;

/// Means in B, G, R order.
const BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

pub struct OnnxGenderClassifier {
    session: ort::session::Session,
}

impl OnnxGenderClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::debug!("Loaded gender model {}", model_path.display());
        Ok(Self { session })
    }
}

impl GenderClassifier for OnnxGenderClassifier {
    fn classify(&mut self, face: &Frame) -> Result<GenderPrediction, Box<dyn std::error::Error>> {
        if face.width() == 0 || face.height() == 0 || face.channels() != 3 {
            return Err("Face crop must be a non-empty RGB frame".into());
        }
        let tensor = preprocess(face);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Gender model produced no outputs".into());
        }
        let probabilities = outputs[0].try_extract_array::<f32>()?;
        let slice = probabilities
            .as_slice()
            .ok_or("Cannot get probability slice")?;
        GenderPrediction::from_probabilities(slice)
            .ok_or_else(|| format!("Unexpected gender output of {} values", slice.len()).into())
    }
}

/// Resize to 200x100 (bilinear), RGB→BGR, subtract channel means, NHWC layout.
fn preprocess(face: &Frame) -> ndarray::Array4<f32> {
    let src_w = face.width() as usize;
    let src_h = face.height() as usize;
    let src = face.as_ndarray();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, INPUT_HEIGHT, INPUT_WIDTH, 3));

    let scale_y = src_h as f32 / INPUT_HEIGHT as f32;
    let scale_x = src_w as f32 / INPUT_WIDTH as f32;

    for y in 0..INPUT_HEIGHT {
        let fy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
        let y0 = (fy as usize).min(src_h - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let wy = fy - y0 as f32;
        for x in 0..INPUT_WIDTH {
            let fx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
            let x0 = (fx as usize).min(src_w - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let wx = fx - x0 as f32;
            for (bgr, mean) in BGR_MEAN.iter().enumerate() {
                let rgb = 2 - bgr;
                let p = |yy: usize, xx: usize| src[[yy, xx, rgb]] as f32;
                let top = p(y0, x0) * (1.0 - wx) + p(y0, x1) * wx;
                let bottom = p(y1, x0) * (1.0 - wx) + p(y1, x1) * wx;
                tensor[[0, y, x, bgr]] = top * (1.0 - wy) + bottom * wy - mean;
            }
        }
    }

    tensor
}
