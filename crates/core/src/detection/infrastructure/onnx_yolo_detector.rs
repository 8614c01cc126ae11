//! YOLO detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference, score decoding and NMS. The
//! same type serves the person detector (multi-class COCO model, class 0)
//! and the face locator (single-class face model).
use std::path::Path;

use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::person_detector::PersonDetector;
use crate::detection::infrastructure::onnx_session::load_session;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// COCO class index for "person".
pub const COCO_PERSON_CLASS: usize = 0;

/// Where the score of the wanted class sits in a prediction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLayout {
    /// `[cx, cy, w, h, score, ...extra]`, e.g. face models with keypoints.
    SingleClass,
    /// `[cx, cy, w, h, class_0, class_1, ...]`, YOLOv8-style heads.
    MultiClass { class_index: usize },
}

impl ScoreLayout {
    fn score_column(&self) -> usize {
        match self {
            ScoreLayout::SingleClass => 4,
            ScoreLayout::MultiClass { class_index } => 4 + class_index,
        }
    }
}

/// Maps model-space coordinates back onto the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    layout: ScoreLayout,
    input_size: u32,
    /// Threshold used when called as a [`FaceLocator`].
    default_confidence: f64,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(
        model_path: &Path,
        layout: ScoreLayout,
        default_confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!(
            "Loaded YOLO model {} ({layout:?}, input {input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            layout,
            input_size,
            default_confidence,
        })
    }

    /// Person detector over a COCO-trained model.
    pub fn person_detector(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Self::new(
            model_path,
            ScoreLayout::MultiClass {
                class_index: COCO_PERSON_CLASS,
            },
            0.5,
        )
    }

    /// Face locator over a single-class face model.
    pub fn face_locator(
        model_path: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::new(model_path, ScoreLayout::SingleClass, confidence)
    }

    fn run(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut boxes = decode(data, &shape, self.layout, min_confidence, &letterbox)?;
        Ok(nms(&mut boxes, NMS_IOU_THRESH))
    }
}

impl PersonDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        self.run(frame, min_confidence)
    }
}

impl FaceLocator for OnnxYoloDetector {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let confidence = self.default_confidence;
        self.run(frame, confidence)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns the NCHW float32 tensor and the mapping back to frame space.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding uses 114/255 gray, the YOLO convention.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Turns a raw `[1, features, detections]` or `[1, detections, features]`
/// output into frame-space boxes scoring at least `min_confidence`.
fn decode(
    data: &[f32],
    shape: &[usize],
    layout: ScoreLayout,
    min_confidence: f64,
    letterbox: &Letterbox,
) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        )
        .into());
    }

    let score_col = layout.score_column();
    if score_col >= num_feats {
        return Err(format!(
            "Score column {score_col} out of range for {num_feats} features"
        )
        .into());
    }

    let value = |det: usize, feat: usize| -> f64 {
        if transposed {
            data[feat * num_dets + det] as f64
        } else {
            data[det * num_feats + feat] as f64
        }
    };

    let Letterbox {
        scale,
        pad_x,
        pad_y,
    } = *letterbox;
    let (pad_x, pad_y) = (pad_x as f64, pad_y as f64);

    let mut boxes = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, score_col);
        if conf < min_confidence {
            continue;
        }
        let cx = value(i, 0);
        let cy = value(i, 1);
        let w = value(i, 2);
        let h = value(i, 3);

        boxes.push(BoundingBox::new(
            ((cx - w / 2.0) - pad_x) / scale,
            ((cy - h / 2.0) - pad_y) / scale,
            ((cx + w / 2.0) - pad_x) / scale,
            ((cy + h / 2.0) - pad_y) / scale,
            conf,
        ));
    }
    Ok(boxes)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(boxes: &mut [BoundingBox], iou_thresh: f64) -> Vec<BoundingBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(boxes[i]);
        for j in (i + 1)..boxes.len() {
            if !suppressed[j] && boxes[i].iou(&boxes[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, new 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        let x = lb.pad_x as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, x]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    /// Lays rows out feature-major (`[1, features, detections]`), padding
    /// with zero-score rows so detections outnumber features as in real
    /// YOLO heads.
    fn feature_major(rows: &[Vec<f32>]) -> (Vec<f32>, Vec<usize>) {
        let num_feats = rows[0].len();
        let num_dets = rows.len().max(num_feats + 1);
        let mut data = vec![0.0; num_feats * num_dets];
        for (det, row) in rows.iter().enumerate() {
            for (feat, v) in row.iter().enumerate() {
                data[feat * num_dets + det] = *v;
            }
        }
        (data, vec![1, num_feats, num_dets])
    }

    #[test]
    fn test_decode_multi_class_picks_person_column() {
        // cx, cy, w, h, person, car
        let (data, shape) = feature_major(&[
            vec![50.0, 50.0, 20.0, 40.0, 0.9, 0.1],
            vec![150.0, 50.0, 20.0, 40.0, 0.2, 0.95],
        ]);
        let layout = ScoreLayout::MultiClass { class_index: 0 };
        let boxes = decode(&data, &shape, layout, 0.5, &IDENTITY).unwrap();

        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        assert_relative_eq!(b.x_min, 40.0);
        assert_relative_eq!(b.y_min, 30.0);
        assert_relative_eq!(b.x_max, 60.0);
        assert_relative_eq!(b.y_max, 70.0);
        assert_relative_eq!(b.confidence, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_row_major_single_class() {
        // [1, 7 detections, 5 features]
        let mut data = vec![0.0f32; 7 * 5];
        data[..5].copy_from_slice(&[10.0, 10.0, 4.0, 4.0, 0.3]);
        data[5..10].copy_from_slice(&[100.0, 100.0, 8.0, 8.0, 0.8]);
        let boxes = decode(&data, &[1, 7, 5], ScoreLayout::SingleClass, 0.5, &IDENTITY).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_relative_eq!(boxes[0].center().x, 100.0);
    }

    #[test]
    fn test_decode_undoes_letterbox() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let (data, shape) = feature_major(&[vec![100.0, 200.0, 40.0, 40.0, 0.9]]);
        let boxes = decode(&data, &shape, ScoreLayout::SingleClass, 0.5, &lb).unwrap();
        assert_eq!(boxes.len(), 1);
        let c = boxes[0].center();
        assert_relative_eq!(c.x, 50.0);
        assert_relative_eq!(c.y, 50.0);
        assert_relative_eq!(boxes[0].width(), 20.0);
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(decode(&[0.0; 5], &[5], ScoreLayout::SingleClass, 0.5, &IDENTITY).is_err());
        let layout = ScoreLayout::MultiClass { class_index: 3 };
        assert!(decode(&[0.0; 6], &[1, 1, 6], layout, 0.5, &IDENTITY).is_err());
        assert!(decode(&[0.0; 4], &[1, 2, 6], ScoreLayout::SingleClass, 0.5, &IDENTITY).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut boxes = vec![
            BoundingBox::new(0.0, 0.0, 100.0, 100.0, 0.8),
            BoundingBox::new(5.0, 5.0, 105.0, 105.0, 0.9),
        ];
        let kept = nms(&mut boxes, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut boxes = vec![
            BoundingBox::new(0.0, 0.0, 50.0, 50.0, 0.9),
            BoundingBox::new(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        assert_eq!(nms(&mut boxes, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut boxes: Vec<BoundingBox> = Vec::new();
        assert!(nms(&mut boxes, 0.3).is_empty());
    }
}
