use serde::{Deserialize, Serialize};
use serde_json::Value;

const ROI_KEYS: [&str; 4] = [
    "x_start_percent",
    "x_end_percent",
    "y_start_percent",
    "y_end_percent",
];

/// Region of interest as percentages of the frame width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiConfig {
    pub x_start_percent: f64,
    pub x_end_percent: f64,
    pub y_start_percent: f64,
    pub y_end_percent: f64,
}

impl RoiConfig {
    pub fn new(x_start: f64, x_end: f64, y_start: f64, y_end: f64) -> Self {
        Self {
            x_start_percent: x_start,
            x_end_percent: x_end,
            y_start_percent: y_start,
            y_end_percent: y_end,
        }
    }

    /// Reads an ROI from a settings payload.
    ///
    /// Returns `None` unless the value is an object carrying all four
    /// numeric percentage keys. Extra keys are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut percents = [0.0; 4];
        for (slot, key) in percents.iter_mut().zip(ROI_KEYS) {
            *slot = object.get(key)?.as_f64()?;
        }
        let [x_start, x_end, y_start, y_end] = percents;
        Some(Self::new(x_start, x_end, y_start, y_end))
    }
}
