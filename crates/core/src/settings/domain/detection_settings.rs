use serde::Deserialize;
use serde_json::Value;

use crate::roi::domain::roi_config::RoiConfig;
use crate::shared::constants::DEFAULT_SENSITIVITY;

/// Operator-controlled detection settings, as last fetched from the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SettingsPayload")]
pub struct DetectionSettings {
    pub enabled: bool,
    /// 0-100. Not validated; out-of-range values extrapolate the threshold.
    pub sensitivity: f64,
    pub roi: Option<RoiConfig>,
    pub reset_token: i64,
}

impl DetectionSettings {
    /// Maps sensitivity linearly onto `[0.5, 0.95]`.
    pub fn confidence_threshold(&self) -> f64 {
        0.5 + (self.sensitivity / 100.0) * 0.45
    }
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: DEFAULT_SENSITIVITY,
            roi: None,
            reset_token: 0,
        }
    }
}

/// Wire shape of the settings response. Missing or mistyped `enabled` and
/// `sensitivity` fall back to the defaults so one bad value never costs the
/// ROI or reset token of the same poll.
#[derive(Default, Deserialize)]
#[serde(default)]
struct SettingsPayload {
    enabled: Option<Value>,
    sensitivity: Option<Value>,
    roi_config: Option<Value>,
    reset_token: i64,
}

impl From<SettingsPayload> for DetectionSettings {
    fn from(payload: SettingsPayload) -> Self {
        let defaults = DetectionSettings::default();
        Self {
            enabled: payload
                .enabled
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(defaults.enabled),
            sensitivity: payload
                .sensitivity
                .as_ref()
                .and_then(Value::as_f64)
                .unwrap_or(defaults.sensitivity),
            roi: payload.roi_config.as_ref().and_then(RoiConfig::from_value),
            reset_token: payload.reset_token,
        }
    }
}
