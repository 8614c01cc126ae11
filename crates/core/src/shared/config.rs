use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Track association parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub distance_threshold: f64,
    pub frame_max: u64,
    pub patience: usize,
    pub retention_frames: u64,
    pub tracking_frames: usize,
    pub face_tracking_threshold: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            frame_max: DEFAULT_FRAME_MAX,
            patience: DEFAULT_PATIENCE,
            retention_frames: DEFAULT_RETENTION_FRAMES,
            tracking_frames: DEFAULT_TRACKING_FRAMES,
            face_tracking_threshold: DEFAULT_FACE_TRACKING_THRESHOLD,
        }
    }
}

/// Dashboard endpoint and cadence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub settings_poll_secs: u64,
    pub report_interval_frames: u64,
    pub live_frame_interval: u64,
    pub jpeg_quality: u8,
    pub settings_timeout_ms: u64,
    pub report_timeout_ms: u64,
    pub frame_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            settings_poll_secs: DEFAULT_SETTINGS_POLL_SECS,
            report_interval_frames: DEFAULT_REPORT_INTERVAL_FRAMES,
            live_frame_interval: DEFAULT_LIVE_FRAME_INTERVAL,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            settings_timeout_ms: DEFAULT_SETTINGS_TIMEOUT_MS,
            report_timeout_ms: DEFAULT_REPORT_TIMEOUT_MS,
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_secs(self.settings_poll_secs)
    }
}

/// Face search parameters for gender attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    pub person_padding: f64,
    pub min_face_size: u32,
    pub face_confidence: f64,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            person_padding: DEFAULT_PERSON_PADDING,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            face_confidence: DEFAULT_FACE_CONFIDENCE,
        }
    }
}

/// Everything the counter needs besides model files and the frame source.
///
/// Every field has a default, so a partial JSON file is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub tracking: TrackingConfig,
    pub api: ApiConfig,
    pub face: FaceConfig,
    /// Sleep after each frame; 0 processes frames as fast as they arrive.
    pub frame_delay_ms: u64,
}

impl CounterConfig {
    /// `<config dir>/Footfall/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Footfall").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tracking;
        if !(t.distance_threshold > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tracking.distance_threshold",
                reason: format!("must be positive, got {}", t.distance_threshold),
            });
        }
        if t.patience == 0 {
            return Err(ConfigError::Invalid {
                field: "tracking.patience",
                reason: "must be at least 1".to_string(),
            });
        }
        if t.retention_frames < t.frame_max {
            return Err(ConfigError::Invalid {
                field: "tracking.retention_frames",
                reason: format!(
                    "must be >= frame_max ({}), got {}",
                    t.frame_max, t.retention_frames
                ),
            });
        }
        if t.tracking_frames == 0 {
            return Err(ConfigError::Invalid {
                field: "tracking.tracking_frames",
                reason: "must be at least 1".to_string(),
            });
        }
        let a = &self.api;
        if a.report_interval_frames == 0 || a.live_frame_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "api",
                reason: "report and live frame intervals must be at least 1".to_string(),
            });
        }
        if !(1..=100).contains(&a.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "api.jpeg_quality",
                reason: format!("must be between 1 and 100, got {}", a.jpeg_quality),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_reference_parameters() {
        let config = CounterConfig::default();
        assert_relative_eq!(config.tracking.distance_threshold, 20.0);
        assert_eq!(config.tracking.frame_max, 5);
        assert_eq!(config.tracking.patience, 100);
        assert_eq!(config.tracking.tracking_frames, 10);
        assert_eq!(config.api.settings_poll_secs, 5);
        assert_eq!(config.api.report_interval_frames, 10);
        assert_eq!(config.api.live_frame_interval, 3);
        assert_eq!(config.api.jpeg_quality, 85);
        assert_eq!(config.face.min_face_size, 30);
        assert_relative_eq!(config.face.face_confidence, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CounterConfig =
            serde_json::from_str(r#"{"tracking": {"frame_max": 8}, "frame_delay_ms": 33}"#)
                .unwrap();
        assert_eq!(config.tracking.frame_max, 8);
        assert_relative_eq!(config.tracking.distance_threshold, 20.0);
        assert_eq!(config.frame_delay_ms, 33);
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = CounterConfig::default();
        config.api.base_url = "http://dashboard:8000".to_string();
        config.save(&path).unwrap();

        let loaded = CounterConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = CounterConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = CounterConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_retention_shorter_than_window_rejected() {
        let mut config = CounterConfig::default();
        config.tracking.retention_frames = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retention_frames"));
    }

    #[test]
    fn test_zero_patience_rejected() {
        let mut config = CounterConfig::default();
        config.tracking.patience = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_path_is_required_to_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(CounterConfig::load_or_default(Some(&missing)).is_err());
    }
}
