pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

pub const SETTINGS_ENDPOINT: &str = "/api/person-counting";
pub const COUNT_ENDPOINT: &str = "/api/internal/update-count";
pub const GENDER_ENDPOINT: &str = "/api/gender-classification/update";
pub const FRAME_ENDPOINT: &str = "/api/internal/update-frame";

/// Max pixel distance between a detection and a track's last center to match.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 20.0;

/// Max frame gap between a track's last sighting and a new detection.
pub const DEFAULT_FRAME_MAX: u64 = 5;

/// Position history entries kept per track.
pub const DEFAULT_PATIENCE: usize = 100;

/// Frames after its last sighting before a track leaves the active set.
pub const DEFAULT_RETENTION_FRAMES: u64 = 100;

/// Capacity of the recent-face ring buffer.
pub const DEFAULT_TRACKING_FRAMES: usize = 10;

/// Face-only mode: pixel distance under which a face is a known person.
pub const DEFAULT_FACE_TRACKING_THRESHOLD: f64 = 50.0;

/// Pixels added around a person box before searching it for a face.
pub const DEFAULT_PERSON_PADDING: f64 = 20.0;

/// Smallest face (both sides, px) worth sending to the gender classifier.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 30;
pub const DEFAULT_FACE_CONFIDENCE: f64 = 0.5;

pub const DEFAULT_SETTINGS_POLL_SECS: u64 = 5;
pub const DEFAULT_REPORT_INTERVAL_FRAMES: u64 = 10;
pub const DEFAULT_LIVE_FRAME_INTERVAL: u64 = 3;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

pub const DEFAULT_SETTINGS_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_REPORT_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 100;

/// Sensitivity assumed until the dashboard has answered once.
pub const DEFAULT_SENSITIVITY: f64 = 80.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const PERSON_MODEL_NAME: &str = "yolov8n.onnx";
pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const GENDER_MODEL_NAME: &str = "gender_classification.onnx";
