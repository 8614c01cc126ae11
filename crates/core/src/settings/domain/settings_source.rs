use crate::settings::domain::detection_settings::DetectionSettings;

/// Domain interface for fetching the current detection settings.
pub trait SettingsSource: Send {
    fn fetch(&self) -> Result<DetectionSettings, Box<dyn std::error::Error>>;
}
