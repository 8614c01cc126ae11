pub mod detection_settings;
pub mod settings_reconciler;
pub mod settings_source;
