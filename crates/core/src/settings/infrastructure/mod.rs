pub mod http_settings_source;
pub mod settings_poller;
