use std::time::Duration;

use crate::settings::domain::detection_settings::DetectionSettings;
use crate::settings::domain::settings_source::SettingsSource;
use crate::shared::api_error::{endpoint_url, ApiError};
use crate::shared::constants::SETTINGS_ENDPOINT;

/// Reads detection settings from the dashboard's person-counting endpoint.
pub struct HttpSettingsSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSettingsSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            client,
            url: endpoint_url(base_url, SETTINGS_ENDPOINT),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn get(&self) -> Result<DetectionSettings, ApiError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| ApiError::Request {
                url: self.url.clone(),
                source,
            })?;
        response.json().map_err(|source| ApiError::Decode {
            url: self.url.clone(),
            source,
        })
    }
}

impl SettingsSource for HttpSettingsSource {
    fn fetch(&self) -> Result<DetectionSettings, Box<dyn std::error::Error>> {
        Ok(self.get()?)
    }
}
