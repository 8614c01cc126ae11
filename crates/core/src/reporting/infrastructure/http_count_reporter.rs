use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Serialize;

use crate::reporting::domain::count_reporter::{CountReport, CountReporter, GenderReport};
use crate::shared::api_error::{endpoint_url, ApiError};
use crate::shared::config::ApiConfig;
use crate::shared::constants::{COUNT_ENDPOINT, FRAME_ENDPOINT, GENDER_ENDPOINT};

/// Posts counts and live frames to the dashboard API.
///
/// JSON updates and frame uploads use separate clients so each gets its
/// own timeout.
pub struct HttpCountReporter {
    report_client: Client,
    frame_client: Client,
    count_url: String,
    gender_url: String,
    frame_url: String,
}

impl HttpCountReporter {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let report_client = build_client(Duration::from_millis(config.report_timeout_ms))?;
        let frame_client = build_client(Duration::from_millis(config.frame_timeout_ms))?;
        Ok(Self {
            report_client,
            frame_client,
            count_url: endpoint_url(&config.base_url, COUNT_ENDPOINT),
            gender_url: endpoint_url(&config.base_url, GENDER_ENDPOINT),
            frame_url: endpoint_url(&config.base_url, FRAME_ENDPOINT),
        })
    }

    fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<(), ApiError> {
        self.report_client
            .post(url)
            .json(body)
            .send()
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })
    }
}

fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ApiError::Client)
}

impl CountReporter for HttpCountReporter {
    fn report_counts(&mut self, report: &CountReport) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.post_json(&self.count_url, report)?)
    }

    fn report_gender(&mut self, report: &GenderReport) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.post_json(&self.gender_url, report)?)
    }

    fn report_frame(&mut self, jpeg: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
        let part = Part::bytes(jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|source| ApiError::Request {
                url: self.frame_url.clone(),
                source,
            })?;
        let form = Form::new().part("frame", part);
        self.frame_client
            .post(&self.frame_url)
            .multipart(form)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| ApiError::Request {
                url: self.frame_url.clone(),
                source,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> ApiConfig {
        ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            report_timeout_ms: 200,
            frame_timeout_ms: 200,
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_endpoints_built_from_base_url() {
        let reporter = HttpCountReporter::new(&ApiConfig::default()).unwrap();
        assert_eq!(
            reporter.count_url,
            "http://localhost:5000/api/internal/update-count"
        );
        assert_eq!(
            reporter.gender_url,
            "http://localhost:5000/api/gender-classification/update"
        );
        assert_eq!(
            reporter.frame_url,
            "http://localhost:5000/api/internal/update-frame"
        );
    }

    #[test]
    fn test_unreachable_dashboard_returns_error() {
        let mut reporter = HttpCountReporter::new(&unreachable_config()).unwrap();
        let report = CountReport {
            total_count: 1,
            current_in_roi: 0,
        };
        assert!(reporter.report_counts(&report).is_err());
        assert!(reporter.report_frame(vec![0xFF, 0xD8]).is_err());
    }
}
