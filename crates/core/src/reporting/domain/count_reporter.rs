use chrono::{DateTime, Local};
use serde::Serialize;

use crate::counting::domain::counting_state::CountSnapshot;

/// Body of the aggregate count update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountReport {
    pub total_count: u64,
    pub current_in_roi: usize,
}

/// Body of the gender aggregate update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderReport {
    pub male_count: u64,
    pub female_count: u64,
    pub total_count: u64,
    /// Local time, ISO-8601 without offset.
    pub timestamp: String,
}

impl CountReport {
    pub fn from_snapshot(snapshot: &CountSnapshot) -> Self {
        Self {
            total_count: snapshot.total_count,
            current_in_roi: snapshot.current_in_roi,
        }
    }
}

impl GenderReport {
    pub fn from_snapshot(snapshot: &CountSnapshot, at: DateTime<Local>) -> Self {
        Self {
            male_count: snapshot.male_count,
            female_count: snapshot.female_count,
            total_count: snapshot.male_count + snapshot.female_count,
            timestamp: at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

/// Domain interface for pushing counts and live frames to the dashboard.
///
/// Every call is best-effort; callers log failures and carry on.
pub trait CountReporter: Send {
    fn report_counts(&mut self, report: &CountReport) -> Result<(), Box<dyn std::error::Error>>;

    fn report_gender(&mut self, report: &GenderReport) -> Result<(), Box<dyn std::error::Error>>;

    /// Sends one JPEG-encoded live frame.
    fn report_frame(&mut self, jpeg: Vec<u8>) -> Result<(), Box<dyn std::error::Error>>;
}

/// Reporter that drops everything. Used when no dashboard is configured.
pub struct NullCountReporter;

impl CountReporter for NullCountReporter {
    fn report_counts(&mut self, _report: &CountReport) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn report_gender(&mut self, _report: &GenderReport) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn report_frame(&mut self, _jpeg: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
