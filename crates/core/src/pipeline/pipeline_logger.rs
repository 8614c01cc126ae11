use std::collections::HashMap;
use std::time::Instant;

use crate::counting::domain::counting_state::CountSnapshot;

/// Cross-cutting logger for counting loop events.
///
/// Decouples use cases from specific output mechanisms so each caller can
/// observe the loop without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 for streams of unknown length.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. people in ROI).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Record the latest counters.
    fn counts(&mut self, _snapshot: &CountSnapshot) {}

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: per-stage timing, metrics and the final count check.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_seen: usize,
    last_counts: Option<CountSnapshot>,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            last_counts: None,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.last_counts.is_none() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = Vec::new();

        lines.push(format!(
            "Run summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let max = values.iter().copied().fold(0.0, f64::max);
            lines.push(format!("  {name}: avg {:.1}, max {max:.0}", mean(values)));
        }

        if let Some(c) = &self.last_counts {
            lines.push(format!(
                "  Counts: male {} + female {} = total {}",
                c.male_count, c.female_count, c.total_count
            ));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Processing: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn counts(&mut self, snapshot: &CountSnapshot) {
        self.last_counts = Some(*snapshot);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("in_roi", 3.0);
        logger.info("hello");
        logger.counts(&CountSnapshot::default());
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("classify", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.len(), 2);
        assert_relative_eq!(mean(detect), 25.0);
        assert_eq!(logger.timings_for("classify").unwrap().len(), 1);
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("in_roi", 3.0);
        logger.metric("in_roi", 4.0);
        assert_relative_eq!(mean(logger.metrics_for("in_roi").unwrap()), 3.5);
    }

    #[test]
    fn test_summary_includes_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(10, 0);
        logger.timing("detect", 20.0);
        logger.metric("in_roi", 3.0);
        logger.metric("in_roi", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (10 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("in_roi: avg 3.5, max 4"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_summary_includes_count_check() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.counts(&CountSnapshot {
            male_count: 2,
            female_count: 3,
            total_count: 5,
            ..CountSnapshot::default()
        });
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("male 2 + female 3 = total 5"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_seen() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 25);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_throttle_is_at_least_one() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }
}
