use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::counting::domain::counting_state::{CountSnapshot, CountingState};
use crate::pipeline::frame_annotator::{AnnotatedPerson, FrameAnnotator, Overlay};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::reporting::domain::count_reporter::{CountReport, CountReporter, GenderReport};
use crate::roi::domain::roi_gate::{self, RoiDecision};
use crate::settings::domain::detection_settings::DetectionSettings;
use crate::settings::domain::settings_reconciler::{ReconcileOutcome, SettingsReconciler};
use crate::shared::config::CounterConfig;
use crate::shared::frame::Frame;
use crate::shared::geometry::PixelRect;
use crate::tracking::domain::track_store::TrackStoreParams;
use crate::video::domain::frame_source::FrameSource;
use crate::video::infrastructure::jpeg_encoder::encode_jpeg;

const DISABLED_STATUS: &str = "Detection disabled";

/// What a counter found on one gated frame.
#[derive(Debug, Default)]
pub struct FrameCount {
    pub people: Vec<AnnotatedPerson>,
    /// Detections inside the ROI on this frame.
    pub in_roi: usize,
}

/// Detection and counting strategy run on frames the ROI gate lets through.
pub trait FrameCounter: Send {
    /// `region` is the active ROI in full-frame pixels. Everything written to
    /// `state` and returned must be in full-frame coordinates.
    fn count_frame(
        &mut self,
        frame: &Frame,
        region: &PixelRect,
        min_confidence: f64,
        frame_index: u64,
        state: &mut CountingState,
    ) -> Result<FrameCount, Box<dyn std::error::Error>>;

    /// Called after a reset cleared `CountingState`; drop any private memory.
    fn reset(&mut self) {}
}

/// Outcome of a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: usize,
    /// Frames where detection was skipped (disabled or ROI problems).
    pub frames_paused: usize,
    pub resets: usize,
    pub counts: CountSnapshot,
}

/// The frame-sequential loop shared by every counting mode.
///
/// Per frame: apply pending settings, gate on enable flag and ROI, run the
/// counter, close the frame on `CountingState`, then report on schedule.
/// Owns the only `CountingState`, so resets land between frames.
pub struct CountingLoop {
    reporter: Box<dyn CountReporter>,
    annotator: FrameAnnotator,
    logger: Box<dyn PipelineLogger>,
    settings_rx: Option<Receiver<DetectionSettings>>,
    reconciler: SettingsReconciler,
    state: CountingState,
    report_interval: u64,
    live_interval: u64,
    jpeg_quality: u8,
    frame_delay: Duration,
}

impl CountingLoop {
    pub fn new(reporter: Box<dyn CountReporter>, config: &CounterConfig) -> Self {
        Self {
            reporter,
            annotator: FrameAnnotator::new(),
            logger: Box::new(NullPipelineLogger),
            settings_rx: None,
            reconciler: SettingsReconciler::new(),
            state: CountingState::new(TrackStoreParams::from(&config.tracking)),
            report_interval: config.api.report_interval_frames.max(1),
            live_interval: config.api.live_frame_interval.max(1),
            jpeg_quality: config.api.jpeg_quality,
            frame_delay: Duration::from_millis(config.frame_delay_ms),
        }
    }

    pub fn with_settings(mut self, settings_rx: Receiver<DetectionSettings>) -> Self {
        self.settings_rx = Some(settings_rx);
        self
    }

    /// Settings in force before the first poll result arrives, e.g. a local
    /// ROI when no dashboard is configured.
    pub fn with_initial_settings(mut self, settings: DetectionSettings) -> Self {
        self.reconciler.apply(settings, &mut self.state);
        self
    }

    pub fn with_annotator(mut self, annotator: FrameAnnotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> &CountingState {
        &self.state
    }

    pub fn settings(&self) -> &DetectionSettings {
        self.reconciler.current()
    }

    /// Runs until the source is exhausted. A source error ends the run.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        input: &Path,
        counter: &mut dyn FrameCounter,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let metadata = source.open(input)?;
        let total = metadata.total_frames;
        let mut summary = RunSummary {
            frames_processed: 0,
            frames_paused: 0,
            resets: 0,
            counts: self.state.snapshot(),
        };

        let result = self.run_frames(source, total, counter, &mut summary);
        source.close();
        result?;

        self.report_counts();
        summary.counts = self.state.snapshot();
        self.logger.counts(&summary.counts);
        self.logger.summary();
        Ok(summary)
    }

    fn run_frames(
        &mut self,
        source: &mut dyn FrameSource,
        total: usize,
        counter: &mut dyn FrameCounter,
        summary: &mut RunSummary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for frame_result in source.frames() {
            let frame = frame_result?;
            let frame_index = summary.frames_processed as u64;

            summary.resets += self.apply_pending_settings(counter);
            let paused = self.process_frame(frame, frame_index, counter);
            if paused {
                summary.frames_paused += 1;
            }

            summary.frames_processed += 1;
            self.logger.progress(summary.frames_processed, total);
            if !self.frame_delay.is_zero() {
                std::thread::sleep(self.frame_delay);
            }
        }
        Ok(())
    }

    /// Drains every settings update that arrived since the last frame.
    /// Returns the number of resets applied.
    fn apply_pending_settings(&mut self, counter: &mut dyn FrameCounter) -> usize {
        let Some(rx) = &self.settings_rx else {
            return 0;
        };
        let mut resets = 0;
        for settings in rx.try_iter() {
            if self.reconciler.apply(settings, &mut self.state) == ReconcileOutcome::Reset {
                counter.reset();
                self.logger.info("Counters reset");
                resets += 1;
            }
        }
        resets
    }

    /// Processes one frame. Returns `true` when detection was paused.
    fn process_frame(&mut self, frame: Frame, frame_index: u64, counter: &mut dyn FrameCounter) -> bool {
        let settings = self.reconciler.current();
        let decision = if settings.enabled {
            roi_gate::evaluate(settings.roi.as_ref(), frame.width(), frame.height())
        } else {
            RoiDecision::Disabled
        };
        let threshold = settings.confidence_threshold();
        let status = match (settings.enabled, decision) {
            (false, _) => Some(DISABLED_STATUS),
            (true, d) => d.status_text(),
        };

        let RoiDecision::Active(region) = decision else {
            self.state.finish_frame(frame_index, 0);
            // Paused frames stream every frame so the operator sees the status.
            let overlay = Overlay {
                status,
                counts: self.state.snapshot(),
                ..Overlay::default()
            };
            self.send_live_frame(frame, &overlay);
            return true;
        };

        let start = Instant::now();
        let found = match counter.count_frame(&frame, &region, threshold, frame_index, &mut self.state) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Detection failed on frame {frame_index}: {e}");
                FrameCount::default()
            }
        };
        self.logger
            .timing("count", start.elapsed().as_secs_f64() * 1000.0);
        self.logger.metric("in_roi", found.in_roi as f64);

        self.state.finish_frame(frame_index, found.in_roi);

        if frame_index % self.report_interval == 0 {
            self.report_counts();
        }
        if frame_index % self.live_interval == 0 {
            let overlay = Overlay {
                roi: Some(region),
                status: None,
                people: found.people,
                counts: self.state.snapshot(),
            };
            self.send_live_frame(frame, &overlay);
        }
        false
    }

    fn report_counts(&mut self) {
        let snapshot = self.state.snapshot();
        self.logger.counts(&snapshot);
        if let Err(e) = self.reporter.report_counts(&CountReport::from_snapshot(&snapshot)) {
            log::debug!("Count report dropped: {e}");
        }
        let gender = GenderReport::from_snapshot(&snapshot, chrono::Local::now());
        if let Err(e) = self.reporter.report_gender(&gender) {
            log::debug!("Gender report dropped: {e}");
        }
    }

    fn send_live_frame(&mut self, frame: Frame, overlay: &Overlay) {
        let start = Instant::now();
        let jpeg = self
            .annotator
            .annotate(frame, overlay)
            .and_then(|annotated| encode_jpeg(&annotated, self.jpeg_quality));
        self.logger
            .timing("annotate", start.elapsed().as_secs_f64() * 1000.0);
        match jpeg {
            Ok(bytes) => {
                if let Err(e) = self.reporter.report_frame(bytes) {
                    log::debug!("Live frame dropped: {e}");
                }
            }
            Err(e) => log::warn!("Failed to render live frame: {e}"),
        }
    }
}
