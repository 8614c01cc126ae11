//! End-to-end counting over an on-disk frame sequence with scripted oracles.
use std::path::Path;
use std::sync::{Arc, Mutex};

use footfall_core::detection::domain::face_locator::FaceLocator;
use footfall_core::detection::domain::gender_attributor::GenderAttributor;
use footfall_core::detection::domain::gender_classifier::GenderClassifier;
use footfall_core::detection::domain::person_detector::PersonDetector;
use footfall_core::pipeline::count_people_use_case::{CountPeopleUseCase, PersonCounter};
use footfall_core::pipeline::counting_loop::CountingLoop;
use footfall_core::reporting::domain::count_reporter::{CountReport, CountReporter, GenderReport};
use footfall_core::reporting::infrastructure::background_reporter::BackgroundReporter;
use footfall_core::roi::domain::roi_config::RoiConfig;
use footfall_core::settings::domain::detection_settings::DetectionSettings;
use footfall_core::shared::config::{CounterConfig, FaceConfig};
use footfall_core::shared::frame::Frame;
use footfall_core::shared::gender::{Gender, GenderPrediction};
use footfall_core::shared::geometry::BoundingBox;
use footfall_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;

const WIDTH: u32 = 120;
const HEIGHT: u32 = 80;
const FRAMES: usize = 8;

/// Left half black, right half white.
fn write_frames(dir: &Path) {
    for i in 0..FRAMES {
        let img = image::RgbImage::from_fn(WIDTH, HEIGHT, |x, _| {
            if x < WIDTH / 2 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        img.save(dir.join(format!("frame_{i:03}.png"))).unwrap();
    }
}

/// One person walking right in the dark half; a second standing in the
/// bright half from frame 4 on.
struct WalkingPeople {
    calls: usize,
}

impl PersonDetector for WalkingPeople {
    fn detect(
        &mut self,
        _frame: &Frame,
        _min_confidence: f64,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let i = self.calls as f64;
        self.calls += 1;
        let mut boxes = vec![BoundingBox::new(5.0 + 2.0 * i, 10.0, 35.0 + 2.0 * i, 70.0, 0.9)];
        if self.calls > 4 {
            boxes.push(BoundingBox::new(75.0, 10.0, 105.0, 70.0, 0.8));
        }
        Ok(boxes)
    }
}

/// A 35x35 face five pixels into every crop.
struct FixedFace;

impl FaceLocator for FixedFace {
    fn locate(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        Ok(vec![BoundingBox::new(5.0, 5.0, 40.0, 40.0, 0.9)])
    }
}

/// FEMALE for bright crops, MALE for dark ones.
struct BrightnessClassifier;

impl GenderClassifier for BrightnessClassifier {
    fn classify(&mut self, face: &Frame) -> Result<GenderPrediction, Box<dyn std::error::Error>> {
        let mean = face.data().iter().map(|&v| v as f64).sum::<f64>() / face.data().len() as f64;
        let gender = if mean > 128.0 {
            Gender::Female
        } else {
            Gender::Male
        };
        Ok(GenderPrediction::new(gender, 0.9))
    }
}

#[derive(Default)]
struct Recorded {
    counts: Vec<CountReport>,
    genders: Vec<GenderReport>,
    frames: usize,
}

struct RecordingReporter(Arc<Mutex<Recorded>>);

impl CountReporter for RecordingReporter {
    fn report_counts(&mut self, report: &CountReport) -> Result<(), Box<dyn std::error::Error>> {
        self.0.lock().unwrap().counts.push(*report);
        Ok(())
    }

    fn report_gender(&mut self, report: &GenderReport) -> Result<(), Box<dyn std::error::Error>> {
        self.0.lock().unwrap().genders.push(report.clone());
        Ok(())
    }

    fn report_frame(&mut self, _jpeg: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
        self.0.lock().unwrap().frames += 1;
        Ok(())
    }
}

fn people_use_case(roi: RoiConfig, recorded: &Arc<Mutex<Recorded>>) -> CountPeopleUseCase {
    let reporter = BackgroundReporter::with_capacity(
        Box::new(RecordingReporter(Arc::clone(recorded))),
        32,
    );
    let runner = CountingLoop::new(Box::new(reporter), &CounterConfig::default())
        .with_initial_settings(DetectionSettings {
            roi: Some(roi),
            ..DetectionSettings::default()
        });
    let attributor = GenderAttributor::new(
        Box::new(FixedFace),
        Box::new(BrightnessClassifier),
        &FaceConfig::default(),
    );
    let counter = PersonCounter::new(Box::new(WalkingPeople { calls: 0 }), attributor);
    CountPeopleUseCase::new(Box::new(ImageSequenceReader::new()), counter, runner)
}

#[test]
fn test_counts_each_person_once_with_gender() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());
    let recorded = Arc::new(Mutex::new(Recorded::default()));

    let summary = {
        let mut use_case = people_use_case(RoiConfig::new(0.0, 100.0, 0.0, 100.0), &recorded);
        let summary = use_case.execute(dir.path()).unwrap();
        assert_eq!(use_case.state().ledger().len(), 2);
        summary
        // dropping the use case flushes the background reporter
    };

    assert_eq!(summary.frames_processed, FRAMES);
    assert_eq!(summary.frames_paused, 0);
    assert_eq!(summary.counts.total_count, 2);
    assert_eq!(summary.counts.male_count, 1);
    assert_eq!(summary.counts.female_count, 1);
    assert_eq!(summary.counts.current_in_roi, 2);

    let recorded = recorded.lock().unwrap();
    // frame 0 plus the final report
    assert_eq!(recorded.counts.len(), 2);
    assert_eq!(recorded.counts[0].total_count, 1);
    assert_eq!(recorded.counts[1].total_count, 2);
    let last = recorded.genders.last().unwrap();
    assert_eq!(last.male_count + last.female_count, last.total_count);
    // frames 0, 3 and 6
    assert_eq!(recorded.frames, 3);
}

#[test]
fn test_invalid_roi_pauses_but_keeps_streaming() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());
    let recorded = Arc::new(Mutex::new(Recorded::default()));

    let summary = {
        let mut use_case = people_use_case(RoiConfig::new(80.0, 20.0, 0.0, 100.0), &recorded);
        use_case.execute(dir.path()).unwrap()
    };

    assert_eq!(summary.frames_paused, FRAMES);
    assert_eq!(summary.counts.total_count, 0);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.frames, FRAMES);
    assert_eq!(recorded.counts.len(), 1);
}

#[test]
fn test_missing_input_directory_is_an_error() {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let mut use_case = people_use_case(RoiConfig::new(0.0, 100.0, 0.0, 100.0), &recorded);
    assert!(use_case.execute(Path::new("/nonexistent/frames")).is_err());
}
