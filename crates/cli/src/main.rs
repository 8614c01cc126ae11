use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use footfall_core::detection::domain::gender_attributor::GenderAttributor;
use footfall_core::detection::infrastructure::onnx_gender_classifier::OnnxGenderClassifier;
use footfall_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use footfall_core::pipeline::count_faces_use_case::{CountFacesUseCase, FaceCounter};
use footfall_core::pipeline::count_people_use_case::{CountPeopleUseCase, PersonCounter};
use footfall_core::pipeline::counting_loop::{CountingLoop, RunSummary};
use footfall_core::pipeline::frame_annotator::FrameAnnotator;
use footfall_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use footfall_core::reporting::domain::count_reporter::{CountReporter, NullCountReporter};
use footfall_core::reporting::infrastructure::background_reporter::BackgroundReporter;
use footfall_core::reporting::infrastructure::http_count_reporter::HttpCountReporter;
use footfall_core::roi::domain::roi_config::RoiConfig;
use footfall_core::settings::domain::detection_settings::DetectionSettings;
use footfall_core::settings::infrastructure::http_settings_source::HttpSettingsSource;
use footfall_core::settings::infrastructure::settings_poller::SettingsPoller;
use footfall_core::shared::config::CounterConfig;
use footfall_core::shared::constants::{FACE_MODEL_NAME, GENDER_MODEL_NAME, PERSON_MODEL_NAME};
use footfall_core::shared::model_resolver::{self, ModelSource};
use footfall_core::video::domain::frame_source::FrameSource;
use footfall_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Detect people, track them and attribute gender from their faces.
    People,
    /// Locate faces directly and deduplicate them by position.
    Faces,
}

/// Deduplicated people counting with gender attribution on CCTV frames.
#[derive(Parser)]
#[command(name = "footfall")]
struct Cli {
    /// Directory of frames (read in name order) or a single image.
    input: PathBuf,

    /// JSON config file. Defaults to the platform config dir when present.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "people")]
    mode: Mode,

    /// Dashboard base URL (overrides the config file).
    #[arg(long)]
    api_url: Option<String>,

    /// Run without polling settings or reporting counts.
    #[arg(long)]
    no_dashboard: bool,

    /// Local ROI as x_start,x_end,y_start,y_end percentages.
    /// Used until the dashboard sends its own settings.
    #[arg(long, value_delimiter = ',', num_args = 4)]
    roi: Option<Vec<f64>>,

    /// Initial sensitivity (0-100) until the dashboard answers.
    #[arg(long)]
    sensitivity: Option<f64>,

    #[arg(long)]
    person_model: Option<PathBuf>,

    #[arg(long)]
    person_model_url: Option<String>,

    #[arg(long)]
    face_model: Option<PathBuf>,

    #[arg(long)]
    face_model_url: Option<String>,

    #[arg(long)]
    gender_model: Option<PathBuf>,

    #[arg(long)]
    gender_model_url: Option<String>,

    /// TTF/OTF font for overlay text. Without one only shapes are drawn.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Sleep after each frame, in milliseconds.
    #[arg(long)]
    frame_delay_ms: Option<u64>,

    /// Max pixel distance for a detection to continue a track.
    #[arg(long)]
    distance_threshold: Option<f64>,

    /// Max frame gap for a detection to continue a track.
    #[arg(long)]
    frame_max: Option<u64>,

    /// Face locator confidence threshold (0.0-1.0).
    #[arg(long)]
    face_confidence: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = load_config(&cli)?;

    let attributor = build_attributor(&cli, &config)?;
    let source: Box<dyn FrameSource> = Box::new(ImageSequenceReader::new());

    let mut poller = None;
    let reporter: Box<dyn CountReporter> = if cli.no_dashboard {
        Box::new(NullCountReporter)
    } else {
        let timeout = Duration::from_millis(config.api.settings_timeout_ms);
        let settings_source = HttpSettingsSource::new(&config.api.base_url, timeout)?;
        log::info!("Polling settings from {}", settings_source.url());
        poller = Some(SettingsPoller::spawn(
            Box::new(settings_source),
            config.api.settings_poll_interval(),
        ));
        Box::new(BackgroundReporter::new(Box::new(HttpCountReporter::new(
            &config.api,
        )?)))
    };

    let annotator = match &cli.font {
        Some(path) => FrameAnnotator::with_font_file(path)?,
        None => FrameAnnotator::new(),
    };
    let mut runner = CountingLoop::new(reporter, &config)
        .with_annotator(annotator)
        .with_logger(Box::new(StdoutPipelineLogger::default()));
    if let Some(settings) = initial_settings(&cli) {
        runner = runner.with_initial_settings(settings);
    }
    if let Some(poller) = &poller {
        runner = runner.with_settings(poller.receiver());
    }

    let summary = match cli.mode {
        Mode::People => {
            log::info!("Resolving model: {PERSON_MODEL_NAME}");
            let model_path = resolve_model(
                PERSON_MODEL_NAME,
                cli.person_model.as_deref(),
                cli.person_model_url.as_deref(),
            )?;
            let detector = OnnxYoloDetector::person_detector(&model_path)?;
            let counter = PersonCounter::new(Box::new(detector), attributor);
            CountPeopleUseCase::new(source, counter, runner).execute(&cli.input)?
        }
        Mode::Faces => {
            let counter = FaceCounter::new(attributor, &config.tracking);
            CountFacesUseCase::new(source, counter, runner).execute(&cli.input)?
        }
    };

    if let Some(mut poller) = poller {
        poller.stop();
    }
    print_summary(&summary);
    Ok(())
}

fn build_attributor(
    cli: &Cli,
    config: &CounterConfig,
) -> Result<GenderAttributor, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let face_path = resolve_model(
        FACE_MODEL_NAME,
        cli.face_model.as_deref(),
        cli.face_model_url.as_deref(),
    )?;
    log::info!("Resolving model: {GENDER_MODEL_NAME}");
    let gender_path = resolve_model(
        GENDER_MODEL_NAME,
        cli.gender_model.as_deref(),
        cli.gender_model_url.as_deref(),
    )?;

    let locator = OnnxYoloDetector::face_locator(&face_path, config.face.face_confidence)?;
    let classifier = OnnxGenderClassifier::new(&gender_path)?;
    Ok(GenderAttributor::new(
        Box::new(locator),
        Box::new(classifier),
        &config.face,
    ))
}

fn resolve_model(
    name: &str,
    explicit_path: Option<&Path>,
    url: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let source = ModelSource {
        name,
        explicit_path,
        url,
    };
    let path = model_resolver::resolve(&source, Some(Box::new(download_progress)))?;
    if url.is_some() {
        eprintln!();
    }
    Ok(path)
}

/// Config file first, then CLI overrides, then validation of the result.
fn load_config(cli: &Cli) -> Result<CounterConfig, Box<dyn std::error::Error>> {
    let mut config = CounterConfig::load_or_default(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(delay) = cli.frame_delay_ms {
        config.frame_delay_ms = delay;
    }
    if let Some(distance) = cli.distance_threshold {
        config.tracking.distance_threshold = distance;
    }
    if let Some(frame_max) = cli.frame_max {
        config.tracking.frame_max = frame_max;
        config.tracking.retention_frames = config.tracking.retention_frames.max(frame_max);
    }
    if let Some(confidence) = cli.face_confidence {
        config.face.face_confidence = confidence;
    }
    config.validate()?;
    Ok(config)
}

fn initial_settings(cli: &Cli) -> Option<DetectionSettings> {
    if cli.roi.is_none() && cli.sensitivity.is_none() {
        return None;
    }
    let mut settings = DetectionSettings::default();
    let roi = cli
        .roi
        .as_deref()
        .and_then(|values| <[f64; 4]>::try_from(values).ok());
    if let Some([x_start, x_end, y_start, y_end]) = roi {
        settings.roi = Some(RoiConfig::new(x_start, x_end, y_start, y_end));
    }
    if let Some(sensitivity) = cli.sensitivity {
        settings.sensitivity = sensitivity;
    }
    Some(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if let Some(roi) = &cli.roi {
        if roi.len() != 4 {
            return Err(format!("--roi needs 4 values, got {}", roi.len()).into());
        }
    }
    if let Some(s) = cli.sensitivity {
        if !(0.0..=100.0).contains(&s) {
            return Err(format!("Sensitivity must be between 0 and 100, got {s}").into());
        }
    }
    if let Some(c) = cli.face_confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Face confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    if let Some(font) = &cli.font {
        if !font.exists() {
            return Err(format!("Font not found: {}", font.display()).into());
        }
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let c = &summary.counts;
    log::info!(
        "Processed {} frames ({} paused, {} resets)",
        summary.frames_processed,
        summary.frames_paused,
        summary.resets
    );
    println!(
        "Total: {} (male {}, female {})",
        c.total_count, c.male_count, c.female_count
    );
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
