use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use smoke_watch::config::AppConfig;
use smoke_watch::image_utils::image_io::save_rgb8;
use smoke_watch::overlay::label_font::LabelFont;
use smoke_watch::pipeline::collect_uploads;
use smoke_watch::{
    Detector, FrameAnnotator, FrameProcessor, FrameUpdate, ProcessingReport, SessionStatus,
};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Detects smoking in images and videos and writes annotated frames.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Image, video or directory of uploads to process.
    #[arg(short, long, default_value = "demo.jpg")]
    input: PathBuf,

    /// TOML configuration file. Falls back to $SMOKE_WATCH_CONFIG when not given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum detector confidence in [0, 1]; overrides the configuration.
    #[arg(long)]
    confidence: Option<f32>,

    /// Directory that receives the annotated display frames as PNG files.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print one JSON status line per processed frame.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FrameLine<'a> {
    upload: &'a str,
    frame: u64,
    banner_visible: bool,
    progress: Option<f32>,
    #[serde(flatten)]
    status: SessionStatus,
}

#[derive(Serialize)]
struct UploadSummary<'a> {
    upload: &'a str,
    kind: smoke_watch::UploadKind,
    verdict: &'static str,
    #[serde(flatten)]
    status: SessionStatus,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(confidence) = args.confidence {
        config.confidence_threshold = confidence;
        config.validate()?;
    }

    let font = match &config.overlay.font_path {
        Some(path) => LabelFont::from_file(path).unwrap_or_else(|err| {
            log::warn!("using built-in label font: {}", err);
            LabelFont::default()
        }),
        None => LabelFont::default(),
    };
    let annotator = FrameAnnotator::new(font, config.overlay.warning_label.clone());
    let detector = build_detector(&config)?;
    log::info!("detector: {}", detector.name());
    let settings = config.processor_settings();
    let mut processor = FrameProcessor::new(detector, annotator, settings);

    if !args.input.exists() {
        bail!("input {} does not exist", args.input.display());
    }
    let uploads = collect_uploads(&args.input);
    if uploads.is_empty() {
        bail!("no supported uploads found under {}", args.input.display());
    }
    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
    }

    let failures = process_all(&mut processor, &uploads, &args)?;
    if failures > 0 {
        bail!("{} of {} uploads failed", failures, uploads.len());
    }
    Ok(())
}

/// Processes `uploads` in order and prints a summary for each. An upload that fails is logged
/// and the batch moves on to the next one; returns how many failed.
fn process_all<D: Detector>(
    processor: &mut FrameProcessor<D>,
    uploads: &[PathBuf],
    args: &Args,
) -> Result<usize> {
    let mut failures = 0;
    for upload in uploads {
        // every upload is its own session
        match process_file(processor, upload, args) {
            Ok(report) => print_summary(upload, &report, args.json)?,
            Err(err) => {
                log::error!("{:#}", err);
                failures += 1;
            }
        }
    }
    Ok(failures)
}

fn print_summary(upload: &Path, report: &ProcessingReport, json: bool) -> Result<()> {
    let name = upload.display().to_string();
    if json {
        let summary = UploadSummary {
            upload: &name,
            kind: report.kind,
            verdict: report.verdict().message(),
            status: report.status,
        };
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "{}: {} ({} frames, highest confidence {:.1}%)",
            name,
            report.verdict().message(),
            report.status.total_frames,
            report.status.display_confidence(false)
        );
    }
    Ok(())
}

fn process_file<D: Detector>(
    processor: &mut FrameProcessor<D>,
    upload: &Path,
    args: &Args,
) -> Result<ProcessingReport> {
    let name = upload.display().to_string();
    let file_name = upload
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", name))?;
    let stem = upload
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("upload");
    let file = File::open(upload).with_context(|| format!("failed to open {}", name))?;

    let mut sink = |update: &FrameUpdate<'_>| {
        if let Some(output_dir) = &args.output_dir {
            let path = output_dir.join(format!("{}_{:05}.png", stem, update.frame_number));
            if let Err(err) = save_rgb8(update.display, &path) {
                log::warn!("failed to write {}: {}", path.display(), err);
            }
        }
        if args.json {
            let line = FrameLine {
                upload: &name,
                frame: update.frame_number,
                banner_visible: update.banner_visible,
                progress: update.progress,
                status: update.status,
            };
            match serde_json::to_string(&line) {
                Ok(line) => println!("{}", line),
                Err(err) => log::warn!("failed to serialise frame status: {}", err),
            }
        }
    };
    let report = processor
        .process_upload(BufReader::new(file), file_name, &mut sink)
        .with_context(|| format!("failed to process {}", name))?;
    Ok(report)
}

#[cfg(feature = "onnx")]
fn build_detector(config: &AppConfig) -> Result<Box<dyn Detector>> {
    use smoke_watch::object_detection::object_detection_utils::read_classes_txt_file;
    use smoke_watch::object_detection::yolov11_bounding_box::Yolov11BoundingBox;

    let Some(model_path) = &config.model.path else {
        bail!("no model configured; set model.path or SMOKE_WATCH_MODEL");
    };
    let class_names = match &config.model.classes_path {
        Some(path) => read_classes_txt_file(path)
            .with_context(|| format!("failed to read classes from {}", path.display()))?,
        None => Vec::new(),
    };
    let model_name = model_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "yolov11".to_string());
    let detector = Yolov11BoundingBox::new(
        model_path,
        class_names,
        config.model.input_width,
        config.model.input_height,
        model_name,
    )
    .with_context(|| format!("failed to load model {}", model_path.display()))?
    .with_nms_iou_threshold(config.model.nms_iou_threshold)
    .with_target_class(config.model.target_class.clone());
    Ok(Box::new(detector))
}

#[cfg(not(feature = "onnx"))]
fn build_detector(config: &AppConfig) -> Result<Box<dyn Detector>> {
    bail!(
        "no detector backend available for model {:?}; rebuild with --features onnx",
        config.model.path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use smoke_watch::{Detection, DetectorError, ProcessorSettings};

    struct NoDetections;

    impl Detector for NoDetections {
        fn name(&self) -> &str {
            "none"
        }

        fn detect(&mut self, _frame: &RgbImage, _: f32) -> Result<Vec<Detection>, DetectorError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_upload_does_not_stop_the_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a_broken.mp4"), b"not a video").unwrap();
        fs::write(input.path().join("b_removed.jpg"), b"x").unwrap();
        RgbImage::new(32, 24)
            .save(input.path().join("c_photo.png"))
            .unwrap();

        let args = Args {
            input: input.path().to_path_buf(),
            config: None,
            confidence: None,
            output_dir: Some(output.path().to_path_buf()),
            json: false,
        };
        let uploads = collect_uploads(&args.input);
        assert_eq!(uploads.len(), 3);
        fs::remove_file(input.path().join("b_removed.jpg")).unwrap();
        let settings = ProcessorSettings::default();
        let mut processor = FrameProcessor::new(NoDetections, FrameAnnotator::default(), settings);

        let failures = process_all(&mut processor, &uploads, &args).unwrap();
        assert_eq!(failures, 2);
        assert!(output.path().join("c_photo_00001.png").is_file());
    }
}
