use image::{ImageFormat, Rgb, RgbImage};
use smoke_watch::{
    BoundingBox, Detection, Detector, DetectorError, FrameAnnotator, FrameProcessor,
    FrameSequence, FrameUpdate, PipelineError, ProcessorSettings, UploadKind, Verdict,
};
use std::collections::HashMap;
use std::io::Cursor;

/// Returns a fixed set of detections for selected (1-based) calls and nothing otherwise.
#[derive(Default)]
struct ScriptedDetector {
    calls: u64,
    script: HashMap<u64, Vec<Detection>>,
}

impl ScriptedDetector {
    fn on_call(mut self, call: u64, detections: Vec<Detection>) -> Self {
        self.script.insert(call, detections);
        self
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detect(
        &mut self,
        _frame: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        self.calls += 1;
        let Some(detections) = self.script.get(&self.calls) else {
            return Ok(Vec::new());
        };
        Ok(detections
            .iter()
            .filter(|detection| detection.confidence >= confidence_threshold)
            .cloned()
            .collect())
    }
}

fn smoking(confidence: f32) -> Detection {
    Detection::new(
        BoundingBox::new(300.0, 100.0, 500.0, 300.0, "smoking".to_string()).unwrap(),
        confidence,
    )
}

fn full_size_settings() -> ProcessorSettings {
    ProcessorSettings {
        display_width: 750,
        display_height: 750,
        ..ProcessorSettings::default()
    }
}

fn png_bytes(frame: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn still_image_with_confident_detection() {
    let detector = ScriptedDetector::default().on_call(1, vec![smoking(0.85)]);
    let mut processor =
        FrameProcessor::new(detector, FrameAnnotator::default(), full_size_settings());
    let upload = png_bytes(&RgbImage::new(750, 750));

    let mut updates = Vec::new();
    let mut sink = |update: &FrameUpdate<'_>| updates.push((update.status, update.banner_visible));
    let report = processor
        .process_upload(Cursor::new(upload), "demo.png", &mut sink)
        .unwrap();

    assert_eq!(updates.len(), 1);
    let (status, banner_visible) = updates[0];
    assert!(banner_visible);
    assert_eq!(status.total_frames, 1);
    assert!(status.detection_latched);
    assert!((status.max_confidence - 85.0).abs() < 1e-3);
    assert!((status.current_confidence - 85.0).abs() < 1e-3);
    assert!(status.is_high_confidence(false));

    assert_eq!(report.kind, UploadKind::Image);
    assert_eq!(report.verdict(), Verdict::Detected);
    let frame = report.final_frame.unwrap();
    assert_eq!(frame.dimensions(), (750, 750));
    // banner backdrop blended over black
    assert_eq!(*frame.get_pixel(21, 681), Rgb([25, 25, 25]));
    // corner bracket at the top-left of the box
    assert_eq!(*frame.get_pixel(300, 100), Rgb([255, 49, 49]));
}

#[test]
fn still_image_below_threshold_is_untouched() {
    let detector = ScriptedDetector::default().on_call(1, vec![smoking(0.2)]);
    let mut processor =
        FrameProcessor::new(detector, FrameAnnotator::default(), full_size_settings());
    let original = RgbImage::from_pixel(750, 750, Rgb([12, 34, 56]));
    let upload = png_bytes(&original);

    let mut sink = |_: &FrameUpdate<'_>| {};
    let report = processor
        .process_upload(Cursor::new(upload), "quiet.PNG", &mut sink)
        .unwrap();

    assert_eq!(report.verdict(), Verdict::Clear);
    assert_eq!(report.status.total_frames, 1);
    assert_eq!(report.status.max_confidence, 0.0);
    assert_eq!(report.final_frame.unwrap(), original);
}

#[test]
fn video_latches_and_blinks_from_first_detection() {
    let detector = ScriptedDetector::default().on_call(6, vec![smoking(0.5)]);
    let settings = ProcessorSettings::default();
    let mut processor = FrameProcessor::new(detector, FrameAnnotator::default(), settings);
    let mut source = FrameSequence::new(vec![RgbImage::new(640, 360); 10]);

    let mut updates = Vec::new();
    let mut sink = |update: &FrameUpdate<'_>| {
        updates.push((
            update.frame_number,
            update.status,
            update.banner_visible,
            update.progress,
        ))
    };
    let report = processor.process_video(&mut source, &mut sink);

    assert_eq!(updates.len(), 10);
    for (frame_number, status, banner_visible, progress) in &updates {
        let detected = *frame_number >= 6;
        assert_eq!(status.total_frames, *frame_number);
        assert_eq!(status.detection_latched, detected, "frame {}", frame_number);
        assert_eq!(*banner_visible, detected, "frame {}", frame_number);
        let expected_max = if detected { 50.0 } else { 0.0 };
        assert!((status.max_confidence - expected_max).abs() < 1e-3);
        let expected_current = if *frame_number == 6 { 50.0 } else { 0.0 };
        assert!((status.current_confidence - expected_current).abs() < 1e-3);
        let expected_progress = *frame_number as f32 / 10.0;
        assert!((progress.unwrap() - expected_progress).abs() < 1e-6);
    }

    assert_eq!(report.kind, UploadKind::Video);
    assert_eq!(report.final_progress, Some(1.0));
    assert_eq!(report.status.total_frames, 10);
    assert!(report.status.detection_latched);
    assert_eq!(report.verdict().message(), "Smoking detected!");
    assert_eq!(report.final_frame.unwrap().dimensions(), (720, 405));
}

#[test]
fn banner_hides_after_five_latched_frames() {
    let detector = ScriptedDetector::default().on_call(1, vec![smoking(0.9)]);
    let settings = ProcessorSettings::default();
    let mut processor = FrameProcessor::new(detector, FrameAnnotator::default(), settings);
    let mut source = FrameSequence::new(vec![RgbImage::new(320, 240); 16]);

    let mut banners = Vec::new();
    let mut sink = |update: &FrameUpdate<'_>| banners.push(update.banner_visible);
    processor.process_video(&mut source, &mut sink);

    let mut expected = vec![true; 5];
    expected.extend([false; 5]);
    expected.extend([true; 5]);
    expected.push(false);
    assert_eq!(banners, expected);
}

#[test]
fn every_upload_is_its_own_session() {
    let detector = ScriptedDetector::default().on_call(1, vec![smoking(0.9)]);
    let mut processor =
        FrameProcessor::new(detector, FrameAnnotator::default(), full_size_settings());
    let mut sink = |_: &FrameUpdate<'_>| {};

    let first = processor.process_image(RgbImage::new(750, 750), &mut sink);
    let second = processor.process_image(RgbImage::new(750, 750), &mut sink);

    assert!(first.status.detection_latched);
    assert!(!second.status.detection_latched);
    assert_eq!(second.status.total_frames, 1);
    assert_eq!(second.status.max_confidence, 0.0);
}

#[test]
fn unsupported_uploads_are_rejected() {
    let mut processor = FrameProcessor::new(
        ScriptedDetector::default(),
        FrameAnnotator::default(),
        ProcessorSettings::default(),
    );
    let mut sink = |_: &FrameUpdate<'_>| {};
    let result = processor.process_upload(Cursor::new(Vec::new()), "clip.avi", &mut sink);
    assert!(matches!(result, Err(PipelineError::UnsupportedUpload(_))));
}
