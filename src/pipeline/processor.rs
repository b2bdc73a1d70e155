//! Frame-at-a-time processing of a single upload.
//!
//! For every frame the detector runs first, then the latch for this frame decides whether the
//! banner is shown, the frame is annotated, the session is updated, the blink cycle advances and
//! the display-sized frame is handed to the sink. Frame N is finished before frame N + 1 is read.

use crate::annotations::detection::Detection;
use crate::image_utils::display::{DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, fit};
use crate::image_utils::image_io::decode_image_as_rgb8;
use crate::object_detection::Detector;
use crate::overlay::annotator::{AnnotationOutcome, FrameAnnotator};
use crate::overlay::blink::{BlinkController, DEFAULT_BLINK_CADENCE};
use crate::overlay::geometry::calibrate;
use crate::pipeline::PipelineError;
use crate::pipeline::upload::UploadKind;
use crate::session::{SessionState, SessionStatus};
use crate::video::{FrameSource, open_video_file};
use image::RgbImage;
use serde::Serialize;
use std::io::{self, Read};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessorSettings {
    pub confidence_threshold: f32,
    pub display_width: u32,
    pub display_height: u32,
    pub blink_cadence: u32,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        ProcessorSettings {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            blink_cadence: DEFAULT_BLINK_CADENCE,
        }
    }
}

/// Everything the presentation layer gets for one processed frame.
#[derive(Debug)]
pub struct FrameUpdate<'a> {
    /// 1-based index of the frame within the upload.
    pub frame_number: u64,
    pub display: &'a RgbImage,
    pub status: SessionStatus,
    pub banner_visible: bool,
    /// `frame_number / total_frames` when the total is known.
    pub progress: Option<f32>,
}

/// Receives processed frames as they are produced.
pub trait FrameSink {
    fn on_frame(&mut self, update: &FrameUpdate<'_>);
}

impl<F: FnMut(&FrameUpdate<'_>)> FrameSink for F {
    fn on_frame(&mut self, update: &FrameUpdate<'_>) {
        self(update)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Detected,
    Clear,
}

impl Verdict {
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Detected => "Smoking detected!",
            Verdict::Clear => "No smoking detected",
        }
    }
}

/// Outcome of processing one upload.
#[derive(Clone, Debug)]
pub struct ProcessingReport {
    pub kind: UploadKind,
    pub status: SessionStatus,
    /// Last display frame produced, `None` when nothing could be decoded.
    pub final_frame: Option<RgbImage>,
    /// 1.0 once a video loop has ended, `None` for still images.
    pub final_progress: Option<f32>,
}

impl ProcessingReport {
    fn empty(kind: UploadKind) -> Self {
        ProcessingReport {
            kind,
            status: SessionStatus::default(),
            final_frame: None,
            final_progress: None,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.status.detection_latched {
            Verdict::Detected
        } else {
            Verdict::Clear
        }
    }
}

/// Runs the detector, annotator and session bookkeeping over uploads.
pub struct FrameProcessor<D: Detector> {
    detector: D,
    annotator: FrameAnnotator,
    settings: ProcessorSettings,
}

impl<D: Detector> FrameProcessor<D> {
    pub fn new(detector: D, annotator: FrameAnnotator, settings: ProcessorSettings) -> Self {
        FrameProcessor {
            detector,
            annotator,
            settings,
        }
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Processes an upload given as a byte stream and its original filename.
    ///
    /// Only failures to acquire resources (temporary file, video handle) are returned as errors.
    /// An undecodable image yields an empty report.
    pub fn process_upload<R: Read>(
        &mut self,
        mut reader: R,
        filename: &str,
        sink: &mut dyn FrameSink,
    ) -> Result<ProcessingReport, PipelineError> {
        let kind = UploadKind::from_filename(filename)
            .ok_or_else(|| PipelineError::UnsupportedUpload(filename.to_string()))?;
        log::info!("processing {:?} upload {}", kind, filename);
        match kind {
            UploadKind::Image => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                match decode_image_as_rgb8(&bytes) {
                    Some(frame) => Ok(self.process_image(frame, sink)),
                    None => {
                        log::warn!("{} is not a readable image, skipping", filename);
                        Ok(ProcessingReport::empty(UploadKind::Image))
                    }
                }
            }
            UploadKind::Video => {
                let suffix = std::path::Path::new(filename)
                    .extension()
                    .and_then(|extension| extension.to_str())
                    .map(|extension| format!(".{}", extension))
                    .unwrap_or_default();
                // removed when dropped, on every exit path
                let mut temp_file = tempfile::Builder::new()
                    .prefix("smoke-watch-")
                    .suffix(&suffix)
                    .tempfile()?;
                io::copy(&mut reader, &mut temp_file)?;
                let mut source = open_video_file(temp_file.path())?;
                Ok(self.process_video(&mut source, sink))
            }
        }
    }

    /// Processes a single still image. The banner is shown whenever the image has a detection.
    pub fn process_image(
        &mut self,
        mut frame: RgbImage,
        sink: &mut dyn FrameSink,
    ) -> ProcessingReport {
        let mut session = SessionState::new();
        let detections = self.detect(&frame);
        let banner_visible = !detections.is_empty();
        let outcome = self.render(&mut frame, &detections, false, banner_visible);
        session.update(&detections, outcome.max_confidence);

        let display = self.display(&frame);
        if let Some(display) = &display {
            sink.on_frame(&FrameUpdate {
                frame_number: 1,
                display,
                status: session.status(),
                banner_visible,
                progress: None,
            });
        }
        log::info!(
            "image processed: detected={} max_confidence={:.1}%",
            session.detection_latched(),
            session.max_confidence()
        );
        ProcessingReport {
            kind: UploadKind::Image,
            status: session.status(),
            final_frame: display,
            final_progress: None,
        }
    }

    /// Processes frames from `source` until it reports end of stream.
    pub fn process_video<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        sink: &mut dyn FrameSink,
    ) -> ProcessingReport {
        let total_frames = source.frame_count_hint().filter(|&total| total > 0);
        let mut session = SessionState::new();
        let mut blink = BlinkController::new(self.settings.blink_cadence);
        let mut final_frame = None;

        while let Some(mut frame) = source.next_frame() {
            let detections = self.detect(&frame);
            let banner_visible = blink.banner_visible(session.latched_with(&detections));
            let outcome = self.render(&mut frame, &detections, true, banner_visible);
            session.update(&detections, outcome.max_confidence);
            blink.advance(session.detection_latched());

            let frame_number = session.total_frames();
            let progress = total_frames.map(|total| (frame_number as f32 / total as f32).min(1.0));
            log::debug!(
                "frame {}: detections={} banner={} blink={:?}",
                frame_number,
                detections.len(),
                banner_visible,
                blink.phase()
            );
            if let Some(display) = self.display(&frame) {
                sink.on_frame(&FrameUpdate {
                    frame_number,
                    display: &display,
                    status: session.status(),
                    banner_visible,
                    progress,
                });
                final_frame = Some(display);
            }
        }

        log::info!(
            "video processed: frames={} detected={} max_confidence={:.1}%",
            session.total_frames(),
            session.detection_latched(),
            session.max_confidence()
        );
        ProcessingReport {
            kind: UploadKind::Video,
            status: session.status(),
            final_frame,
            final_progress: Some(1.0),
        }
    }

    fn detect(&mut self, frame: &RgbImage) -> Vec<Detection> {
        match self
            .detector
            .detect(frame, self.settings.confidence_threshold)
        {
            Ok(detections) => detections,
            Err(err) => {
                log::warn!(
                    "{} failed on frame, treating as empty: {}",
                    self.detector.name(),
                    err
                );
                Vec::new()
            }
        }
    }

    fn render(
        &self,
        frame: &mut RgbImage,
        detections: &[Detection],
        is_video: bool,
        banner_visible: bool,
    ) -> AnnotationOutcome {
        match calibrate(frame.width(), frame.height(), is_video) {
            Ok(geometry) => self
                .annotator
                .annotate(frame, detections, &geometry, banner_visible),
            Err(err) => {
                log::warn!("skipping annotation: {}", err);
                AnnotationOutcome::from_detections(detections)
            }
        }
    }

    fn display(&self, frame: &RgbImage) -> Option<RgbImage> {
        let settings = &self.settings;
        match fit(frame, settings.display_width, settings.display_height) {
            Ok(display) => Some(display),
            Err(err) => {
                log::warn!("cannot prepare frame for display: {}", err);
                None
            }
        }
    }
}
