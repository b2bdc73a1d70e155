use crate::annotations::detection::Detection;
use image::RgbImage;
use thiserror::Error;

/// Failures a detector backend may report for a single frame.
///
/// The frame pipeline never propagates these: a failed frame is logged and treated as a frame
/// without detections.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector received an empty frame ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("detector model returned malformed output: {0}")]
    MalformedOutput(String),
    #[cfg(feature = "onnx")]
    #[error("onnx runtime failure: {0}")]
    Runtime(#[from] ort::Error),
    #[error("detector backend failure: {0}")]
    Backend(String),
}

/// Defines a trait that all object detection models must follow.
///
/// The frame pipeline only ever talks to a detector through this trait, so any backend (ONNX,
/// a remote service, a scripted fake in tests) can be injected.
///
/// Implementations own threshold enforcement: every returned detection must have a confidence
/// at or above `confidence_threshold`. Returning no detections is a normal outcome.
pub trait Detector {
    /// Short backend identifier used in logs.
    fn name(&self) -> &str;

    /// Run detection on a frame.
    fn detect(
        &mut self,
        frame: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(
        &mut self,
        frame: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        (**self).detect(frame, confidence_threshold)
    }
}
