use crate::annotations::detection::{Detection, clamp_unit};
use serde::{Deserialize, Serialize};

/// Confidence (percent) above which a reading is reported as high.
pub const HIGH_CONFIDENCE_PERCENT: f32 = 70.0;

/// Running statistics for one upload (a single image or one video).
///
/// Confidences are stored as percentages in [0, 100]. `current_confidence` only reflects the most
/// recent frame; `max_confidence` is a running maximum and `detection_latched` never resets once
/// set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    total_frames: u64,
    max_confidence: f32,
    current_confidence: f32,
    detection_latched: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one decoded frame into the session.
    ///
    /// `max_confidence_this_frame` is the detector confidence in [0, 1]; values outside the range
    /// are clamped.
    pub fn update(&mut self, detections_this_frame: &[Detection], max_confidence_this_frame: f32) {
        let current = clamp_unit(max_confidence_this_frame) * 100.0;
        self.total_frames += 1;
        self.current_confidence = current;
        self.max_confidence = self.max_confidence.max(current);
        self.detection_latched |= !detections_this_frame.is_empty();
    }

    /// Latch value as it will be once a frame with `detections_this_frame` has been folded in.
    pub fn latched_with(&self, detections_this_frame: &[Detection]) -> bool {
        self.detection_latched || !detections_this_frame.is_empty()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn max_confidence(&self) -> f32 {
        self.max_confidence
    }

    pub fn current_confidence(&self) -> f32 {
        self.current_confidence
    }

    pub fn detection_latched(&self) -> bool {
        self.detection_latched
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            total_frames: self.total_frames,
            max_confidence: self.max_confidence,
            current_confidence: self.current_confidence,
            detection_latched: self.detection_latched,
        }
    }
}

/// Snapshot of a session handed to the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub total_frames: u64,
    pub max_confidence: f32,
    pub current_confidence: f32,
    pub detection_latched: bool,
}

impl SessionStatus {
    /// Confidence to feature: the live reading while a video is still running, the highest
    /// reading once processing is over.
    pub fn display_confidence(&self, processing: bool) -> f32 {
        if processing {
            self.current_confidence
        } else {
            self.max_confidence
        }
    }

    pub fn is_high_confidence(&self, processing: bool) -> bool {
        self.display_confidence(processing) > HIGH_CONFIDENCE_PERCENT
    }
}
