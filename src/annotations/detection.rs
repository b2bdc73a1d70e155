use crate::annotations::bounding_box::BoundingBox;
use std::fmt;

/// A detection is what is produced as output from an object detection model.
///
/// A detection is a bounding box combined with a confidence score: a probability value in [0, 1]
/// that encodes the model's belief that the detection is true.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub annotation: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    /// Clamps the confidence into [0, 1]; NaN becomes 0.
    pub fn new(annotation: BoundingBox, confidence: f32) -> Self {
        Detection {
            annotation,
            confidence: clamp_unit(confidence),
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Detection {{ {}, confidence: {:.3} }}",
            self.annotation, self.confidence
        )
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Highest confidence among `detections`, 0 when there are none.
pub fn max_confidence(detections: &[Detection]) -> f32 {
    detections
        .iter()
        .map(|detection| clamp_unit(detection.confidence))
        .fold(0.0_f32, f32::max)
}
