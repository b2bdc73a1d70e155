pub mod object_detection_model;
pub mod object_detection_utils;

#[cfg(feature = "onnx")]
pub mod ort_inference_session;
#[cfg(feature = "onnx")]
pub mod yolov11_bounding_box;

pub use object_detection_model::{Detector, DetectorError};
