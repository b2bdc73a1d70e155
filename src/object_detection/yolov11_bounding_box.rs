use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::image_utils::image_conversion::convert_rgb_image_to_owned_array;
use crate::image_utils::padding::{Letterbox, letterbox_img_rgb8};
use crate::object_detection::object_detection_model::{Detector, DetectorError};
use crate::object_detection::object_detection_utils::non_maximum_suppression;
use crate::object_detection::ort_inference_session::OrtInferenceSession;
use image::RgbImage;
use ndarray::{ArrayView1, Axis, Ix2};
use ort::value::TensorRef;
use std::path::Path;

/// A YOLOv11 detection model exported to ONNX.
///
/// The model takes a letterboxed (1, 3, input_height, input_width) image and outputs a
/// (1, 4 + classes, anchors) tensor where each anchor is a center/size box followed by one score
/// per class.
pub struct Yolov11BoundingBox {
    ort_session: OrtInferenceSession,
    class_names: Vec<String>,
    input_width: u32,
    input_height: u32,
    model_name: String,
    nms_iou_threshold: f32,
    target_class: Option<String>,
}

impl Yolov11BoundingBox {
    pub fn new(
        model_path: &Path,
        class_names: Vec<String>,
        input_width: u32,
        input_height: u32,
        model_name: String,
    ) -> ort::Result<Self> {
        let ort_session = OrtInferenceSession::new(model_path)?;
        Ok(Yolov11BoundingBox {
            ort_session,
            class_names,
            input_width,
            input_height,
            model_name,
            nms_iou_threshold: 0.45,
            target_class: None,
        })
    }

    pub fn with_nms_iou_threshold(mut self, nms_iou_threshold: f32) -> Self {
        self.nms_iou_threshold = nms_iou_threshold;
        self
    }

    /// Only report detections of this category.
    pub fn with_target_class(mut self, target_class: Option<String>) -> Self {
        self.target_class = target_class;
        self
    }
}

impl Detector for Yolov11BoundingBox {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn detect(
        &mut self,
        frame: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectorError::EmptyFrame {
                width: frame.width(),
                height: frame.height(),
            });
        }
        let (input_image, letterbox) =
            letterbox_img_rgb8(frame, self.input_width, self.input_height);
        let input_array = convert_rgb_image_to_owned_array(&input_image);
        let outputs = self
            .ort_session
            .session
            .run(ort::inputs!["images" => TensorRef::from_array_view(input_array.view())?])?;
        let output = outputs["output0"].try_extract_array::<f32>()?;
        let output = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|err| DetectorError::MalformedOutput(err.to_string()))?;
        if output.shape()[0] <= 4 {
            return Err(DetectorError::MalformedOutput(format!(
                "expected at least 5 rows per anchor, got {}",
                output.shape()[0]
            )));
        }

        let detections: Vec<Detection> = output
            .axis_iter(Axis(1))
            .filter_map(|anchor| {
                decode_anchor(
                    anchor,
                    &self.class_names,
                    self.target_class.as_deref(),
                    &letterbox,
                    confidence_threshold,
                )
            })
            .collect();
        Ok(non_maximum_suppression(detections, self.nms_iou_threshold))
    }
}

/// Turns one output column into a detection in frame coordinates.
fn decode_anchor(
    anchor: ArrayView1<f32>,
    class_names: &[String],
    target_class: Option<&str>,
    letterbox: &Letterbox,
    confidence: f32,
) -> Option<Detection> {
    let (class_id, prob) = anchor
        .iter()
        .skip(4) // skips bounding box coords.
        .copied()
        .enumerate()
        .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })?;
    if prob < confidence {
        return None;
    }
    let label = match class_names.get(class_id) {
        Some(v) => v.clone(),
        None => class_id.to_string(),
    };
    if target_class.is_some_and(|target| target != label) {
        return None;
    }
    let (x, y, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
    let (left, top) = letterbox.to_frame(x - (w / 2.0), y - (h / 2.0));
    let (right, bottom) = letterbox.to_frame(x + (w / 2.0), y + (h / 2.0));
    let bbox = BoundingBox::new(left, top, right, bottom, label).ok()?;
    Some(Detection::new(bbox, prob))
}
