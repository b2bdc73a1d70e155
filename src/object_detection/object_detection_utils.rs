use crate::annotations::detection::Detection;
use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads a file with the class names into a vector so that the number ids
/// which come directly from the ORT inference session can be given meaning.
///
/// Blank lines are skipped and surrounding whitespace is trimmed.
pub fn read_classes_txt_file(filepath: &Path) -> io::Result<Vec<String>> {
    let lines: Vec<String> = BufReader::new(File::open(filepath)?)
        .lines()
        .collect::<io::Result<_>>()?;
    Ok(lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Non maxmimum suppression is a way of removing duplicate detections.
///
/// Detections are visited from most to least confident; any later detection of the same
/// category overlapping a kept one by more than `iou_threshold` is dropped.
pub fn non_maximum_suppression(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let detections: Vec<Detection> = detections
        .into_iter()
        .sorted_by(|a, b| b.confidence.total_cmp(&a.confidence))
        .collect();
    let mut detections_to_remove: Vec<bool> = vec![false; detections.len()];
    for (current_index, current_det) in detections.iter().enumerate() {
        if detections_to_remove[current_index] {
            continue;
        }
        for (other_index, other_det) in detections[current_index + 1..].iter().enumerate() {
            if detections_to_remove[current_index + other_index + 1] {
                continue;
            }
            if current_det.annotation.category() != other_det.annotation.category() {
                continue;
            }
            let iou = current_det
                .annotation
                .intersection_over_union(&other_det.annotation);
            if iou > iou_threshold {
                detections_to_remove[current_index + other_index + 1] = true;
            }
        }
    }
    detections
        .into_iter()
        .zip(detections_to_remove)
        .filter_map(|(detection, removed)| (!removed).then_some(detection))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::bounding_box::BoundingBox;
    use std::io::Write;

    fn det(
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        category: &str,
        confidence: f32,
    ) -> Detection {
        Detection::new(
            BoundingBox::new(left, top, right, bottom, category.to_string()).unwrap(),
            confidence,
        )
    }

    #[test]
    fn nms_no_overlap() {
        let dets = vec![
            det(0.0, 0.0, 1.0, 1.0, "smoking", 0.6),
            det(2.0, 2.0, 3.0, 3.0, "smoking", 0.6),
        ];
        let nms_result = non_maximum_suppression(dets.clone(), 0.5);
        assert_eq!(nms_result, dets);
    }

    #[test]
    fn nms_standard_usage() {
        let dets = vec![
            det(0.0, 0.0, 4.0, 4.0, "smoking", 0.6),
            det(0.0, 0.0, 5.0, 5.0, "smoking", 0.55),
            det(6.0, 6.0, 10.0, 10.0, "smoking", 0.75),
        ];
        let nms_result = non_maximum_suppression(dets, 0.5);
        let true_dets = vec![
            det(6.0, 6.0, 10.0, 10.0, "smoking", 0.75),
            det(0.0, 0.0, 4.0, 4.0, "smoking", 0.6),
        ];
        assert_eq!(nms_result, true_dets);
    }

    #[test]
    fn nms_overlap_but_different_classes() {
        let dets = vec![
            det(0.0, 0.0, 4.5, 4.5, "smoking", 0.6),
            det(0.0, 0.0, 5.0, 5.0, "cigarette", 0.55),
            det(0.5, 0.5, 4.0, 4.0, "smoking", 0.8),
        ];
        let nms_result = non_maximum_suppression(dets, 0.5);
        let true_dets = vec![
            det(0.5, 0.5, 4.0, 4.0, "smoking", 0.8),
            det(0.0, 0.0, 5.0, 5.0, "cigarette", 0.55),
        ];
        assert_eq!(nms_result, true_dets);
    }

    #[test]
    fn classes_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "smoking\n\n  cigarette  \n").unwrap();
        let classes = read_classes_txt_file(file.path()).unwrap();
        assert_eq!(
            classes,
            vec!["smoking".to_string(), "cigarette".to_string()]
        );
    }
}
