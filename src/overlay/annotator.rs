use crate::annotations::detection::{Detection, max_confidence};
use crate::overlay::geometry::GeometryProfile;
use crate::overlay::label_font::LabelFont;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const DEFAULT_WARNING_LABEL: &str = "SMOKING DETECTED";
/// High-visibility red used for corner markers and the warning label.
pub const NEON_RED: Rgb<u8> = Rgb([255, 49, 49]);

const BANNER_FILL: Rgb<u8> = Rgb([50, 50, 50]);
const BANNER_OPACITY: f32 = 0.5;
const BANNER_WIDTH: f64 = 300.0;
const BANNER_HEIGHT: f64 = 50.0;
const BANNER_MARGIN: f64 = 20.0;

/// What a single `annotate` call saw.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnnotationOutcome {
    pub had_detection: bool,
    /// Highest detection confidence in [0, 1], 0 without detections.
    pub max_confidence: f32,
}

impl AnnotationOutcome {
    pub fn from_detections(detections: &[Detection]) -> Self {
        AnnotationOutcome {
            had_detection: !detections.is_empty(),
            max_confidence: max_confidence(detections),
        }
    }
}

/// Draws detection markers and the warning banner onto frames.
#[derive(Clone, Debug)]
pub struct FrameAnnotator {
    font: LabelFont,
    label: String,
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        FrameAnnotator::new(LabelFont::default(), DEFAULT_WARNING_LABEL.to_string())
    }
}

impl FrameAnnotator {
    pub fn new(font: LabelFont, label: String) -> Self {
        FrameAnnotator { font, label }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Annotates `frame` in place.
    ///
    /// Every detection gets open corner brackets; boxes are clipped to the frame and boxes with
    /// nothing on the frame are skipped. The banner is drawn whenever `banner_visible` is set,
    /// whether or not this frame had detections.
    pub fn annotate(
        &self,
        frame: &mut RgbImage,
        detections: &[Detection],
        geometry: &GeometryProfile,
        banner_visible: bool,
    ) -> AnnotationOutcome {
        let (width, height) = frame.dimensions();
        for detection in detections {
            match detection.annotation.clip_to_frame(width, height) {
                Some(rect) => draw_corner_rect(frame, rect, geometry),
                None => log::debug!("skipping off-frame detection {}", detection),
            }
        }
        if banner_visible {
            self.draw_banner(frame, geometry);
        }
        AnnotationOutcome::from_detections(detections)
    }

    fn draw_banner(&self, frame: &mut RgbImage, geometry: &GeometryProfile) {
        let box_width = geometry.scaled(BANNER_WIDTH) as i64;
        let box_height = geometry.scaled(BANNER_HEIGHT) as i64;
        if box_width == 0 || box_height == 0 {
            return;
        }
        let margin = geometry.scaled(BANNER_MARGIN) as i64;
        let x1 = margin;
        let y1 = frame.height() as i64 - box_height - margin;
        blend_rect(
            frame,
            x1,
            y1,
            box_width,
            box_height,
            BANNER_FILL,
            BANNER_OPACITY,
        );

        let (text_width, text_height) = self.font.text_size(&self.label, geometry.font_scale);
        let text_x = x1 + (box_width - text_width as i64).div_euclid(2);
        let baseline = y1 + (box_height + text_height as i64).div_euclid(2);
        self.font.draw(
            frame,
            &self.label,
            (text_x as i32, (baseline - text_height as i64) as i32),
            geometry.font_scale,
            geometry.font_thickness,
            NEON_RED,
        );
    }
}

/// Draws the four L-shaped corners of `(x, y, width, height)` without the connecting edges.
fn draw_corner_rect(frame: &mut RgbImage, rect: (i32, i32, u32, u32), geometry: &GeometryProfile) {
    let (x, y, width, height) = rect;
    let length = geometry.corner_length.min(width).min(height).max(1);
    let thickness = geometry.corner_thickness.max(1);
    let half = (thickness / 2) as i32;
    let l = length as i32;
    let x1 = x + width as i32;
    let y1 = y + height as i32;

    // top left
    fill(frame, x, y - half, length, thickness);
    fill(frame, x - half, y, thickness, length);
    // top right
    fill(frame, x1 - l, y - half, length, thickness);
    fill(frame, x1 - half, y, thickness, length);
    // bottom left
    fill(frame, x, y1 - half, length, thickness);
    fill(frame, x - half, y1 - l, thickness, length);
    // bottom right
    fill(frame, x1 - l, y1 - half, length, thickness);
    fill(frame, x1 - half, y1 - l, thickness, length);
}

fn fill(frame: &mut RgbImage, x: i32, y: i32, width: u32, height: u32) {
    draw_filled_rect_mut(frame, Rect::at(x, y).of_size(width, height), NEON_RED);
}

/// Mixes `color` into the part of the rectangle that lies on the frame.
fn blend_rect(
    frame: &mut RgbImage,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    color: Rgb<u8>,
    opacity: f32,
) {
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + width).min(frame.width() as i64);
    let bottom = (y + height).min(frame.height() as i64);
    for py in top..bottom {
        for px in left..right {
            let pixel = frame.get_pixel_mut(px as u32, py as u32);
            for (channel, overlay) in pixel.0.iter_mut().zip(color.0) {
                let mixed = overlay as f32 * opacity + *channel as f32 * (1.0 - opacity);
                *channel = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
