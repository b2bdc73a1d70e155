use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Grey used by YOLO letterboxing for the padded area.
const LETTERBOX_FILL: Rgb<u8> = Rgb([114, 114, 114]);

/// How a frame was mapped into a letterboxed model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    /// Factor applied to the original frame.
    pub ratio: f32,
    /// Horizontal offset of the resized frame inside the padded image.
    pub pad_x: u32,
    /// Vertical offset of the resized frame inside the padded image.
    pub pad_y: u32,
}

impl Letterbox {
    /// Maps a point in model-input coordinates back to original frame coordinates.
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.ratio,
            (y - self.pad_y as f32) / self.ratio,
        )
    }
}

/// Resizes a frame to fit `target_width` x `target_height` without distortion, centering it on a
/// grey canvas.
pub fn letterbox_img_rgb8(
    original_image: &RgbImage,
    target_width: u32,
    target_height: u32,
) -> (RgbImage, Letterbox) {
    let ratio = (target_width as f32 / original_image.width() as f32)
        .min(target_height as f32 / original_image.height() as f32);
    let resized_width =
        ((original_image.width() as f32 * ratio).round() as u32).clamp(1, target_width);
    let resized_height =
        ((original_image.height() as f32 * ratio).round() as u32).clamp(1, target_height);
    let resized = imageops::resize(
        original_image,
        resized_width,
        resized_height,
        FilterType::Triangle,
    );

    let pad_x = (target_width - resized_width) / 2;
    let pad_y = (target_height - resized_height) / 2;
    let mut canvas = RgbImage::from_pixel(target_width, target_height, LETTERBOX_FILL);
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);
    let letterbox = Letterbox {
        ratio,
        pad_x,
        pad_y,
    };
    (canvas, letterbox)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_centers_wide_frame() {
        let original = RgbImage::from_pixel(1280, 640, Rgb([200, 0, 0]));
        let (boxed, letterbox) = letterbox_img_rgb8(&original, 640, 640);
        assert_eq!(boxed.dimensions(), (640, 640));
        assert_eq!(letterbox.ratio, 0.5);
        assert_eq!((letterbox.pad_x, letterbox.pad_y), (0, 160));
        assert_eq!(boxed.get_pixel(10, 10), &LETTERBOX_FILL);
        assert_eq!(boxed.get_pixel(320, 320), &Rgb([200, 0, 0]));
    }

    #[test]
    fn letterbox_maps_back_to_frame() {
        let letterbox = Letterbox {
            ratio: 0.5,
            pad_x: 0,
            pad_y: 160,
        };
        assert_eq!(letterbox.to_frame(100.0, 260.0), (200.0, 200.0));
    }
}
