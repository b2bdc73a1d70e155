use image::{self, ImageResult, RgbImage};
use std::path::Path;

/// Decodes an uploaded still image into an rgb8 frame.
///
/// Returns `None` when the bytes are not a decodable image or decode to an empty frame; the
/// caller treats both as an unreadable upload.
pub fn decode_image_as_rgb8(bytes: &[u8]) -> Option<RgbImage> {
    match image::load_from_memory(bytes) {
        Ok(img) => {
            let rgb = img.into_rgb8();
            if rgb.width() == 0 || rgb.height() == 0 {
                log::warn!("decoded image is empty ({}x{})", rgb.width(), rgb.height());
                None
            } else {
                Some(rgb)
            }
        }
        Err(err) => {
            log::warn!("failed to decode uploaded image: {}", err);
            None
        }
    }
}

pub fn save_rgb8(frame: &RgbImage, filepath: &Path) -> ImageResult<()> {
    frame.save(filepath)
}
