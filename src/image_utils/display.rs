use image::RgbImage;
use image::imageops::{self, FilterType};
use thiserror::Error;

/// Default display region, matching the width of the display column.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 720;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 450;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisplayError {
    #[error("display target must be positive, got {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },
    #[error("cannot fit an empty frame ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
}

/// Resizes a frame to fit inside `target_width` x `target_height`, preserving aspect ratio.
///
/// Frames larger than the target are reduced with area averaging, smaller ones are enlarged with
/// bilinear interpolation. The input frame is left untouched.
pub fn fit(
    frame: &RgbImage,
    target_width: u32,
    target_height: u32,
) -> Result<RgbImage, DisplayError> {
    if target_width == 0 || target_height == 0 {
        return Err(DisplayError::InvalidTarget {
            width: target_width,
            height: target_height,
        });
    }
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(DisplayError::EmptyFrame { width, height });
    }

    let scale = (target_width as f64 / width as f64).min(target_height as f64 / height as f64);
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);

    if (new_width, new_height) == (width, height) {
        return Ok(frame.clone());
    }
    if scale < 1.0 {
        Ok(imageops::thumbnail(frame, new_width, new_height))
    } else {
        Ok(imageops::resize(frame, new_width, new_height, FilterType::Triangle))
    }
}
