use thiserror::Error;

/// Frame size (width + height) at which the overlay is drawn at its nominal size.
const REFERENCE_EXTENT: f64 = 1500.0;
const VIDEO_CORNER_LENGTH: f64 = 40.0;
const IMAGE_CORNER_LENGTH: f64 = 60.0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid frame geometry {width}x{height}")]
pub struct InvalidGeometry {
    pub width: u32,
    pub height: u32,
}

/// Stroke and font dimensions for one frame's annotations.
///
/// Everything is derived from `(width + height) / 1500` so that markers and the warning banner
/// keep the same apparent size at any resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryProfile {
    pub scale: f64,
    pub corner_length: u32,
    pub corner_thickness: u32,
    pub font_scale: f64,
    pub font_thickness: u32,
}

impl GeometryProfile {
    /// Scales a nominal pixel length, truncating toward zero.
    pub fn scaled(&self, nominal: f64) -> u32 {
        (nominal * self.scale) as u32
    }
}

/// Derives the overlay geometry for a `width` x `height` frame. Video frames get shorter corner
/// markers than still images.
pub fn calibrate(
    width: u32,
    height: u32,
    is_video: bool,
) -> Result<GeometryProfile, InvalidGeometry> {
    if width == 0 || height == 0 {
        return Err(InvalidGeometry { width, height });
    }
    let scale = (width as f64 + height as f64) / REFERENCE_EXTENT;
    let base_corner = if is_video {
        VIDEO_CORNER_LENGTH
    } else {
        IMAGE_CORNER_LENGTH
    };
    let stroke = (3.0 * scale).round() as u32;
    Ok(GeometryProfile {
        scale,
        corner_length: (base_corner * scale) as u32,
        corner_thickness: stroke,
        font_scale: 0.9 * scale,
        font_thickness: stroke.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hd_image_profile() {
        let profile = calibrate(1920, 1080, false).unwrap();
        assert_eq!(profile.scale, 2.0);
        assert_eq!(profile.corner_length, 120);
        assert_eq!(profile.corner_thickness, 6);
        assert!((profile.font_scale - 1.8).abs() < 1e-9);
        assert_eq!(profile.font_thickness, 6);
    }

    #[test]
    fn corner_length_truncates() {
        // scale = 1100 / 1500 = 0.7333..
        let profile = calibrate(640, 460, true).unwrap();
        assert_eq!(profile.corner_length, 29);
        assert_eq!(profile.corner_thickness, 2);
        assert_eq!(profile.font_thickness, 2);
    }

    #[test]
    fn tiny_frames_keep_a_visible_font_stroke() {
        let profile = calibrate(60, 40, false).unwrap();
        assert_eq!(profile.corner_thickness, 0);
        assert_eq!(profile.font_thickness, 1);
    }

    #[test]
    fn video_markers_never_exceed_image_markers() {
        let sizes = [
            (1, 1),
            (320, 240),
            (640, 480),
            (1280, 720),
            (1920, 1080),
            (3840, 2160),
            (7, 9000),
        ];
        for (w, h) in sizes {
            let video = calibrate(w, h, true).unwrap();
            let image = calibrate(w, h, false).unwrap();
            assert!(video.corner_length <= image.corner_length, "{}x{}", w, h);
            assert_eq!(video.corner_thickness, image.corner_thickness);
            assert_eq!(video.font_scale, image.font_scale);
        }
    }

    #[test]
    fn zero_dimensions_are_invalid() {
        assert_eq!(
            calibrate(0, 480, true),
            Err(InvalidGeometry {
                width: 0,
                height: 480
            })
        );
        assert!(calibrate(640, 0, false).is_err());
    }

    #[test]
    fn scaled_truncates() {
        // scale = 1125 / 1500 = 0.75
        let profile = calibrate(640, 485, false).unwrap();
        assert_eq!(profile.scaled(300.0), 225);
        assert_eq!(profile.scaled(50.0), 37);
        assert_eq!(profile.scaled(20.0), 15);
    }
}
