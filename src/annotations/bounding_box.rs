use std::fmt;

/// A struct representing a bounding box.
///
/// A bounding box is the smallest axis-aligned rectangle that contains a detected object,
/// together with the category the detector assigned to it. Detectors emit boxes in frame pixel
/// coordinates, which may extend past the frame edges; callers that draw them are expected to
/// clip.
///
/// This project uses the standard convention of the left side of the image being x=0 and the top
/// of the image being y=0.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    category: String,
}

impl BoundingBox {
    /// Checks if a box has valid parameters before constructing.
    pub fn new(
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        category: String,
    ) -> Result<Self, String> {
        if !(left.is_finite() && top.is_finite() && right.is_finite() && bottom.is_finite()) {
            Err(format!(
                "Failed to create BoundingBox, coordinates must be finite ({}, {}, {}, {}).",
                left, top, right, bottom
            ))
        } else if left > right {
            Err(format!(
                "Failed to create BoundingBox, value for left > value for right ({} > {}).",
                left, right
            ))
        } else if top > bottom {
            Err(format!(
                "Failed to create BoundingBox, value for top > value for bottom ({} > {}).",
                top, bottom
            ))
        } else {
            Ok(BoundingBox {
                left,
                top,
                right,
                bottom,
                category,
            })
        }
    }

    /// Builds a box from its top-left corner and its dimensions.
    pub fn from_xywh(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        category: String,
    ) -> Result<Self, String> {
        BoundingBox::new(x, y, x + width, y + height, category)
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn intersection_over_union(&self, other: &BoundingBox) -> f32 {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Integer pixel rectangle `(x, y, width, height)` of the part of the box that lies inside a
    /// `frame_width` x `frame_height` frame, or `None` when nothing of it is on the frame.
    pub fn clip_to_frame(
        &self,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<(i32, i32, u32, u32)> {
        let left = self.left.max(0.0).floor() as i64;
        let top = self.top.max(0.0).floor() as i64;
        let right = (self.right.min(frame_width as f32).floor() as i64).min(frame_width as i64);
        let bottom = (self.bottom.min(frame_height as f32).floor() as i64).min(frame_height as i64);
        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as i32,
            top as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BoundingBox {{ left: {}, top: {}, right: {}, bottom: {}, category: {} }}",
            self.left, self.top, self.right, self.bottom, self.category
        )
    }
}
