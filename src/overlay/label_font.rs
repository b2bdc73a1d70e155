use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Pixel height of a font drawn at `font_scale = 1.0`.
const NOMINAL_TEXT_HEIGHT: f64 = 22.0;
/// TrueType em size at `font_scale = 1.0`; capitals cover roughly 70% of the em.
const NOMINAL_EM_SIZE: f64 = 30.0;
const GLYPH_COLUMNS: u32 = 5;
const GLYPH_ROWS: u32 = 7;

#[derive(Debug, Error)]
pub enum LabelFontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("font file is not a valid TrueType/OpenType font")]
    InvalidFont,
}

/// Font used for the warning banner label.
///
/// `Block` is a built-in 5x7 capital-letter face that needs no font file, so the banner always has
/// readable text.
#[derive(Clone, Default)]
pub enum LabelFont {
    TrueType(FontArc),
    #[default]
    Block,
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelFont::TrueType(_) => write!(f, "LabelFont::TrueType"),
            LabelFont::Block => write!(f, "LabelFont::Block"),
        }
    }
}

impl LabelFont {
    pub fn from_file(path: &Path) -> Result<Self, LabelFontError> {
        let bytes = fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|_| LabelFontError::InvalidFont)?;
        Ok(LabelFont::TrueType(font))
    }

    /// Width and height in pixels of `text` drawn at `font_scale`.
    pub fn text_size(&self, text: &str, font_scale: f64) -> (u32, u32) {
        match self {
            LabelFont::TrueType(font) => text_size(px_scale(font_scale), font, text),
            LabelFont::Block => {
                let cell = block_cell(font_scale);
                let glyphs = text.chars().count() as u32;
                if glyphs == 0 {
                    return (0, 0);
                }
                ((glyphs * (GLYPH_COLUMNS + 1) - 1) * cell, GLYPH_ROWS * cell)
            }
        }
    }

    /// Draws `text` with its top-left corner at `origin`. Pixels outside the frame are dropped.
    ///
    /// `thickness` widens TrueType strokes by redrawing with a one pixel horizontal offset; block
    /// glyph cells are already proportional to the scale.
    pub fn draw(
        &self,
        frame: &mut RgbImage,
        text: &str,
        origin: (i32, i32),
        font_scale: f64,
        thickness: u32,
        color: Rgb<u8>,
    ) {
        let (x, y) = origin;
        match self {
            LabelFont::TrueType(font) => {
                let passes = thickness.div_ceil(2).max(1) as i32;
                let scale = px_scale(font_scale);
                for offset in 0..passes {
                    draw_text_mut(frame, color, x + offset, y, scale, font, text);
                }
            }
            LabelFont::Block => {
                let cell = block_cell(font_scale);
                draw_block_text(frame, text, x, y, cell, color);
            }
        }
    }
}

fn px_scale(font_scale: f64) -> PxScale {
    PxScale::from((NOMINAL_EM_SIZE * font_scale).max(1.0) as f32)
}

fn block_cell(font_scale: f64) -> u32 {
    ((font_scale * NOMINAL_TEXT_HEIGHT / GLYPH_ROWS as f64).round() as u32).max(1)
}

fn draw_block_text(frame: &mut RgbImage, text: &str, x: i32, y: i32, cell: u32, color: Rgb<u8>) {
    let advance = ((GLYPH_COLUMNS + 1) * cell) as i32;
    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let origin_x = x + index as i32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..GLYPH_COLUMNS {
                if *bits & (1u8 << (GLYPH_COLUMNS - 1 - column)) == 0 {
                    continue;
                }
                let cell_rect = Rect::at(
                    origin_x + (column * cell) as i32,
                    y + (row as u32 * cell) as i32,
                )
                .of_size(cell, cell);
                draw_filled_rect_mut(frame, cell_rect, color);
            }
        }
    }
}

/// Rows of a 5x7 glyph, most significant of the low five bits is the leftmost column.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        _ => return None,
    };
    Some(rows)
}
