//! Scale-aware overlay rendering: geometry calibration, corner markers, the warning banner and
//! its blink cycle.

pub mod annotator;
pub mod blink;
pub mod geometry;
pub mod label_font;
