pub mod display;
pub mod image_conversion;
pub mod image_io;
pub mod padding;
