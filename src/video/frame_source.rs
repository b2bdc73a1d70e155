//! Sequential frame sources for the video path.
//!
//! A frame source hands out decoded frames one at a time. `None` marks the end of the stream;
//! decode failures are reported the same way so the processing loop can stop gracefully.

use image::RgbImage;
use std::collections::VecDeque;

pub trait FrameSource {
    /// Next decoded frame, or `None` at end of stream or on decode failure.
    fn next_frame(&mut self) -> Option<RgbImage>;

    /// Total number of frames when the container reports it.
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<RgbImage> {
        (**self).next_frame()
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (**self).frame_count_hint()
    }
}

/// In-memory frame source over already decoded frames.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    frames: VecDeque<RgbImage>,
    frame_count: Option<u64>,
}

impl FrameSequence {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        let frame_count = Some(frames.len() as u64);
        FrameSequence {
            frames: frames.into(),
            frame_count,
        }
    }

    /// Overrides the reported frame count, e.g. `None` for a container that does not know it.
    pub fn with_frame_count_hint(mut self, frame_count: Option<u64>) -> Self {
        self.frame_count = frame_count;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FrameSequence {
    fn next_frame(&mut self) -> Option<RgbImage> {
        self.frames.pop_front()
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn sequence_yields_frames_in_order_then_ends() {
        let frames: Vec<RgbImage> = (0..3)
            .map(|i| RgbImage::from_pixel(2, 2, Rgb([i, i, i])))
            .collect();
        let mut source = FrameSequence::new(frames);
        assert_eq!(source.frame_count_hint(), Some(3));
        for i in 0..3u8 {
            let frame = source.next_frame().unwrap();
            assert_eq!(frame.get_pixel(0, 0), &Rgb([i, i, i]));
        }
        assert!(source.next_frame().is_none());
        assert!(source.next_frame().is_none());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn unknown_frame_count() {
        let source = FrameSequence::new(vec![RgbImage::new(1, 1)]).with_frame_count_hint(None);
        let boxed: Box<dyn FrameSource> = Box::new(source);
        assert_eq!(boxed.frame_count_hint(), None);
    }
}
