pub mod frame_source;

#[cfg(feature = "video-ffmpeg")]
mod ffmpeg_source;

#[cfg(feature = "video-ffmpeg")]
pub use ffmpeg_source::FfmpegVideoSource;
pub use frame_source::{FrameSequence, FrameSource};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoOpenError {
    #[error("failed to open video '{path}': {reason}")]
    Open { path: String, reason: String },
    #[error("video decoding requires the video-ffmpeg feature")]
    BackendUnavailable,
}

/// Opens a local video file for sequential decoding.
#[cfg(feature = "video-ffmpeg")]
pub fn open_video_file(path: &Path) -> Result<Box<dyn FrameSource>, VideoOpenError> {
    Ok(Box::new(FfmpegVideoSource::open(path)?))
}

/// Opens a local video file for sequential decoding.
#[cfg(not(feature = "video-ffmpeg"))]
pub fn open_video_file(path: &Path) -> Result<Box<dyn FrameSource>, VideoOpenError> {
    log::error!(
        "cannot decode {}: built without video-ffmpeg",
        path.display()
    );
    Err(VideoOpenError::BackendUnavailable)
}
