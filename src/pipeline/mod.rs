pub mod processor;
pub mod upload;

pub use processor::{
    FrameProcessor, FrameSink, FrameUpdate, ProcessingReport, ProcessorSettings, Verdict,
};
pub use upload::{UploadKind, collect_uploads};

use crate::video::VideoOpenError;
use thiserror::Error;

/// Failures surfaced to the caller. Per-frame problems never end up here; they degrade to
/// "no detections" or "no update" inside the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported upload '{0}', expected .jpg, .jpeg, .png, .mp4 or .mov")]
    UnsupportedUpload(String),
    #[error("failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Video(#[from] VideoOpenError),
}
