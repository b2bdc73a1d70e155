//! Smoking-detection overlay pipeline.
//!
//! Frames from still images or videos are passed through a [`Detector`], annotated with corner
//! brackets and a latched, blinking warning banner, summarised in a [`SessionStatus`] and scaled
//! for display.

pub mod annotations;
pub mod config;
pub mod image_utils;
pub mod object_detection;
pub mod overlay;
pub mod pipeline;
pub mod session;
pub mod video;

pub use annotations::bounding_box::BoundingBox;
pub use annotations::detection::Detection;
pub use config::{AppConfig, ConfigError};
pub use object_detection::{Detector, DetectorError};
pub use overlay::annotator::FrameAnnotator;
pub use pipeline::{
    FrameProcessor, FrameSink, FrameUpdate, PipelineError, ProcessingReport, ProcessorSettings,
    UploadKind, Verdict,
};
pub use session::{SessionState, SessionStatus};
pub use video::{FrameSequence, FrameSource};
