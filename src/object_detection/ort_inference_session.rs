use ort::session::Session;
use std::path::Path;

/// An onnxruntime inference session.
///
/// The ONNX detectors in this project are wrappers around an inference session that handles
/// running the model on hardware.
pub struct OrtInferenceSession {
    pub session: Session,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> ort::Result<Self> {
        let session = Session::builder()?.commit_from_file(model_path)?;
        log::info!("loaded onnx model {}", model_path.display());
        Ok(Self { session })
    }
}
