use crate::image_utils::display::{DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH};
use crate::overlay::annotator::DEFAULT_WARNING_LABEL;
use crate::overlay::blink::DEFAULT_BLINK_CADENCE;
use crate::pipeline::processor::{DEFAULT_CONFIDENCE_THRESHOLD, ProcessorSettings};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "SMOKE_WATCH_CONFIG";
pub const CONFIDENCE_ENV: &str = "SMOKE_WATCH_CONFIDENCE";
pub const MODEL_PATH_ENV: &str = "SMOKE_WATCH_MODEL";

const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;
const DEFAULT_NMS_IOU: f32 = 0.45;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    confidence_threshold: Option<f32>,
    display: Option<DisplayConfigFile>,
    overlay: Option<OverlayConfigFile>,
    model: Option<ModelConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DisplayConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OverlayConfigFile {
    blink_cadence: Option<u32>,
    warning_label: Option<String>,
    font_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    classes_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    nms_iou_threshold: Option<f32>,
    target_class: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub confidence_threshold: f32,
    pub display: DisplaySettings,
    pub overlay: OverlaySettings,
    pub model: ModelSettings,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlaySettings {
    pub blink_cadence: u32,
    pub warning_label: String,
    /// TrueType font for the banner label; the built-in block font is used when unset.
    pub font_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelSettings {
    pub path: Option<PathBuf>,
    pub classes_path: Option<PathBuf>,
    pub input_width: u32,
    pub input_height: u32,
    pub nms_iou_threshold: f32,
    /// Keep only detections of this class. All classes are kept when unset.
    pub target_class: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_file(AppConfigFile::default())
    }
}

impl AppConfig {
    /// Loads the configuration from `explicit_path`, falling back to the file named by
    /// `SMOKE_WATCH_CONFIG`, then applies environment overrides and validates the result.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit_path, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with environment lookups going through `lookup`.
    pub fn load_with(
        explicit_path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let config_path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => non_blank(lookup(CONFIG_PATH_ENV)).map(PathBuf::from),
        };
        let mut config = match config_path {
            Some(path) => {
                log::info!("loading config from {}", path.display());
                let text = match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(source) => return Err(ConfigError::Read { path, source }),
                };
                Self::from_file(toml::from_str(&text)?)
            }
            None => AppConfig::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document. Missing keys take their defaults; nothing is validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_file(toml::from_str(text)?))
    }

    fn from_file(file: AppConfigFile) -> Self {
        let display = file.display.unwrap_or_default();
        let overlay = file.overlay.unwrap_or_default();
        let model = file.model.unwrap_or_default();
        AppConfig {
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            display: DisplaySettings {
                width: display.width.unwrap_or(DEFAULT_DISPLAY_WIDTH),
                height: display.height.unwrap_or(DEFAULT_DISPLAY_HEIGHT),
            },
            overlay: OverlaySettings {
                blink_cadence: overlay.blink_cadence.unwrap_or(DEFAULT_BLINK_CADENCE),
                warning_label: overlay
                    .warning_label
                    .unwrap_or_else(|| DEFAULT_WARNING_LABEL.to_string()),
                font_path: overlay.font_path,
            },
            model: ModelSettings {
                path: model.path,
                classes_path: model.classes_path,
                input_width: model.input_width.unwrap_or(DEFAULT_MODEL_INPUT_SIZE),
                input_height: model.input_height.unwrap_or(DEFAULT_MODEL_INPUT_SIZE),
                nms_iou_threshold: model.nms_iou_threshold.unwrap_or(DEFAULT_NMS_IOU),
                target_class: non_blank(model.target_class),
            },
        }
    }

    /// Applies `SMOKE_WATCH_CONFIDENCE` and `SMOKE_WATCH_MODEL`. Blank values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(confidence) = non_blank(lookup(CONFIDENCE_ENV)) {
            self.confidence_threshold = match confidence.trim().parse() {
                Ok(value) => value,
                Err(_) => {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be a number between 0 and 1, got '{}'",
                        CONFIDENCE_ENV, confidence
                    )));
                }
            };
        }
        if let Some(model) = non_blank(lookup(MODEL_PATH_ENV)) {
            self.model.path = Some(PathBuf::from(model));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "display size must be positive, got {}x{}",
                self.display.width, self.display.height
            )));
        }
        if self.overlay.blink_cadence == 0 {
            return Err(ConfigError::Invalid(
                "overlay.blink_cadence must be greater than zero".to_string(),
            ));
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "model input size must be positive, got {}x{}",
                self.model.input_width, self.model.input_height
            )));
        }
        if !(0.0..=1.0).contains(&self.model.nms_iou_threshold) {
            return Err(ConfigError::Invalid(format!(
                "model.nms_iou_threshold must be within [0, 1], got {}",
                self.model.nms_iou_threshold
            )));
        }
        Ok(())
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            confidence_threshold: self.confidence_threshold,
            display_width: self.display.width,
            display_height: self.display.height,
            blink_cadence: self.overlay.blink_cadence,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
