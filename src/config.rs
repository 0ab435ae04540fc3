//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::store::ResultFormat;
use crate::synthesis::ImagePick;

/// Default instruction sent alongside the two images.
pub const DEFAULT_INSTRUCTION: &str = "Take the first image of the person. Add the hairstyle \
     from the second image to the person. Ensure the person's face and features remain \
     completely unchanged.";

/// Placeholder credential value that must never reach the remote service.
pub const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

/// Configuration for the style-transfer pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,

    /// Declared MIME types accepted for uploads.
    pub allowed_mime_types: Vec<String>,

    /// Canonical image edge length (images are square-cropped to this).
    pub canonical_size: u32,

    /// JPEG quality (1-100) for canonical re-encoding.
    pub canonical_quality: u8,

    /// Encoding used for persisted results.
    pub result_format: ResultFormat,

    /// Quality (1-100) for lossy result encoding. Ignored for PNG.
    pub result_quality: u8,

    /// API key for the synthesis service.
    pub api_key: String,

    /// Remote model identifier.
    pub model: String,

    /// Base URL of the synthesis API.
    pub api_base: String,

    /// Directory where uploaded assets are staged.
    pub upload_dir: PathBuf,

    /// Directory where synthesized results are persisted.
    pub results_dir: PathBuf,

    /// URL prefix under which persisted results are served.
    pub public_prefix: String,

    /// Delay before temporary uploads are reaped.
    pub cleanup_delay: Duration,

    /// Which inline image part to keep when the response carries several.
    pub image_pick: ImagePick,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            canonical_size: 1024,
            canonical_quality: 90,
            result_format: ResultFormat::Png,
            result_quality: 95,
            api_key: String::new(),
            model: "gemini-2.5-flash-image-preview".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            upload_dir: PathBuf::from("uploads/temp"),
            results_dir: PathBuf::from("uploads/processed"),
            public_prefix: "/uploads/processed".to_string(),
            cleanup_delay: Duration::from_secs(5),
            image_pick: ImagePick::Last,
        }
    }
}

impl Config {
    /// Build a configuration from the environment, falling back to defaults.
    ///
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_API_BASE`,
    /// `MAX_FILE_SIZE` and `UPLOAD_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.api_key = key;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Ok(base) = std::env::var("GEMINI_API_BASE") {
            config.api_base = base;
        }
        if let Ok(max) = std::env::var("MAX_FILE_SIZE") {
            if let Ok(bytes) = max.parse::<u64>() {
                config.max_upload_bytes = bytes;
            }
        }
        if let Ok(dir) = std::env::var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(&dir).join("temp");
            config.results_dir = PathBuf::from(&dir).join("processed");
        }

        config
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(Error::InvalidParameter {
                name: "max_upload_bytes".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.allowed_mime_types.is_empty() {
            return Err(Error::InvalidParameter {
                name: "allowed_mime_types".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.canonical_size == 0 {
            return Err(Error::InvalidParameter {
                name: "canonical_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.canonical_quality) {
            return Err(Error::InvalidParameter {
                name: "canonical_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        if !(1..=100).contains(&self.result_quality) {
            return Err(Error::InvalidParameter {
                name: "result_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(Error::InvalidParameter {
                name: "model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Create the upload and results directories if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }
}
