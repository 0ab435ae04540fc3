//! Durable storage of synthesized results.

use std::io::Cursor;
use std::path::PathBuf;

use image::DynamicImage;

use crate::asset::unix_millis;
use crate::config::Config;
use crate::error::{Error, Result};

/// Encoding for persisted results.
///
/// Output fidelity may differ from the canonical input: PNG (the default)
/// leans lossless for final delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    #[default]
    Png,
    Jpeg,
}

impl ResultFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// A persisted synthesis output, addressable by a public URL.
///
/// Lives until externally purged; results are intentionally not reaped.
#[derive(Debug, Clone)]
pub struct StoredResult {
    pub filename: String,
    pub path: PathBuf,
    pub public_url: String,
}

/// Writes synthesized images under the results directory.
pub struct ResultStore {
    results_dir: PathBuf,
    public_prefix: String,
    format: ResultFormat,
    quality: u8,
}

impl ResultStore {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            results_dir: config.results_dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            format: config.result_format,
            quality: config.result_quality,
        }
    }

    /// Timestamp-derived filename for a new result.
    #[must_use]
    pub fn result_filename(&self) -> String {
        format!("result_{}.{}", unix_millis(), self.format.extension())
    }

    /// Re-encode and write an image under the results directory.
    ///
    /// # Errors
    ///
    /// Returns `RemoteService` if the synthesized bytes are not a decodable
    /// image, `Encode` if re-encoding fails, and `Persist` on any filesystem
    /// failure. Persist failures are fatal for the request; there is no
    /// retry.
    pub fn persist(&self, image_bytes: &[u8], filename: &str) -> Result<StoredResult> {
        let img = image::load_from_memory(image_bytes).map_err(|source| Error::RemoteService {
            message: format!("synthesized image is not decodable: {source}"),
        })?;

        let encoded = self.encode(&img)?;

        let path = self.results_dir.join(filename);
        std::fs::write(&path, encoded).map_err(|source| Error::Persist {
            path: path.clone(),
            source,
        })?;

        tracing::info!("stored result at {}", path.display());

        Ok(StoredResult {
            filename: filename.to_string(),
            path,
            public_url: format!("{}/{filename}", self.public_prefix),
        })
    }

    fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);

        match self.format {
            ResultFormat::Png => {
                let encoder = image::codecs::png::PngEncoder::new(&mut cursor);
                img.write_with_encoder(encoder)
                    .map_err(|source| Error::Encode { source })?;
            }
            ResultFormat::Jpeg => {
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, self.quality);
                img.write_with_encoder(encoder)
                    .map_err(|source| Error::Encode { source })?;
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut out = Vec::new();
        img.write_with_encoder(image::codecs::png::PngEncoder::new(Cursor::new(&mut out)))
            .expect("encode fixture");
        out
    }

    fn store_in(dir: &std::path::Path) -> ResultStore {
        let config = Config {
            results_dir: dir.to_path_buf(),
            ..Config::default()
        };
        ResultStore::new(&config)
    }

    #[test]
    fn test_persist_writes_file_and_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let stored = store.persist(&png_bytes(), "result_1.png").expect("persist");

        assert!(stored.path.exists());
        assert_eq!(stored.filename, "result_1.png");
        assert_eq!(stored.public_url, "/uploads/processed/result_1.png");
    }

    #[test]
    fn test_persist_fails_on_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir.path().join("does-not-exist"));

        let err = store.persist(&png_bytes(), "result_1.png").unwrap_err();
        assert!(matches!(err, Error::Persist { .. }));
    }

    #[test]
    fn test_undecodable_bytes_are_remote_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let err = store.persist(b"not an image", "result_1.png").unwrap_err();
        assert!(matches!(err, Error::RemoteService { .. }));
    }

    #[test]
    fn test_result_filename_extension_follows_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());
        assert!(store.result_filename().ends_with(".png"));

        let config = Config {
            results_dir: dir.path().to_path_buf(),
            result_format: ResultFormat::Jpeg,
            ..Config::default()
        };
        let store = ResultStore::new(&config);
        assert!(store.result_filename().ends_with(".jpg"));
    }
}
