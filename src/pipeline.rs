//! The style-transfer request pipeline.
//!
//! Sequences validation, concurrent normalization, the single synthesis
//! call, result persistence and deferred cleanup, and maps every failure
//! onto a stage-tagged error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::asset::{Role, UploadedAsset};
use crate::config::{Config, DEFAULT_INSTRUCTION};
use crate::error::Error;
use crate::image;
use crate::reaper::Reaper;
use crate::store::{ResultStore, StoredResult};
use crate::synthesis::Synthesizer;
use crate::validate::{validate, ValidatedPair};

/// States of the request state machine.
///
/// Transitions are strictly sequential except `Validated -> Normalized`,
/// which fans out to two concurrent normalizations and joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Normalized,
    Synthesized,
    Stored,
    Completed,
}

/// A pipeline failure tagged with the last state the machine reached.
///
/// A failure during validation carries `Received`, a failure during
/// normalization carries `Validated`, and so on.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: Error,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pipeline failed after {:?}: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Successful end-to-end outcome.
///
/// `stored` is present if and only if the synthesis response carried image
/// bytes; a text-only response still completes the pipeline.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub stored: Option<StoredResult>,
    pub commentary: Option<String>,
    pub elapsed: Duration,
}

/// Orchestrates one style-transfer request end to end.
pub struct StylePipeline {
    config: Config,
    synthesizer: Arc<dyn Synthesizer>,
    store: ResultStore,
    reaper: Reaper,
}

impl StylePipeline {
    /// Assemble a pipeline from its collaborators.
    ///
    /// The synthesizer is injected so tests can substitute a fake.
    #[must_use]
    pub fn new(config: Config, synthesizer: Arc<dyn Synthesizer>) -> Self {
        let store = ResultStore::new(&config);
        let reaper = Reaper::new(config.cleanup_delay);

        Self {
            config,
            synthesizer,
            store,
            reaper,
        }
    }

    /// Run one request through the full state machine.
    ///
    /// Cleanup of every uploaded asset path is scheduled exactly once,
    /// regardless of which stage failed.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the first stage that failed.
    pub async fn run(
        &self,
        uploads: Vec<(Role, UploadedAsset)>,
        style_hint: Option<&str>,
    ) -> Result<PipelineOutcome, StageFailure> {
        let temp_paths: Vec<PathBuf> = uploads
            .iter()
            .map(|(_, asset)| asset.stored_path.clone())
            .collect();

        let result = self.execute(&uploads, style_hint).await;

        // Unconditional on entering Completed or Failed.
        self.reaper.schedule(temp_paths);

        result
    }

    async fn execute(
        &self,
        uploads: &[(Role, UploadedAsset)],
        style_hint: Option<&str>,
    ) -> Result<PipelineOutcome, StageFailure> {
        // Received -> Validated
        let pair = validate(&self.config, uploads).map_err(fail_at(Stage::Received))?;

        // Validated -> Normalized (fan out, join)
        let (face, style) = self
            .normalize_pair(&pair)
            .await
            .map_err(fail_at(Stage::Validated))?;

        // Normalized -> Synthesized (single external call, no retry)
        let instruction = build_instruction(style_hint);
        let synthesis = self
            .synthesizer
            .synthesize(&face, &style, &instruction)
            .await
            .map_err(fail_at(Stage::Normalized))?;

        // Synthesized -> Stored -> Completed, or straight to Completed when
        // the response was text-only.
        let stored = match synthesis.image.as_deref() {
            Some(bytes) if !bytes.is_empty() => {
                let filename = self.store.result_filename();
                Some(
                    self.store
                        .persist(bytes, &filename)
                        .map_err(fail_at(Stage::Synthesized))?,
                )
            }
            _ => None,
        };

        Ok(PipelineOutcome {
            stored,
            commentary: synthesis.commentary,
            elapsed: synthesis.elapsed,
        })
    }

    /// Normalize both images concurrently and wait for both.
    async fn normalize_pair(
        &self,
        pair: &ValidatedPair,
    ) -> crate::error::Result<(image::CanonicalImage, image::CanonicalImage)> {
        let size = self.config.canonical_size;
        let quality = self.config.canonical_quality;

        let face_path = pair.face.stored_path.clone();
        let style_path = pair.style.stored_path.clone();

        let face_task =
            tokio::task::spawn_blocking(move || image::normalize(&face_path, size, quality));
        let style_task =
            tokio::task::spawn_blocking(move || image::normalize(&style_path, size, quality));

        let (face, style) = tokio::join!(face_task, style_task);

        Ok((
            face.map_err(|e| Error::Io(std::io::Error::other(e)))??,
            style.map_err(|e| Error::Io(std::io::Error::other(e)))??,
        ))
    }
}

/// Tag an error with the last state the machine reached.
fn fail_at(stage: Stage) -> impl FnOnce(Error) -> StageFailure {
    move |error| {
        tracing::warn!("pipeline failed after {stage:?}: {error}");
        StageFailure { stage, error }
    }
}

/// Compose the synthesis instruction, appending the optional style hint.
fn build_instruction(style_hint: Option<&str>) -> String {
    match style_hint {
        Some(hint) if !hint.trim().is_empty() => {
            format!("{DEFAULT_INSTRUCTION} Style preference: {}.", hint.trim())
        }
        _ => DEFAULT_INSTRUCTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::image::CanonicalImage;
    use crate::synthesis::{SynthesisResult, Synthesizer};
    use async_trait::async_trait;
    use ::image::codecs::png::PngEncoder;
    use ::image::{DynamicImage, RgbImage};
    use std::io::Cursor;
    use std::path::Path;

    /// Fake synthesizer returning a canned outcome.
    struct FakeSynthesizer {
        image: Option<Vec<u8>>,
        commentary: Option<String>,
        fail: bool,
    }

    #[async_trait]
    impl Synthesizer for FakeSynthesizer {
        async fn synthesize(
            &self,
            _face: &CanonicalImage,
            _style: &CanonicalImage,
            _instruction: &str,
        ) -> crate::error::Result<SynthesisResult> {
            if self.fail {
                return Err(Error::RemoteService {
                    message: "boom".to_string(),
                });
            }
            Ok(SynthesisResult {
                image: self.image.clone(),
                commentary: self.commentary.clone(),
                elapsed: Duration::from_millis(10),
            })
        }
    }

    fn png_fixture() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut out = Vec::new();
        img.write_with_encoder(PngEncoder::new(Cursor::new(&mut out)))
            .expect("encode fixture");
        out
    }

    fn test_config(root: &Path) -> Config {
        Config {
            canonical_size: 32,
            upload_dir: root.join("temp"),
            results_dir: root.join("processed"),
            cleanup_delay: Duration::ZERO,
            ..Config::default()
        }
    }

    fn staged_upload(config: &Config, name: &str) -> UploadedAsset {
        let path = config.upload_dir.join(name);
        let img = RgbImage::new(40, 30);
        img.save(&path).expect("write upload");

        UploadedAsset {
            original_name: name.to_string(),
            stored_path: path,
            size_bytes: 1024,
            mime_type: "image/png".to_string(),
        }
    }

    fn pipeline_with(config: &Config, fake: FakeSynthesizer) -> StylePipeline {
        config.ensure_dirs().expect("dirs");
        StylePipeline::new(config.clone(), Arc::new(fake))
    }

    async fn wait_for_reaper() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_full_run_persists_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let pipeline = pipeline_with(
            &config,
            FakeSynthesizer {
                image: Some(png_fixture()),
                commentary: Some("done".to_string()),
                fail: false,
            },
        );

        let face = staged_upload(&config, "face.png");
        let style = staged_upload(&config, "style.png");
        let face_path = face.stored_path.clone();
        let style_path = style.stored_path.clone();

        let outcome = pipeline
            .run(vec![(Role::Face, face), (Role::Style, style)], None)
            .await
            .expect("pipeline success");

        let stored = outcome.stored.expect("stored result");
        assert!(stored.path.exists());
        assert!(stored.public_url.starts_with("/uploads/processed/"));
        assert_eq!(outcome.commentary.as_deref(), Some("done"));

        wait_for_reaper().await;
        assert!(!face_path.exists());
        assert!(!style_path.exists());
        // Stored results are not reaped.
        assert!(stored.path.exists());
    }

    #[tokio::test]
    async fn test_text_only_response_completes_without_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let pipeline = pipeline_with(
            &config,
            FakeSynthesizer {
                image: None,
                commentary: Some("cannot comply".to_string()),
                fail: false,
            },
        );

        let face = staged_upload(&config, "face.png");
        let style = staged_upload(&config, "style.png");

        let outcome = pipeline
            .run(vec![(Role::Face, face), (Role::Style, style)], None)
            .await
            .expect("pipeline success");

        assert!(outcome.stored.is_none());
        assert_eq!(outcome.commentary.as_deref(), Some("cannot comply"));
    }

    #[tokio::test]
    async fn test_validation_failure_still_schedules_cleanup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let pipeline = pipeline_with(
            &config,
            FakeSynthesizer {
                image: None,
                commentary: None,
                fail: false,
            },
        );

        let face = staged_upload(&config, "face.png");
        let face_path = face.stored_path.clone();

        let failure = pipeline
            .run(vec![(Role::Face, face)], None)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Received);
        assert!(matches!(
            failure.error,
            Error::MissingFile { role: Role::Style }
        ));

        wait_for_reaper().await;
        assert!(!face_path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_upload_fails_during_normalization() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        config.ensure_dirs().expect("dirs");
        let pipeline = pipeline_with(
            &config,
            FakeSynthesizer {
                image: None,
                commentary: None,
                fail: false,
            },
        );

        let face = staged_upload(&config, "face.png");
        let corrupt_path = config.upload_dir.join("style.png");
        std::fs::write(&corrupt_path, b"garbage").expect("write corrupt");
        let style = UploadedAsset {
            original_name: "style.png".to_string(),
            stored_path: corrupt_path,
            size_bytes: 7,
            mime_type: "image/png".to_string(),
        };

        let failure = pipeline
            .run(vec![(Role::Face, face), (Role::Style, style)], None)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Validated);
        assert_eq!(failure.error.kind(), ErrorKind::Processing);
    }

    #[tokio::test]
    async fn test_remote_failure_is_tagged_and_cleaned_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let pipeline = pipeline_with(
            &config,
            FakeSynthesizer {
                image: None,
                commentary: None,
                fail: true,
            },
        );

        let face = staged_upload(&config, "face.png");
        let style = staged_upload(&config, "style.png");
        let face_path = face.stored_path.clone();
        let style_path = style.stored_path.clone();

        let failure = pipeline
            .run(vec![(Role::Face, face), (Role::Style, style)], None)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Normalized);
        assert_eq!(failure.error.kind(), ErrorKind::RemoteService);

        wait_for_reaper().await;
        assert!(!face_path.exists());
        assert!(!style_path.exists());
    }

    #[test]
    fn test_build_instruction_appends_hint() {
        let plain = build_instruction(None);
        assert!(plain.contains("hairstyle"));

        let hinted = build_instruction(Some("  natural "));
        assert!(hinted.ends_with("Style preference: natural."));

        assert_eq!(build_instruction(Some("   ")), plain);
    }
}
