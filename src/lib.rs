//! # restyle
//!
//! A hairstyle style-transfer pipeline: two uploaded photographs (a face
//! photo and a hairstyle-reference photo) are validated, normalized into a
//! canonical format, composed by an external generative image-synthesis
//! service, and the result is persisted under a retrievable URL. Temporary
//! uploads are reaped after a bounded delay whether the request succeeds or
//! fails.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use restyle::{asset, Config, Role, StylePipeline, SynthesisClient};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env();
//! config.validate()?;
//! config.ensure_dirs()?;
//!
//! let client = Arc::new(SynthesisClient::new(&config)?);
//! let pipeline = StylePipeline::new(config.clone(), client);
//!
//! let face = asset::stage_upload("face.jpg".as_ref(), &config.upload_dir)?;
//! let style = asset::stage_upload("style.jpg".as_ref(), &config.upload_dir)?;
//!
//! let outcome = pipeline
//!     .run(vec![(Role::Face, face), (Role::Style, style)], None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod config;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod reaper;
pub mod store;
pub mod synthesis;
pub mod validate;

pub use asset::{Role, UploadedAsset};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{PipelineOutcome, Stage, StageFailure, StylePipeline};
pub use store::StoredResult;
pub use synthesis::{SynthesisClient, SynthesisResult, Synthesizer};
