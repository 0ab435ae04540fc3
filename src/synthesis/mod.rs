//! External synthesis service client.

mod client;
mod wire;

pub use client::{ServiceStatus, SynthesisClient};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::image::CanonicalImage;

/// Which inline image part to keep when a response carries several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePick {
    /// Keep the last image part (the service's final render).
    #[default]
    Last,
    /// Keep the first image part.
    First,
}

/// Outcome of one synthesis call.
///
/// The service may return an image, commentary text, or both; a text-only
/// response is still a success.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Synthesized image bytes, if the service returned one.
    pub image: Option<Vec<u8>>,

    /// Last non-empty text part of the response.
    pub commentary: Option<String>,

    /// Wall-clock duration of the remote call.
    pub elapsed: Duration,
}

/// Composes a new image from two canonical images and an instruction.
///
/// Implemented by [`SynthesisClient`] for the real service and by fakes in
/// orchestrator tests. Implementations make exactly one remote call per
/// invocation and never retry.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Request a composition of `face` and `style` following `instruction`.
    async fn synthesize(
        &self,
        face: &CanonicalImage,
        style: &CanonicalImage,
        instruction: &str,
    ) -> Result<SynthesisResult>;
}
