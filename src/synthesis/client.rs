//! HTTP client for the generative synthesis service.

use std::time::Instant;

use async_trait::async_trait;

use crate::config::{Config, PLACEHOLDER_API_KEY};
use crate::error::{Error, Result};
use crate::image::{CanonicalImage, CANONICAL_MIME};

use super::wire::{extract_parts, GenerateRequest, GenerateResponse, Part};
use super::{ImagePick, SynthesisResult, Synthesizer};

/// Outcome of a [`SynthesisClient::check_status`] probe.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    /// The model the probe was issued against.
    pub model: String,

    /// Truncated sample of the probe's text reply.
    pub sample: String,
}

/// Client for the remote image-synthesis capability.
///
/// Wraps auth, request construction and response parsing for the
/// `generateContent` contract. One call per pipeline run, no retries.
#[derive(Debug)]
pub struct SynthesisClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
    image_pick: ImagePick,
}

impl SynthesisClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if the API key is absent or still the
    /// placeholder value. This is checked here so a misconfigured process
    /// fails at construction, not on the first request.
    pub fn new(config: &Config) -> Result<Self> {
        if config.api_key.trim().is_empty() || config.api_key == PLACEHOLDER_API_KEY {
            return Err(Error::MissingCredential);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            image_pick: config.image_pick,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|source| Error::RemoteService {
                message: source.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(500).collect();
            return Err(Error::RemoteService {
                message: format!("HTTP {status}: {detail}"),
            });
        }

        response
            .json()
            .await
            .map_err(|source| Error::RemoteService {
                message: format!("unreadable response body: {source}"),
            })
    }

    /// Probe the service for reachability and auth validity.
    ///
    /// Issues a minimal text-only request against the configured model,
    /// independent of the main synthesis flow.
    ///
    /// # Errors
    ///
    /// Returns `RemoteService` on transport or non-success failures and
    /// `EmptyResponse` if the probe reply carries no text.
    pub async fn check_status(&self) -> Result<ServiceStatus> {
        let request = GenerateRequest::from_parts(vec![Part::text("Hello")]);
        let response = self.generate(&request).await?;

        let extracted = extract_parts(&response, self.image_pick)?;
        let sample = extracted
            .commentary
            .map(|text| text.chars().take(50).collect())
            .ok_or(Error::EmptyResponse)?;

        Ok(ServiceStatus {
            model: self.model.clone(),
            sample,
        })
    }
}

#[async_trait]
impl Synthesizer for SynthesisClient {
    async fn synthesize(
        &self,
        face: &CanonicalImage,
        style: &CanonicalImage,
        instruction: &str,
    ) -> Result<SynthesisResult> {
        tracing::info!("requesting synthesis from model {}", self.model);

        // Part order matters: the instruction refers to "the first image"
        // and "the second image".
        let request = GenerateRequest::from_parts(vec![
            Part::text(instruction),
            Part::inline_image(CANONICAL_MIME, &face.bytes),
            Part::inline_image(CANONICAL_MIME, &style.bytes),
        ]);

        let started = Instant::now();
        let response = self.generate(&request).await?;
        let elapsed = started.elapsed();

        let extracted = extract_parts(&response, self.image_pick)?;

        match &extracted.image {
            Some(bytes) => tracing::info!(
                "synthesis produced {} image bytes in {}ms",
                bytes.len(),
                elapsed.as_millis()
            ),
            None => tracing::info!("synthesis returned text only in {}ms", elapsed.as_millis()),
        }

        Ok(SynthesisResult {
            image: extracted.image,
            commentary: extracted.commentary,
            elapsed,
        })
    }
}
