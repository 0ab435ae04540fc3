//! Wire types for the `generateContent` request/response contract.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::ImagePick;

/// Request body: one content entry holding the ordered parts.
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    /// A single-content request from an ordered part list.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part: either text or inline binary image data.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_image(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

/// Usable parts extracted from a response.
#[derive(Debug, Default)]
pub struct ExtractedParts {
    pub commentary: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// Walk the ordered parts of the first candidate.
///
/// The last non-empty text part wins as commentary; the image part kept is
/// chosen by `pick`.
///
/// # Errors
///
/// Returns `EmptyResponse` if no usable part is found and `RemoteService` if
/// an inline image part carries undecodable base64 data.
pub fn extract_parts(response: &GenerateResponse, pick: ImagePick) -> Result<ExtractedParts> {
    let mut extracted = ExtractedParts::default();

    let parts = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or_default();

    for part in parts {
        if let Some(text) = &part.text {
            if !text.is_empty() {
                extracted.commentary = Some(text.clone());
            }
        }

        if let Some(inline) = &part.inline_data {
            if extracted.image.is_some() && pick == ImagePick::First {
                continue;
            }
            let bytes = BASE64
                .decode(inline.data.as_bytes())
                .map_err(|e| Error::RemoteService {
                    message: format!("invalid base64 image data: {e}"),
                })?;
            extracted.image = Some(bytes);
        }
    }

    if extracted.commentary.is_none() && extracted.image.is_none() {
        return Err(Error::EmptyResponse);
    }

    Ok(extracted)
}
