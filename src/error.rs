//! Custom error types for restyle.

use std::path::PathBuf;
use thiserror::Error;

use crate::asset::Role;

/// Main error type for the restyle library.
#[derive(Error, Debug)]
pub enum Error {
    /// A required upload role was not present in the request.
    #[error("missing uploaded file for role {role}")]
    MissingFile { role: Role },

    /// The declared MIME type of an upload is not allowed.
    #[error("unsupported file type {mime}")]
    UnsupportedType { mime: String },

    /// An upload exceeds the configured size limit.
    #[error("file of {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    /// Source bytes could not be decoded as an image.
    #[error("failed to decode image from {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding a canonical or result image failed.
    #[error("failed to encode image: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },

    /// The synthesis credential is absent or a placeholder.
    #[error("synthesis API key is not configured")]
    MissingCredential,

    /// The remote synthesis service failed or returned a non-success status.
    #[error("synthesis service error: {message}")]
    RemoteService { message: String },

    /// The remote response contained no usable text or image part.
    #[error("synthesis response contained no usable parts")]
    EmptyResponse,

    /// Writing the synthesized result to durable storage failed.
    #[error("failed to persist result to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used to map failures onto response semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User-correctable input problem (4xx-equivalent).
    Validation,
    /// Malformed image bytes (treated as a user-input problem).
    Processing,
    /// External call failed or returned unusable content (5xx-equivalent).
    RemoteService,
    /// Local storage failure (5xx-equivalent, fatal for the request).
    Persist,
    /// Missing credential or invalid parameter at construction time.
    Configuration,
}

impl Error {
    /// Classify this error per the pipeline's response taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFile { .. } | Self::UnsupportedType { .. } | Self::FileTooLarge { .. } => {
                ErrorKind::Validation
            }
            Self::Decode { .. } | Self::Encode { .. } => ErrorKind::Processing,
            Self::RemoteService { .. } | Self::EmptyResponse => ErrorKind::RemoteService,
            Self::Persist { .. } | Self::Io(_) => ErrorKind::Persist,
            Self::MissingCredential | Self::InvalidParameter { .. } => ErrorKind::Configuration,
        }
    }
}

/// Result type alias for restyle operations.
pub type Result<T> = std::result::Result<T, Error>;
