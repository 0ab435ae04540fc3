//! Image normalization into the canonical transmission format.

mod normalize;

pub use normalize::normalize;

/// MIME type of every canonical image.
pub const CANONICAL_MIME: &str = "image/jpeg";

/// An image re-encoded into the fixed format sent to the synthesis service.
///
/// Square JPEG at the configured edge length and quality. Never persisted;
/// consumed once by the synthesis client.
#[derive(Debug, Clone)]
pub struct CanonicalImage {
    /// Encoded JPEG bytes.
    pub bytes: Vec<u8>,

    /// Edge length in pixels (canonical images are square).
    pub size: u32,
}
