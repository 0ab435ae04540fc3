//! Deterministic resize and re-encode of uploaded images.

use std::io::Cursor;
use std::path::Path;

use image::{imageops::FilterType, DynamicImage};

use crate::error::{Error, Result};

use super::CanonicalImage;

/// Normalize a source image into the canonical transmission format.
///
/// The image is:
/// 1. Read and decoded from the specified path
/// 2. Resized with a centered cover/crop-to-fill policy to `size` x `size`
/// 3. Converted to RGB
/// 4. Re-encoded as JPEG at the pinned `quality`
///
/// Encoder parameters are fixed, so the same input bytes produce the same
/// canonical bytes.
///
/// # Errors
///
/// Returns `Decode` if the source bytes are not a valid image (zero-byte and
/// corrupt files included) and `Encode` if re-encoding fails.
pub fn normalize<P: AsRef<Path>>(path: P, size: u32, quality: u8) -> Result<CanonicalImage> {
    let path = path.as_ref();

    let bytes = std::fs::read(path)?;
    let img = image::load_from_memory(&bytes).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    // resize_to_fill crops centered, matching the "cover" policy
    let resized = img.resize_to_fill(size, size, FilterType::Lanczos3);
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|source| Error::Encode { source })?;

    tracing::debug!(
        "normalized {} ({}x{} -> {size}x{size}, {} bytes)",
        path.display(),
        img.width(),
        img.height(),
        out.len()
    );

    Ok(CanonicalImage { bytes: out, size })
}
