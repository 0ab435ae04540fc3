//! Upload validation.
//!
//! Runs before any normalization cost is spent and never touches the
//! filesystem: it inspects only the metadata recorded at the upload boundary.

use crate::asset::{Role, UploadedAsset};
use crate::config::Config;
use crate::error::{Error, Result};

/// The two uploads of a request, checked and tagged by role.
#[derive(Debug, Clone)]
pub struct ValidatedPair {
    pub face: UploadedAsset,
    pub style: UploadedAsset,
}

/// Check the uploaded assets of a request against policy.
///
/// Exactly one asset per role must be present, each declared MIME type must
/// be allowed, and each size must be within the configured maximum.
///
/// # Errors
///
/// Returns `MissingFile`, `UnsupportedType` or `FileTooLarge` describing the
/// first policy violation found.
pub fn validate(config: &Config, uploads: &[(Role, UploadedAsset)]) -> Result<ValidatedPair> {
    let face = find_role(uploads, Role::Face)?;
    let style = find_role(uploads, Role::Style)?;

    for asset in [&face, &style] {
        if !config
            .allowed_mime_types
            .iter()
            .any(|m| m == &asset.mime_type)
        {
            return Err(Error::UnsupportedType {
                mime: asset.mime_type.clone(),
            });
        }

        if asset.size_bytes > config.max_upload_bytes {
            return Err(Error::FileTooLarge {
                size: asset.size_bytes,
                max: config.max_upload_bytes,
            });
        }
    }

    Ok(ValidatedPair { face, style })
}

fn find_role(uploads: &[(Role, UploadedAsset)], role: Role) -> Result<UploadedAsset> {
    uploads
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, asset)| asset.clone())
        .ok_or(Error::MissingFile { role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn asset(name: &str, mime: &str, size: u64) -> UploadedAsset {
        UploadedAsset {
            original_name: name.to_string(),
            stored_path: PathBuf::from(format!("uploads/temp/{name}")),
            size_bytes: size,
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn test_accepts_valid_pair() {
        let config = Config::default();
        let uploads = vec![
            (Role::Face, asset("face.jpg", "image/jpeg", 9 * 1024 * 1024)),
            (Role::Style, asset("style.png", "image/png", 1024)),
        ];

        let pair = validate(&config, &uploads).expect("valid pair");
        assert_eq!(pair.face.original_name, "face.jpg");
        assert_eq!(pair.style.original_name, "style.png");
    }

    #[test]
    fn test_missing_style_is_classified() {
        let config = Config::default();
        let uploads = vec![(Role::Face, asset("face.jpg", "image/jpeg", 1024))];

        let err = validate(&config, &uploads).unwrap_err();
        assert!(matches!(err, Error::MissingFile { role: Role::Style }));
    }

    #[test]
    fn test_missing_face_is_classified() {
        let config = Config::default();
        let uploads = vec![(Role::Style, asset("style.jpg", "image/jpeg", 1024))];

        let err = validate(&config, &uploads).unwrap_err();
        assert!(matches!(err, Error::MissingFile { role: Role::Face }));
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let config = Config::default();
        let uploads = vec![
            (Role::Face, asset("face.gif", "image/gif", 1024)),
            (Role::Style, asset("style.jpg", "image/jpeg", 1024)),
        ];

        let err = validate(&config, &uploads).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { mime } if mime == "image/gif"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let config = Config::default(); // 10MB limit
        let uploads = vec![
            (Role::Face, asset("face.jpg", "image/jpeg", 15 * 1024 * 1024)),
            (Role::Style, asset("style.jpg", "image/jpeg", 1024)),
        ];

        let err = validate(&config, &uploads).unwrap_err();
        assert!(matches!(
            err,
            Error::FileTooLarge { size, max }
                if size == 15 * 1024 * 1024 && max == 10 * 1024 * 1024
        ));
    }
}
