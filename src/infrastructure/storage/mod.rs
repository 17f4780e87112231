pub mod local;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    entities::{media::BlobMetadata, token::UploadClaims},
    errors::AppError,
};

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Object storage for uploaded media, addressed by slash-separated keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<BlobMetadata, AppError>;
    async fn get(&self, key: &str) -> Result<(Vec<u8>, BlobMetadata), AppError>;
    async fn head(&self, key: &str) -> Result<BlobMetadata, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    /// Every object whose key starts with `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMetadata>, AppError>;
    async fn health(&self) -> Result<(), AppError>;

    fn public_url(&self, key: &str) -> String;
    /// Short-lived URL that accepts a single `PUT` of `key`.
    fn signed_upload_url<'a>(&self, key: &str, content_type: Option<&'a str>) -> Result<String, AppError>;
    fn verify_signed_upload(&self, key: &str, token: &str) -> Result<UploadClaims, AppError>;
    fn signed_url_ttl_secs(&self) -> u64;
}

/// Rejects keys that could escape the store root.
pub fn validate_key(key: &str) -> Result<(), AppError> {
    let invalid = key.trim().is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|segment| segment == ".." || segment == "." || segment.is_empty());

    if invalid {
        tracing::warn!(key, "Rejected blob key");
        return Err(AppError::BadRequest("Invalid file key".into()));
    }
    Ok(())
}

/// `{slug(project)}/{folder}/{timestamp}-{random}.{ext}`, project segment optional.
pub fn build_key(project_name: Option<&str>, folder: &str, extension: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    let file_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, extension);

    match project_name.map(slug::slugify).filter(|s| !s.is_empty()) {
        Some(project) => format!("{}/{}/{}", project, folder, file_name),
        None => format!("{}/{}", folder, file_name),
    }
}

/// Sniffs the payload; falls back to the declared type when the bytes are not recognised.
pub fn detect_content_type(bytes: &[u8], declared: Option<&str>) -> String {
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_string())
        .or_else(|| declared.map(|d| d.trim().to_ascii_lowercase()).filter(|d| !d.is_empty()))
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

pub fn extension_for(content_type: &str, original_name: Option<&str>) -> String {
    let known = match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        _ => None,
    };
    known
        .map(str::to_string)
        .or_else(|| {
            original_name
                .and_then(|n| Path::new(n).extension())
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_cannot_escape_the_root() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path.png").is_err());
        assert!(validate_key("a//b.png").is_err());
        assert!(validate_key("aqua/logo/123-abc.png").is_ok());
    }

    #[test]
    fn built_keys_are_namespaced_by_project_slug() {
        let key = build_key(Some("Aqua Finance"), "logo", "png");
        assert!(key.starts_with("aqua-finance/logo/"));
        assert!(key.ends_with(".png"));
        assert!(validate_key(&key).is_ok());

        assert!(build_key(None, "uploads", "jpg").starts_with("uploads/"));
    }

    #[test]
    fn sniffed_type_wins_over_declared() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_content_type(&png, Some("image/jpeg")), "image/png");
        assert_eq!(detect_content_type(b"plain", Some("Image/WebP")), "image/webp");
        assert_eq!(detect_content_type(b"plain", None), FALLBACK_CONTENT_TYPE);
    }
}
