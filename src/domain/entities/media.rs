use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::validators::validate_not_blank;

const MIB: usize = 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

/// What an upload is for; decides its folder, size ceiling and accepted types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKind {
    Logo,
    HeroImage,
    ProjectImage,
    ProjectVideo,
    VideoThumbnail { playback_id: String },
    Generic { folder: String },
}

impl UploadKind {
    pub fn resolve(
        kind: Option<&str>,
        folder: Option<&str>,
        playback_id: Option<&str>,
    ) -> Result<Self, &'static str> {
        match kind.map(str::trim) {
            Some("logo") => Ok(UploadKind::Logo),
            Some("project-hero-image") => Ok(UploadKind::HeroImage),
            Some("project-image") | Some("project-images") => Ok(UploadKind::ProjectImage),
            Some("project-video") => Ok(UploadKind::ProjectVideo),
            Some("video-thumbnail") => match playback_id.map(str::trim) {
                Some(id) if !id.is_empty() => Ok(UploadKind::VideoThumbnail {
                    playback_id: id.to_string(),
                }),
                _ => Err("Playback ID is required for video thumbnails"),
            },
            _ => Ok(UploadKind::Generic {
                folder: folder
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .unwrap_or("uploads")
                    .to_string(),
            }),
        }
    }

    pub fn folder(&self) -> String {
        match self {
            UploadKind::Logo => "logo".to_string(),
            UploadKind::HeroImage => "project-hero-image".to_string(),
            UploadKind::ProjectImage => "project-images".to_string(),
            UploadKind::ProjectVideo => "project-videos".to_string(),
            UploadKind::VideoThumbnail { playback_id } => {
                format!("project-videos/{}/thumbnail", slug::slugify(playback_id))
            }
            UploadKind::Generic { folder } => folder.clone(),
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::Logo => 2 * MIB,
            UploadKind::HeroImage => 10 * MIB,
            UploadKind::ProjectImage => 8 * MIB,
            UploadKind::ProjectVideo => 100 * MIB,
            UploadKind::VideoThumbnail { .. } => 3 * MIB,
            UploadKind::Generic { .. } => 5 * MIB,
        }
    }

    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            UploadKind::ProjectVideo => VIDEO_TYPES,
            UploadKind::Generic { folder } if folder == "videos" => VIDEO_TYPES,
            _ => IMAGE_TYPES,
        }
    }
}

/// A file waiting to be stored.
#[derive(Debug)]
pub struct PendingUpload {
    pub original_name: String,
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub key: String,
    pub original_name: String,
    pub size: u64,
    pub mimetype: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFiles {
    pub project_name: String,
    pub folder: String,
    pub files: Vec<StoredObject>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlRequest {
    #[validate(
        length(min = 1, max = 255, message = "Filename is required"),
        custom(function = "validate_not_blank")
    )]
    pub filename: String,

    #[validate(length(min = 1, message = "Content type is required"))]
    pub content_type: String,

    pub folder: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
    pub key: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignedUploadQuery {
    pub token: String,
}
