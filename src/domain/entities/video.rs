use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::validators::{validate_not_blank, validate_playback_id, validate_url},
    entities::{
        option_fields::PatchString,
        project::{PageRequest, SortOrder},
    },
};

const MAX_TITLE_LENGTH: u64 = 200;
const MAX_DESCRIPTION_LENGTH: u64 = 1000;
const MAX_PLAYBACK_ID_LENGTH: u64 = 128;

/// Video row as stored, nested under its project.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVideo {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub playback_id: String,
    pub thumbnail: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video enriched with its owning project's name and inherited categories.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub title: String,
    pub description: Option<String>,
    pub playback_id: String,
    pub thumbnail: String,
    pub featured: bool,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn enrich(video: ProjectVideo, project_name: String, categories: Vec<String>) -> Self {
        VideoResponse {
            id: video.id,
            project_id: video.project_id,
            project_name,
            title: video.title,
            description: video.description,
            playback_id: video.playback_id,
            thumbnail: video.thumbnail,
            featured: video.featured,
            categories,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewVideoRequest {
    /// Optional in the body when the project id comes from the path.
    pub project_id: Option<Uuid>,

    #[validate(
        length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,

    #[validate(length(max = MAX_DESCRIPTION_LENGTH, message = "Description too long"))]
    pub description: Option<String>,

    #[validate(
        length(min = 1, max = MAX_PLAYBACK_ID_LENGTH, message = "Playback ID must be 1-128 characters"),
        custom(function = "validate_playback_id")
    )]
    pub playback_id: String,

    #[validate(custom(function = "validate_url"))]
    pub thumbnail: Option<String>,

    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    #[validate(
        length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(length(max = MAX_DESCRIPTION_LENGTH, message = "Description too long"))]
    pub description: PatchString,

    #[validate(
        length(min = 1, max = MAX_PLAYBACK_ID_LENGTH, message = "Playback ID must be 1-128 characters"),
        custom(function = "validate_playback_id")
    )]
    pub playback_id: Option<String>,

    #[validate(custom(function = "validate_url"))]
    pub thumbnail: Option<String>,

    pub featured: Option<bool>,
}

impl UpdateVideoRequest {
    pub fn normalized(self) -> Self {
        UpdateVideoRequest {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description.blank_as_null(),
            playback_id: self.playback_id.map(|p| p.trim().to_string()),
            thumbnail: self.thumbnail,
            featured: self.featured,
        }
    }
}

impl ProjectVideo {
    pub fn from_request(project_id: Uuid, req: NewVideoRequest) -> Self {
        let now = Utc::now();
        ProjectVideo {
            id: Uuid::new_v4(),
            project_id,
            title: req.title.trim().to_string(),
            description: req.description.filter(|d| !d.trim().is_empty()),
            playback_id: req.playback_id.trim().to_string(),
            thumbnail: req.thumbnail.unwrap_or_default(),
            featured: req.featured,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: &UpdateVideoRequest) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        changes.description.apply_to(&mut self.description);
        if let Some(playback_id) = &changes.playback_id {
            self.playback_id = playback_id.clone();
        }
        if let Some(thumbnail) = &changes.thumbnail {
            self.thumbnail = thumbnail.clone();
        }
        if let Some(featured) = changes.featured {
            self.featured = featured;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    Title,
    #[default]
    CreatedAt,
}

impl VideoSortField {
    pub fn from_token(token: &str) -> Self {
        match token {
            "title" => VideoSortField::Title,
            _ => VideoSortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            VideoSortField::Title => "title",
            VideoSortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub featured: Option<bool>,
    pub project_id: Option<Uuid>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoFilter {
    pub featured: Option<bool>,
    pub project_id: Option<Uuid>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: VideoSortField,
    pub sort_order: SortOrder,
    pub page: Option<PageRequest>,
}

impl From<VideoQuery> for VideoFilter {
    fn from(query: VideoQuery) -> Self {
        VideoFilter {
            featured: query.featured,
            project_id: query.project_id,
            category: query
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort_by: query
                .sort_by
                .as_deref()
                .map(VideoSortField::from_token)
                .unwrap_or_default(),
            sort_order: query
                .sort_order
                .as_deref()
                .map(SortOrder::from_token)
                .unwrap_or_default(),
            page: Some(PageRequest::new(query.page, query.limit)),
        }
    }
}

impl VideoFilter {
    pub fn featured() -> Self {
        VideoFilter {
            featured: Some(true),
            ..Default::default()
        }
    }

    pub fn by_project(project_id: Uuid) -> Self {
        VideoFilter {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    pub fn by_category(name: &str) -> Self {
        VideoFilter {
            category: Some(name.trim().to_string()),
            ..Default::default()
        }
    }

    pub fn search(term: &str) -> Self {
        VideoFilter {
            search: Some(term.trim().to_string()),
            ..Default::default()
        }
    }

    /// Title, description, playback id or owning project name, case-insensitive.
    pub fn matches_search(&self, video: &ProjectVideo, project_name: &str) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.to_lowercase();
        video.title.to_lowercase().contains(&term)
            || video
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
            || video.playback_id.to_lowercase().contains(&term)
            || project_name.to_lowercase().contains(&term)
    }
}
