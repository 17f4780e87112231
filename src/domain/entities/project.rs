use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    domain::validators::{
        validate_category_names, validate_optional_url_field, validate_url, validate_url_list,
    },
    entities::{option_fields::PatchString, video::ProjectVideo},
};

// ───── Constants ──────────────────────────────────────────────────────
const MAX_NAME_LENGTH: u64 = 100;
const MIN_DESCRIPTION_LENGTH: u64 = 10;
const MAX_DESCRIPTION_LENGTH: u64 = 1000;
const MAX_TAGLINE_LENGTH: u64 = 200;
const MAX_CATEGORIES: u64 = 5;

// ───── Status ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Published,
    #[default]
    Unpublished,
}

impl ProjectStatus {
    /// Maps a client token onto the stored enum.
    ///
    /// Matching is case-insensitive. Unknown tokens collapse to `Unpublished`;
    /// the legacy filter vocabulary is accepted but logged as deprecated.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "published" => ProjectStatus::Published,
            "unpublished" => ProjectStatus::Unpublished,
            legacy @ ("active" | "inactive" | "coming-soon" | "pending") => {
                tracing::warn!(status = legacy, "Deprecated project status token, treating as unpublished");
                ProjectStatus::Unpublished
            }
            other => {
                tracing::debug!(status = other, "Unknown project status token, treating as unpublished");
                ProjectStatus::Unpublished
            }
        }
    }

    /// Status filter for listings; `all` or blank means no filter.
    pub fn filter_from_token(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(Self::from_token(trimmed))
        }
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub logo: Option<String>,
    pub hero_image: Option<String>,
    pub website: Option<String>,
    pub video_url: Option<String>,
    pub featured: bool,
    pub status: ProjectStatus,
    pub is_hiring: bool,
    pub career_page_url: Option<String>,
    pub is_open_for_bounty: bool,
    pub bounty_submission_url: Option<String>,
    pub is_open_source: bool,
    pub github_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct SocialLinks {
    #[serde(skip)]
    pub project_id: Uuid,
    pub website: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub discord: Option<String>,
    pub telegram: Option<String>,
    pub medium: Option<String>,
    pub youtube: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectImage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub url: String,
    pub alt: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl ProjectImage {
    /// Builds the ordered image list for a project; order is the array index.
    pub fn from_urls(project_id: Uuid, urls: &[String]) -> Vec<ProjectImage> {
        let now = Utc::now();
        urls.iter()
            .enumerate()
            .map(|(index, url)| ProjectImage {
                id: Uuid::new_v4(),
                project_id,
                url: url.clone(),
                alt: format!("Project image {}", index + 1),
                sort_order: index as i32,
                created_at: now,
            })
            .collect()
    }
}

// ───── API Response Models ──────────────────────────────────────────

/// Project aggregate as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub categories: Vec<String>,
    pub logo: Option<String>,
    pub hero_image: Option<String>,
    pub website: Option<String>,
    pub video_url: Option<String>,
    pub featured: bool,
    pub status: ProjectStatus,
    pub is_hiring: bool,
    pub career_page_url: Option<String>,
    pub is_open_for_bounty: bool,
    pub bounty_submission_url: Option<String>,
    pub is_open_source: bool,
    pub github_url: Option<String>,
    pub images: Vec<String>,
    pub videos: Vec<ProjectVideo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Assembles the aggregate. `images` must already be in display order.
    pub fn assemble(
        row: ProjectRow,
        categories: Vec<String>,
        images: Vec<ProjectImage>,
        videos: Vec<ProjectVideo>,
        social_links: Option<SocialLinks>,
    ) -> Self {
        Project {
            id: row.id,
            name: row.name,
            tagline: row.tagline,
            description: row.description,
            categories,
            logo: row.logo,
            hero_image: row.hero_image,
            website: row.website,
            video_url: row.video_url,
            featured: row.featured,
            status: row.status,
            is_hiring: row.is_hiring,
            career_page_url: row.career_page_url,
            is_open_for_bounty: row.is_open_for_bounty,
            bounty_submission_url: row.bounty_submission_url,
            is_open_source: row.is_open_source,
            github_url: row.github_url,
            images: images.into_iter().map(|img| img.url).collect(),
            videos,
            social_links,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinksInput {
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub website: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub github: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub twitter: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub discord: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub telegram: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub medium: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub youtube: PatchString,
}

impl SocialLinksInput {
    /// Empty strings are the "unset" sentinel.
    pub fn normalized(self) -> Self {
        SocialLinksInput {
            website: self.website.blank_as_null(),
            github: self.github.blank_as_null(),
            twitter: self.twitter.blank_as_null(),
            discord: self.discord.blank_as_null(),
            telegram: self.telegram.blank_as_null(),
            medium: self.medium.blank_as_null(),
            youtube: self.youtube.blank_as_null(),
        }
    }
}

impl SocialLinks {
    /// Upsert semantics: start from the stored row (or an empty one) and
    /// overwrite the supplied fields.
    pub fn merged(project_id: Uuid, existing: Option<SocialLinks>, patch: &SocialLinksInput) -> Self {
        let mut links = existing.unwrap_or_default();
        links.project_id = project_id;
        patch.website.apply_to(&mut links.website);
        patch.github.apply_to(&mut links.github);
        patch.twitter.apply_to(&mut links.twitter);
        patch.discord.apply_to(&mut links.discord);
        patch.telegram.apply_to(&mut links.telegram);
        patch.medium.apply_to(&mut links.medium);
        patch.youtube.apply_to(&mut links.youtube);
        links
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = MAX_TAGLINE_LENGTH, message = "Tagline too long"))]
    pub tagline: String,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        max = MAX_DESCRIPTION_LENGTH,
        message = "Description must be 10-1000 characters"
    ))]
    pub description: String,

    #[validate(
        length(min = 1, max = MAX_CATEGORIES, message = "Between 1 and 5 categories are required"),
        custom(function = "validate_category_names")
    )]
    pub categories: Vec<String>,

    #[validate(custom(function = "validate_url"))]
    pub logo: Option<String>,
    #[validate(custom(function = "validate_url"))]
    pub hero_image: Option<String>,
    #[validate(custom(function = "validate_url"))]
    pub website: Option<String>,
    #[validate(custom(function = "validate_url"))]
    pub video_url: Option<String>,

    #[serde(default)]
    pub featured: bool,

    pub status: Option<String>,

    #[serde(default)]
    pub is_hiring: bool,
    #[validate(custom(function = "validate_url"))]
    pub career_page_url: Option<String>,
    #[serde(default)]
    pub is_open_for_bounty: bool,
    #[validate(custom(function = "validate_url"))]
    pub bounty_submission_url: Option<String>,
    #[serde(default)]
    pub is_open_source: bool,
    #[validate(custom(function = "validate_url"))]
    pub github_url: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_url_list"))]
    pub images: Vec<String>,

    #[validate(nested)]
    pub social_links: Option<SocialLinksInput>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = MAX_TAGLINE_LENGTH, message = "Tagline too long"))]
    pub tagline: Option<String>,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        max = MAX_DESCRIPTION_LENGTH,
        message = "Description must be 10-1000 characters"
    ))]
    pub description: Option<String>,

    #[validate(
        length(min = 1, max = MAX_CATEGORIES, message = "Between 1 and 5 categories are required"),
        custom(function = "validate_category_names")
    )]
    pub categories: Option<Vec<String>>,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub logo: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub hero_image: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub website: PatchString,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub video_url: PatchString,

    pub featured: Option<bool>,
    pub status: Option<String>,

    pub is_hiring: Option<bool>,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub career_page_url: PatchString,
    pub is_open_for_bounty: Option<bool>,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub bounty_submission_url: PatchString,
    pub is_open_source: Option<bool>,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub github_url: PatchString,

    #[validate(custom(function = "validate_url_list"))]
    pub images: Option<Vec<String>>,

    #[validate(nested)]
    pub social_links: Option<SocialLinksInput>,
}

// ───── Store commands ───────────────────────────────────────────────

/// Fully normalized create command handed to the store.
#[derive(Debug, Clone)]
pub struct ProjectInsert {
    pub row: ProjectRow,
    pub categories: Vec<String>,
    pub images: Vec<String>,
    pub social_links: Option<SocialLinksInput>,
}

/// Normalized partial update handed to the store.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub logo: PatchString,
    pub hero_image: PatchString,
    pub website: PatchString,
    pub video_url: PatchString,
    pub featured: Option<bool>,
    pub status: Option<ProjectStatus>,
    pub is_hiring: Option<bool>,
    pub career_page_url: PatchString,
    pub is_open_for_bounty: Option<bool>,
    pub bounty_submission_url: PatchString,
    pub is_open_source: Option<bool>,
    pub github_url: PatchString,
    pub categories: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub social_links: Option<SocialLinksInput>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Category names, trimmed and de-duplicated, first occurrence wins.
pub fn normalize_category_names(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

impl From<NewProjectRequest> for ProjectInsert {
    fn from(req: NewProjectRequest) -> Self {
        let now = Utc::now();
        let row = ProjectRow {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            tagline: req.tagline,
            description: req.description,
            logo: blank_to_none(req.logo),
            hero_image: blank_to_none(req.hero_image),
            website: blank_to_none(req.website),
            video_url: blank_to_none(req.video_url),
            featured: req.featured,
            status: req
                .status
                .as_deref()
                .map(ProjectStatus::from_token)
                .unwrap_or_default(),
            is_hiring: req.is_hiring,
            career_page_url: blank_to_none(req.career_page_url),
            is_open_for_bounty: req.is_open_for_bounty,
            bounty_submission_url: blank_to_none(req.bounty_submission_url),
            is_open_source: req.is_open_source,
            github_url: blank_to_none(req.github_url),
            created_at: now,
            updated_at: now,
        };

        ProjectInsert {
            row,
            categories: normalize_category_names(req.categories),
            images: req.images,
            social_links: req.social_links.map(SocialLinksInput::normalized),
        }
    }
}

impl From<UpdateProjectRequest> for ProjectChanges {
    fn from(req: UpdateProjectRequest) -> Self {
        ProjectChanges {
            name: req.name.map(|n| n.trim().to_string()),
            tagline: req.tagline,
            description: req.description,
            logo: req.logo.blank_as_null(),
            hero_image: req.hero_image.blank_as_null(),
            website: req.website.blank_as_null(),
            video_url: req.video_url.blank_as_null(),
            featured: req.featured,
            status: req.status.as_deref().map(ProjectStatus::from_token),
            is_hiring: req.is_hiring,
            career_page_url: req.career_page_url.blank_as_null(),
            is_open_for_bounty: req.is_open_for_bounty,
            bounty_submission_url: req.bounty_submission_url.blank_as_null(),
            is_open_source: req.is_open_source,
            github_url: req.github_url.blank_as_null(),
            categories: req.categories.map(normalize_category_names),
            images: req.images,
            social_links: req.social_links.map(SocialLinksInput::normalized),
        }
    }
}

impl ProjectChanges {
    /// True when this update turns featuring on.
    pub fn features(&self) -> bool {
        self.featured == Some(true)
    }
}

impl ProjectRow {
    /// Applies the supplied scalar fields; relations are handled by the store.
    pub fn apply(&mut self, changes: &ProjectChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(tagline) = &changes.tagline {
            self.tagline = tagline.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        changes.logo.apply_to(&mut self.logo);
        changes.hero_image.apply_to(&mut self.hero_image);
        changes.website.apply_to(&mut self.website);
        changes.video_url.apply_to(&mut self.video_url);
        if let Some(featured) = changes.featured {
            self.featured = featured;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(is_hiring) = changes.is_hiring {
            self.is_hiring = is_hiring;
        }
        changes.career_page_url.apply_to(&mut self.career_page_url);
        if let Some(bounty) = changes.is_open_for_bounty {
            self.is_open_for_bounty = bounty;
        }
        changes.bounty_submission_url.apply_to(&mut self.bounty_submission_url);
        if let Some(open_source) = changes.is_open_source {
            self.is_open_source = open_source;
        }
        changes.github_url.apply_to(&mut self.github_url);
        self.updated_at = Utc::now();
    }
}

// ───── Queries ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectSortField {
    Name,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl ProjectSortField {
    pub fn from_token(token: &str) -> Self {
        match token {
            "name" => ProjectSortField::Name,
            "updatedAt" | "updated_at" => ProjectSortField::UpdatedAt,
            _ => ProjectSortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ProjectSortField::Name => "name",
            ProjectSortField::CreatedAt => "created_at",
            ProjectSortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Raw listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// `?q=` of the search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// `page` below 1 is treated as 1; `limit` is clamped to 1..=100.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;
        PageRequest { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Normalized project filter used by every project listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
    pub sort_by: ProjectSortField,
    pub sort_order: SortOrder,
    pub page: Option<PageRequest>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl From<ProjectQuery> for ProjectFilter {
    fn from(query: ProjectQuery) -> Self {
        ProjectFilter {
            category: non_blank(query.category),
            featured: query.featured,
            status: query.status.as_deref().and_then(ProjectStatus::filter_from_token),
            search: non_blank(query.search),
            sort_by: query
                .sort_by
                .as_deref()
                .map(ProjectSortField::from_token)
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

impl ProjectFilter {
    pub fn featured() -> Self {
        ProjectFilter {
            featured: Some(true),
            ..Default::default()
        }
    }

    pub fn by_category(name: &str) -> Self {
        ProjectFilter {
            category: Some(name.trim().to_string()),
            ..Default::default()
        }
    }

    pub fn search(term: &str) -> Self {
        ProjectFilter {
            search: Some(term.trim().to_string()),
            ..Default::default()
        }
    }

    /// Case-insensitive substring match over name, description and category names.
    pub fn matches_search(&self, row: &ProjectRow, category_names: &[String]) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.to_lowercase();
        row.name.to_lowercase().contains(&term)
            || row.description.to_lowercase().contains(&term)
            || category_names.iter().any(|c| c.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: PageRequest, total: i64) -> Self {
        let limit = page.limit.max(1) as i64;
        Pagination {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}
