use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{category::Category, project::ProjectStatus};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTotals {
    pub projects: i64,
    pub published_projects: i64,
    pub featured_projects: i64,
    pub categories: i64,
    pub videos: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub totals: CatalogTotals,
    pub recent_projects: Vec<ProjectSummary>,
    pub top_categories: Vec<Category>,
}
