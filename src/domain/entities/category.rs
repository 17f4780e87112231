use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::validators::validate_not_blank;

const MAX_NAME_LENGTH: u64 = 50;
const MIN_DESCRIPTION_LENGTH: u64 = 10;
const MAX_DESCRIPTION_LENGTH: u64 = 500;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub project_count: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCategoryRequest {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be 1-50 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        max = MAX_DESCRIPTION_LENGTH,
        message = "Description must be 10-500 characters"
    ))]
    pub description: String,

    #[validate(custom(function = "validate_not_blank", message = "Icon is required"))]
    pub icon: String,

    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be 1-50 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        max = MAX_DESCRIPTION_LENGTH,
        message = "Description must be 10-500 characters"
    ))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_not_blank", message = "Icon is required"))]
    pub icon: Option<String>,

    pub featured: Option<bool>,
}

impl UpdateCategoryRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.icon.is_none()
            && self.featured.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CategoryInsert {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub featured: bool,
}

impl From<NewCategoryRequest> for CategoryInsert {
    fn from(req: NewCategoryRequest) -> Self {
        CategoryInsert {
            name: req.name.trim().to_string(),
            description: req.description,
            icon: req.icon,
            featured: req.featured,
        }
    }
}

impl Category {
    pub fn from_insert(insert: &CategoryInsert) -> Self {
        let now = Utc::now();
        Category {
            id: Uuid::new_v4(),
            name: insert.name.clone(),
            description: insert.description.clone(),
            icon: insert.icon.clone(),
            project_count: 0,
            featured: insert.featured,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields only.
    pub fn apply(&mut self, changes: &UpdateCategoryRequest) {
        if let Some(name) = &changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(icon) = &changes.icon {
            self.icon = icon.clone();
        }
        if let Some(featured) = changes.featured {
            self.featured = featured;
        }
        self.updated_at = Utc::now();
    }
}
