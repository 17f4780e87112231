use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    entities::category::{Category, CategoryInsert, UpdateCategoryRequest},
    errors::AppError,
    repositories::sqlx_repo::{conflict_on_unique, SqlxCategoryRepo},
};

pub const DUPLICATE_CATEGORY: &str = "Category with this name already exists";
pub const CATEGORY_IN_USE: &str = "Cannot delete category with existing projects";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Categories ordered by name; `featured_only` keeps featured ones.
    async fn list_categories(&self, featured_only: bool) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, id: &Uuid) -> Result<Category, AppError>;
    async fn create_category(&self, category: &CategoryInsert) -> Result<Category, AppError>;
    async fn update_category(&self, id: &Uuid, changes: &UpdateCategoryRequest) -> Result<Category, AppError>;
    /// Fails with `InvalidState` while any project is attached.
    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError>;
}

impl SqlxCategoryRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxCategoryRepo { pool }
    }
}

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".into())
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepo {
    async fn list_categories(&self, featured_only: bool) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE ($1::boolean IS FALSE OR featured = TRUE)
            ORDER BY name ASC
            "#,
        )
        .bind(featured_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn get_category(&self, id: &Uuid) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(category_not_found)
    }

    async fn create_category(&self, category: &CategoryInsert) -> Result<Category, AppError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, description, icon, project_count, featured)
            VALUES ($1, $2, $3, $4, 0, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(category.featured)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_CATEGORY))?;

        tracing::info!(category_id = %created.id, name = %created.name, "Category created");
        Ok(created)
    }

    async fn update_category(&self, id: &Uuid, changes: &UpdateCategoryRequest) -> Result<Category, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut current = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(category_not_found)?;

        current.apply(changes);

        let updated = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $1,
                description = $2,
                icon = $3,
                featured = $4,
                updated_at = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&current.name)
        .bind(&current.description)
        .bind(&current.icon)
        .bind(current.featured)
        .bind(current.updated_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_CATEGORY))?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock conflicts with the key-share locks taken by new memberships.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(category_not_found)?;

        let attached: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project_categories WHERE category_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if attached > 0 {
            tracing::warn!(category_id = %id, attached, "Refusing to delete category with projects");
            return Err(AppError::InvalidState(CATEGORY_IN_USE.into()));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
