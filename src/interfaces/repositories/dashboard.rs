use async_trait::async_trait;

use crate::{
    entities::{
        category::Category,
        dashboard::{CatalogTotals, Dashboard, ProjectSummary},
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxDashboardRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Catalog totals plus the `recent` newest projects and `top` busiest categories.
    async fn dashboard(&self, recent: i64, top: i64) -> Result<Dashboard, AppError>;
}

impl SqlxDashboardRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxDashboardRepo { pool }
    }
}

#[async_trait]
impl DashboardRepository for SqlxDashboardRepo {
    async fn dashboard(&self, recent: i64, top: i64) -> Result<Dashboard, AppError> {
        let (projects, published_projects, featured_projects, categories, videos) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM projects),
                    (SELECT COUNT(*) FROM projects WHERE status = 'PUBLISHED'),
                    (SELECT COUNT(*) FROM projects WHERE featured = TRUE),
                    (SELECT COUNT(*) FROM categories),
                    (SELECT COUNT(*) FROM project_videos)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let recent_projects = sqlx::query_as::<_, ProjectSummary>(
            "SELECT id, name, status, featured, created_at FROM projects ORDER BY created_at DESC, id ASC LIMIT $1",
        )
        .bind(recent)
        .fetch_all(&self.pool)
        .await?;

        let top_categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories ORDER BY project_count DESC, name ASC LIMIT $1",
        )
        .bind(top)
        .fetch_all(&self.pool)
        .await?;

        Ok(Dashboard {
            totals: CatalogTotals {
                projects,
                published_projects,
                featured_projects,
                categories,
                videos,
            },
            recent_projects,
            top_categories,
        })
    }
}
