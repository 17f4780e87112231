use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::video::{ProjectVideo, UpdateVideoRequest, VideoFilter, VideoResponse},
    errors::AppError,
    repositories::sqlx_repo::{like_pattern, SqlxVideoRepo},
};

pub const DUPLICATE_PLAYBACK_ID: &str = "Video with this playback ID already exists";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn find_videos(&self, filter: &VideoFilter) -> Result<Vec<VideoResponse>, AppError>;
    async fn count_videos(&self, filter: &VideoFilter) -> Result<i64, AppError>;
    async fn get_video(&self, id: &Uuid) -> Result<VideoResponse, AppError>;
    /// Fails with NotFound when the owning project is gone.
    async fn create_video(&self, video: &ProjectVideo) -> Result<VideoResponse, AppError>;
    async fn update_video(&self, id: &Uuid, changes: &UpdateVideoRequest) -> Result<VideoResponse, AppError>;
    async fn delete_video(&self, id: &Uuid) -> Result<(), AppError>;
}

impl SqlxVideoRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxVideoRepo { pool }
    }
}

const VIDEO_SELECT: &str = r#"
    SELECT
        v.id, v.project_id, p.name AS project_name, v.title, v.description,
        v.playback_id, v.thumbnail, v.featured,
        ARRAY(
            SELECT c.name FROM project_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.project_id = v.project_id
            ORDER BY c.name
        ) AS categories,
        v.created_at, v.updated_at
    FROM project_videos v
    JOIN projects p ON p.id = v.project_id
"#;

fn video_not_found() -> AppError {
    AppError::NotFound("Video not found".into())
}

fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(DUPLICATE_PLAYBACK_ID.into());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound("Project not found".into());
        }
    }
    AppError::from(err)
}

fn push_video_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &VideoFilter) {
    builder.push(" WHERE TRUE");

    if let Some(featured) = filter.featured {
        builder.push(" AND v.featured = ").push_bind(featured);
    }
    if let Some(project_id) = filter.project_id {
        builder.push(" AND v.project_id = ").push_bind(project_id);
    }
    if let Some(category) = &filter.category {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM project_categories pc \
                 JOIN categories c ON c.id = pc.category_id \
                 WHERE pc.project_id = v.project_id AND c.name = ",
            )
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (v.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR v.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR v.playback_id ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

async fn load_video(conn: &mut PgConnection, id: &Uuid) -> Result<VideoResponse, AppError> {
    let mut builder = QueryBuilder::<Postgres>::new(VIDEO_SELECT);
    builder.push(" WHERE v.id = ").push_bind(*id);

    builder
        .build_query_as::<VideoResponse>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(video_not_found)
}

#[async_trait]
impl VideoRepository for SqlxVideoRepo {
    async fn find_videos(&self, filter: &VideoFilter) -> Result<Vec<VideoResponse>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(VIDEO_SELECT);
        push_video_filters(&mut builder, filter);
        builder.push(format!(
            " ORDER BY v.{} {}, v.id ASC",
            filter.sort_by.column(),
            filter.sort_order.keyword()
        ));
        if let Some(page) = filter.page {
            builder.push(" LIMIT ").push_bind(page.limit as i64);
            builder.push(" OFFSET ").push_bind(page.offset());
        }

        let videos = builder
            .build_query_as::<VideoResponse>()
            .fetch_all(&self.pool)
            .await?;
        Ok(videos)
    }

    async fn count_videos(&self, filter: &VideoFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM project_videos v JOIN projects p ON p.id = v.project_id",
        );
        push_video_filters(&mut builder, filter);

        let total: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn get_video(&self, id: &Uuid) -> Result<VideoResponse, AppError> {
        let mut conn = self.pool.acquire().await?;
        load_video(&mut conn, id).await
    }

    async fn create_video(&self, video: &ProjectVideo) -> Result<VideoResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO project_videos (
                id, project_id, title, description, playback_id, thumbnail, featured, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(video.id)
        .bind(video.project_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.playback_id)
        .bind(&video.thumbnail)
        .bind(video.featured)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let created = load_video(&mut tx, &video.id).await?;
        tx.commit().await?;

        tracing::info!(video_id = %created.id, project_id = %created.project_id, "Video created");
        Ok(created)
    }

    async fn update_video(&self, id: &Uuid, changes: &UpdateVideoRequest) -> Result<VideoResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut video = sqlx::query_as::<_, ProjectVideo>("SELECT * FROM project_videos WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(video_not_found)?;

        video.apply(changes);

        sqlx::query(
            r#"
            UPDATE project_videos SET
                title = $1, description = $2, playback_id = $3,
                thumbnail = $4, featured = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.playback_id)
        .bind(&video.thumbnail)
        .bind(video.featured)
        .bind(video.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let updated = load_video(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_video(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM project_videos WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(video_not_found)?;

        tracing::info!(video_id = %id, "Video deleted");
        Ok(())
    }
}
