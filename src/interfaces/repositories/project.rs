use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    constants::{FEATURED_LOCK_KEY, FEATURED_PROJECT_CAP},
    entities::{
        project::{
            Project, ProjectChanges, ProjectFilter, ProjectImage, ProjectInsert, ProjectRow,
            SocialLinks, SocialLinksInput,
        },
        video::ProjectVideo,
    },
    errors::AppError,
    repositories::sqlx_repo::{like_pattern, read_snapshot, recount_categories, SqlxProjectRepo},
};

pub const FEATURED_CAP_REACHED: &str =
    "Maximum of 3 featured projects allowed. Unfeature an existing project first.";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError>;
    /// Total matching `filter`, ignoring its page.
    async fn count_projects(&self, filter: &ProjectFilter) -> Result<i64, AppError>;
    async fn get_project(&self, id: &Uuid) -> Result<Project, AppError>;
    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError>;
    async fn update_project(&self, id: &Uuid, changes: &ProjectChanges) -> Result<Project, AppError>;
    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError>;
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxProjectRepo { pool }
    }
}

fn project_not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

fn push_project_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
    builder.push(" WHERE TRUE");

    if let Some(category) = &filter.category {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM project_categories pc \
                 JOIN categories c ON c.id = pc.category_id \
                 WHERE pc.project_id = p.id AND c.name = ",
            )
            .push_bind(category.clone())
            .push(")");
    }

    if let Some(featured) = filter.featured {
        builder.push(" AND p.featured = ").push_bind(featured);
    }

    if let Some(status) = filter.status {
        builder.push(" AND p.status = ").push_bind(status);
    }

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(
                " OR EXISTS (SELECT 1 FROM project_categories pc \
                 JOIN categories c ON c.id = pc.category_id \
                 WHERE pc.project_id = p.id AND c.name ILIKE ",
            )
            .push_bind(pattern)
            .push("))");
    }
}

/// Loads relations for `rows` in four batched queries, preserving row order.
async fn hydrate_projects(conn: &mut PgConnection, rows: Vec<ProjectRow>) -> Result<Vec<Project>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let memberships = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT pc.project_id, c.name
        FROM project_categories pc
        JOIN categories c ON c.id = pc.category_id
        WHERE pc.project_id = ANY($1)
        ORDER BY c.name ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let images = sqlx::query_as::<_, ProjectImage>(
        "SELECT * FROM project_images WHERE project_id = ANY($1) ORDER BY sort_order ASC, created_at ASC",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let videos = sqlx::query_as::<_, ProjectVideo>(
        "SELECT * FROM project_videos WHERE project_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let links = sqlx::query_as::<_, SocialLinks>("SELECT * FROM social_links WHERE project_id = ANY($1)")
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

    let mut categories_by_project: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (project_id, name) in memberships {
        categories_by_project.entry(project_id).or_default().push(name);
    }
    let mut images_by_project: HashMap<Uuid, Vec<ProjectImage>> = HashMap::new();
    for image in images {
        images_by_project.entry(image.project_id).or_default().push(image);
    }
    let mut videos_by_project: HashMap<Uuid, Vec<ProjectVideo>> = HashMap::new();
    for video in videos {
        videos_by_project.entry(video.project_id).or_default().push(video);
    }
    let mut links_by_project: HashMap<Uuid, SocialLinks> =
        links.into_iter().map(|l| (l.project_id, l)).collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            Project::assemble(
                row,
                categories_by_project.remove(&id).unwrap_or_default(),
                images_by_project.remove(&id).unwrap_or_default(),
                videos_by_project.remove(&id).unwrap_or_default(),
                links_by_project.remove(&id),
            )
        })
        .collect())
}

async fn load_project(conn: &mut PgConnection, id: &Uuid) -> Result<Project, AppError> {
    let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(project_not_found)?;

    hydrate_projects(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(project_not_found)
}

/// Serializes featured-cap checks across transactions and enforces the cap.
async fn ensure_featured_capacity(conn: &mut PgConnection, exclude: Option<Uuid>) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(FEATURED_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    let featured: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM projects WHERE featured = TRUE AND ($1::uuid IS NULL OR id <> $1)",
    )
    .bind(exclude)
    .fetch_one(&mut *conn)
    .await?;

    if featured >= FEATURED_PROJECT_CAP {
        tracing::warn!(featured, "Featured project cap reached");
        return Err(AppError::InvalidState(FEATURED_CAP_REACHED.into()));
    }
    Ok(())
}

/// Resolves category names to ids; every name must exist.
async fn resolve_categories(conn: &mut PgConnection, names: &[String]) -> Result<Vec<Uuid>, AppError> {
    let found = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM categories WHERE name = ANY($1)")
        .bind(names)
        .fetch_all(&mut *conn)
        .await?;

    if let Some(missing) = names.iter().find(|n| !found.iter().any(|(_, name)| name == *n)) {
        return Err(AppError::NotFound(format!("Category not found: {}", missing)));
    }

    Ok(found.into_iter().map(|(id, _)| id).collect())
}

async fn insert_images(conn: &mut PgConnection, project_id: Uuid, urls: &[String]) -> Result<(), AppError> {
    let images = ProjectImage::from_urls(project_id, urls);
    if images.is_empty() {
        return Ok(());
    }

    let mut builder =
        QueryBuilder::<Postgres>::new("INSERT INTO project_images (id, project_id, url, alt, sort_order, created_at) ");
    builder.push_values(images, |mut b, image| {
        b.push_bind(image.id)
            .push_bind(image.project_id)
            .push_bind(image.url)
            .push_bind(image.alt)
            .push_bind(image.sort_order)
            .push_bind(image.created_at);
    });
    builder.build().execute(&mut *conn).await?;
    Ok(())
}

async fn upsert_social_links(
    conn: &mut PgConnection,
    project_id: Uuid,
    patch: &SocialLinksInput,
) -> Result<(), AppError> {
    let existing = sqlx::query_as::<_, SocialLinks>("SELECT * FROM social_links WHERE project_id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(&mut *conn)
        .await?;

    let links = SocialLinks::merged(project_id, existing, patch);

    sqlx::query(
        r#"
        INSERT INTO social_links (project_id, website, github, twitter, discord, telegram, medium, youtube)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (project_id) DO UPDATE SET
            website = EXCLUDED.website,
            github = EXCLUDED.github,
            twitter = EXCLUDED.twitter,
            discord = EXCLUDED.discord,
            telegram = EXCLUDED.telegram,
            medium = EXCLUDED.medium,
            youtube = EXCLUDED.youtube
        "#,
    )
    .bind(project_id)
    .bind(&links.website)
    .bind(&links.github)
    .bind(&links.twitter)
    .bind(&links.discord)
    .bind(&links.telegram)
    .bind(&links.medium)
    .bind(&links.youtube)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn link_categories(conn: &mut PgConnection, project_id: Uuid, category_ids: &[Uuid]) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO project_categories (project_id, category_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(category_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn find_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT p.* FROM projects p");
        push_project_filters(&mut builder, filter);
        builder.push(format!(
            " ORDER BY p.{} {}, p.id ASC",
            filter.sort_by.column(),
            filter.sort_order.keyword()
        ));
        if let Some(page) = filter.page {
            builder.push(" LIMIT ").push_bind(page.limit as i64);
            builder.push(" OFFSET ").push_bind(page.offset());
        }

        let mut tx = read_snapshot(&self.pool).await?;
        let rows = builder.build_query_as::<ProjectRow>().fetch_all(&mut *tx).await?;
        let projects = hydrate_projects(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(projects)
    }

    async fn count_projects(&self, filter: &ProjectFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects p");
        push_project_filters(&mut builder, filter);

        let total: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn get_project(&self, id: &Uuid) -> Result<Project, AppError> {
        let mut tx = read_snapshot(&self.pool).await?;
        let project = load_project(&mut tx, id).await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError> {
        let row = &project.row;
        let mut tx = self.pool.begin().await?;

        if row.featured {
            ensure_featured_capacity(&mut tx, None).await?;
        }
        let category_ids = resolve_categories(&mut tx, &project.categories).await?;

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, name, tagline, description, logo, hero_image, website, video_url,
                featured, status, is_hiring, career_page_url, is_open_for_bounty,
                bounty_submission_url, is_open_source, github_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.tagline)
        .bind(&row.description)
        .bind(&row.logo)
        .bind(&row.hero_image)
        .bind(&row.website)
        .bind(&row.video_url)
        .bind(row.featured)
        .bind(row.status)
        .bind(row.is_hiring)
        .bind(&row.career_page_url)
        .bind(row.is_open_for_bounty)
        .bind(&row.bounty_submission_url)
        .bind(row.is_open_source)
        .bind(&row.github_url)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        link_categories(&mut tx, row.id, &category_ids).await?;
        if let Some(links) = &project.social_links {
            upsert_social_links(&mut tx, row.id, links).await?;
        }
        insert_images(&mut tx, row.id, &project.images).await?;
        recount_categories(&mut tx, &category_ids).await?;

        let created = load_project(&mut tx, &row.id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %created.id, featured = created.featured, "Project created");
        Ok(created)
    }

    async fn update_project(&self, id: &Uuid, changes: &ProjectChanges) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(project_not_found)?;

        if changes.features() && !row.featured {
            ensure_featured_capacity(&mut tx, Some(*id)).await?;
        }

        row.apply(changes);

        sqlx::query(
            r#"
            UPDATE projects SET
                name = $1, tagline = $2, description = $3, logo = $4, hero_image = $5,
                website = $6, video_url = $7, featured = $8, status = $9, is_hiring = $10,
                career_page_url = $11, is_open_for_bounty = $12, bounty_submission_url = $13,
                is_open_source = $14, github_url = $15, updated_at = $16
            WHERE id = $17
            "#,
        )
        .bind(&row.name)
        .bind(&row.tagline)
        .bind(&row.description)
        .bind(&row.logo)
        .bind(&row.hero_image)
        .bind(&row.website)
        .bind(&row.video_url)
        .bind(row.featured)
        .bind(row.status)
        .bind(row.is_hiring)
        .bind(&row.career_page_url)
        .bind(row.is_open_for_bounty)
        .bind(&row.bounty_submission_url)
        .bind(row.is_open_source)
        .bind(&row.github_url)
        .bind(row.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(names) = &changes.categories {
            let new_ids = resolve_categories(&mut tx, names).await?;
            let old_ids: Vec<Uuid> =
                sqlx::query_scalar("SELECT category_id FROM project_categories WHERE project_id = $1")
                    .bind(id)
                    .fetch_all(&mut *tx)
                    .await?;

            sqlx::query("DELETE FROM project_categories WHERE project_id = $1 AND NOT (category_id = ANY($2))")
                .bind(id)
                .bind(&new_ids)
                .execute(&mut *tx)
                .await?;
            link_categories(&mut tx, *id, &new_ids).await?;

            let touched: Vec<Uuid> = old_ids
                .into_iter()
                .chain(new_ids)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            recount_categories(&mut tx, &touched).await?;
        }

        if let Some(urls) = &changes.images {
            sqlx::query("DELETE FROM project_images WHERE project_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_images(&mut tx, *id, urls).await?;
        }

        if let Some(links) = &changes.social_links {
            upsert_social_links(&mut tx, *id, links).await?;
        }

        let updated = load_project(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %id, "Project updated");
        Ok(updated)
    }

    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(project_not_found)?;

        let category_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT category_id FROM project_categories WHERE project_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        // Joins, images, videos and social links cascade.
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        recount_categories(&mut tx, &category_ids).await?;
        tx.commit().await?;

        tracing::info!(project_id = %id, categories = category_ids.len(), "Project deleted");
        Ok(())
    }
}
