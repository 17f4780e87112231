use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::timeout,
};
use uuid::Uuid;

use crate::{
    constants::FEATURED_PROJECT_CAP,
    entities::{
        category::{Category, CategoryInsert, UpdateCategoryRequest},
        dashboard::{CatalogTotals, Dashboard, ProjectSummary},
        project::{
            Project, ProjectChanges, ProjectFilter, ProjectImage, ProjectInsert, ProjectRow,
            ProjectSortField, ProjectStatus, SocialLinks, SortOrder,
        },
        user::{User, UserInsert},
        video::{ProjectVideo, UpdateVideoRequest, VideoFilter, VideoResponse, VideoSortField},
    },
    errors::AppError,
    repositories::{
        category::{CategoryRepository, CATEGORY_IN_USE, DUPLICATE_CATEGORY},
        dashboard::DashboardRepository,
        project::{ProjectRepository, FEATURED_CAP_REACHED},
        user::UserRepository,
        video::{VideoRepository, DUPLICATE_PLAYBACK_ID},
    },
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct MemoryTables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    projects: HashMap<Uuid, ProjectRow>,
    /// (project_id, category_id)
    memberships: HashSet<(Uuid, Uuid)>,
    social_links: HashMap<Uuid, SocialLinks>,
    images: Vec<ProjectImage>,
    videos: HashMap<Uuid, ProjectVideo>,
}

/// Catalog store held in process memory.
///
/// Every mutation runs under the single write lock, so each operation is
/// serializable with respect to every other one. Lock acquisition is bounded
/// by `lock_timeout` and surfaces as a `StoreError`.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<MemoryTables>>,
    lock_timeout: Duration,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        InMemoryStore {
            inner: Arc::new(RwLock::new(MemoryTables::default())),
            lock_timeout,
        }
    }

    async fn read(&self) -> Result<RwLockReadGuard<'_, MemoryTables>, AppError> {
        timeout(self.lock_timeout, self.inner.read())
            .await
            .map_err(|_| AppError::StoreError("Timed out waiting for catalog read lock".into()))
    }

    async fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryTables>, AppError> {
        timeout(self.lock_timeout, self.inner.write())
            .await
            .map_err(|_| AppError::StoreError("Timed out waiting for catalog write lock".into()))
    }
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

impl MemoryTables {
    fn category_names(&self, project_id: Uuid) -> Vec<String> {
        let mut names: Vec<String> = self
            .memberships
            .iter()
            .filter(|(p, _)| *p == project_id)
            .filter_map(|(_, c)| self.categories.get(c).map(|c| c.name.clone()))
            .collect();
        names.sort();
        names
    }

    fn category_ids(&self, project_id: Uuid) -> Vec<Uuid> {
        self.memberships
            .iter()
            .filter(|(p, _)| *p == project_id)
            .map(|(_, c)| *c)
            .collect()
    }

    fn assemble(&self, row: &ProjectRow) -> Project {
        let mut images: Vec<ProjectImage> = self
            .images
            .iter()
            .filter(|i| i.project_id == row.id)
            .cloned()
            .collect();
        images.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.created_at.cmp(&b.created_at)));

        let mut videos: Vec<ProjectVideo> = self
            .videos
            .values()
            .filter(|v| v.project_id == row.id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Project::assemble(
            row.clone(),
            self.category_names(row.id),
            images,
            videos,
            self.social_links.get(&row.id).cloned(),
        )
    }

    fn recount(&mut self, category_ids: &[Uuid]) {
        for id in category_ids {
            let count = self.memberships.iter().filter(|(_, c)| c == id).count() as i32;
            if let Some(category) = self.categories.get_mut(id) {
                category.project_count = count;
                category.updated_at = chrono::Utc::now();
            }
        }
    }

    fn featured_count(&self, exclude: Option<Uuid>) -> i64 {
        self.projects
            .values()
            .filter(|p| p.featured && Some(p.id) != exclude)
            .count() as i64
    }

    fn ensure_featured_capacity(&self, exclude: Option<Uuid>) -> Result<(), AppError> {
        let featured = self.featured_count(exclude);
        if featured >= FEATURED_PROJECT_CAP {
            tracing::warn!(featured, "Featured project cap reached");
            return Err(AppError::InvalidState(FEATURED_CAP_REACHED.into()));
        }
        Ok(())
    }

    fn resolve_categories(&self, names: &[String]) -> Result<Vec<Uuid>, AppError> {
        names
            .iter()
            .map(|name| {
                self.categories
                    .values()
                    .find(|c| &c.name == name)
                    .map(|c| c.id)
                    .ok_or_else(|| AppError::NotFound(format!("Category not found: {}", name)))
            })
            .collect()
    }

    fn project_matches(&self, filter: &ProjectFilter, row: &ProjectRow) -> bool {
        if filter.featured.is_some_and(|f| row.featured != f) {
            return false;
        }
        if filter.status.is_some_and(|s| row.status != s) {
            return false;
        }
        let names = self.category_names(row.id);
        if let Some(category) = &filter.category {
            if !names.iter().any(|n| n == category) {
                return false;
            }
        }
        filter.matches_search(row, &names)
    }

    fn filtered_projects(&self, filter: &ProjectFilter) -> Vec<&ProjectRow> {
        self.projects
            .values()
            .filter(|row| self.project_matches(filter, row))
            .collect()
    }

    fn video_response(&self, video: &ProjectVideo) -> Option<VideoResponse> {
        let project = self.projects.get(&video.project_id)?;
        Some(VideoResponse::enrich(
            video.clone(),
            project.name.clone(),
            self.category_names(project.id),
        ))
    }

    fn filtered_videos(&self, filter: &VideoFilter) -> Vec<VideoResponse> {
        self.videos
            .values()
            .filter(|v| filter.featured.is_none_or(|f| v.featured == f))
            .filter(|v| filter.project_id.is_none_or(|p| v.project_id == p))
            .filter_map(|v| {
                let project_name = &self.projects.get(&v.project_id)?.name;
                if !filter.matches_search(v, project_name) {
                    return None;
                }
                self.video_response(v)
            })
            .filter(|v| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| v.categories.iter().any(|n| n == c))
            })
            .collect()
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn compare_projects(a: &ProjectRow, b: &ProjectRow, filter: &ProjectFilter) -> Ordering {
    let primary = match filter.sort_by {
        ProjectSortField::Name => a.name.cmp(&b.name),
        ProjectSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ProjectSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    directed(primary, filter.sort_order).then(a.id.cmp(&b.id))
}

fn compare_videos(a: &VideoResponse, b: &VideoResponse, filter: &VideoFilter) -> Ordering {
    let primary = match filter.sort_by {
        VideoSortField::Title => a.title.cmp(&b.title),
        VideoSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    directed(primary, filter.sort_order).then(a.id.cmp(&b.id))
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list_categories(&self, featured_only: bool) -> Result<Vec<Category>, AppError> {
        let tables = self.read().await?;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| !featured_only || c.featured)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: &Uuid) -> Result<Category, AppError> {
        let tables = self.read().await?;
        tables.categories.get(id).cloned().ok_or_else(|| not_found("Category"))
    }

    async fn create_category(&self, category: &CategoryInsert) -> Result<Category, AppError> {
        let mut tables = self.write().await?;
        if tables.categories.values().any(|c| c.name == category.name) {
            return Err(AppError::Conflict(DUPLICATE_CATEGORY.into()));
        }
        let created = Category::from_insert(category);
        tables.categories.insert(created.id, created.clone());

        tracing::info!(category_id = %created.id, name = %created.name, "Category created");
        Ok(created)
    }

    async fn update_category(&self, id: &Uuid, changes: &UpdateCategoryRequest) -> Result<Category, AppError> {
        let mut tables = self.write().await?;
        let mut category = tables.categories.get(id).cloned().ok_or_else(|| not_found("Category"))?;
        category.apply(changes);

        if tables.categories.values().any(|c| c.id != *id && c.name == category.name) {
            return Err(AppError::Conflict(DUPLICATE_CATEGORY.into()));
        }
        tables.categories.insert(*id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.write().await?;
        if !tables.categories.contains_key(id) {
            return Err(not_found("Category"));
        }
        let attached = tables.memberships.iter().filter(|(_, c)| c == id).count();
        if attached > 0 {
            tracing::warn!(category_id = %id, attached, "Refusing to delete category with projects");
            return Err(AppError::InvalidState(CATEGORY_IN_USE.into()));
        }
        tables.categories.remove(id);

        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn find_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        let tables = self.read().await?;
        let mut rows = tables.filtered_projects(filter);
        rows.sort_by(|a, b| compare_projects(a, b, filter));

        let (skip, take) = match filter.page {
            Some(page) => (page.offset() as usize, page.limit as usize),
            None => (0, usize::MAX),
        };
        Ok(rows
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| tables.assemble(row))
            .collect())
    }

    async fn count_projects(&self, filter: &ProjectFilter) -> Result<i64, AppError> {
        let tables = self.read().await?;
        Ok(tables.filtered_projects(filter).len() as i64)
    }

    async fn get_project(&self, id: &Uuid) -> Result<Project, AppError> {
        let tables = self.read().await?;
        let row = tables.projects.get(id).ok_or_else(|| not_found("Project"))?;
        Ok(tables.assemble(row))
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError> {
        let mut tables = self.write().await?;
        let row = project.row.clone();

        if row.featured {
            tables.ensure_featured_capacity(None)?;
        }
        let category_ids = tables.resolve_categories(&project.categories)?;

        for category_id in &category_ids {
            tables.memberships.insert((row.id, *category_id));
        }
        if let Some(patch) = &project.social_links {
            let links = SocialLinks::merged(row.id, None, patch);
            tables.social_links.insert(row.id, links);
        }
        tables.images.extend(ProjectImage::from_urls(row.id, &project.images));
        tables.projects.insert(row.id, row.clone());
        tables.recount(&category_ids);

        tracing::info!(project_id = %row.id, featured = row.featured, "Project created");
        Ok(tables.assemble(&row))
    }

    async fn update_project(&self, id: &Uuid, changes: &ProjectChanges) -> Result<Project, AppError> {
        let mut tables = self.write().await?;
        let mut row = tables.projects.get(id).cloned().ok_or_else(|| not_found("Project"))?;

        if changes.features() && !row.featured {
            tables.ensure_featured_capacity(Some(*id))?;
        }
        // Resolve before touching anything so a missing category leaves the project intact.
        let new_category_ids = match &changes.categories {
            Some(names) => Some(tables.resolve_categories(names)?),
            None => None,
        };

        row.apply(changes);
        tables.projects.insert(*id, row.clone());

        if let Some(new_ids) = new_category_ids {
            let old_ids = tables.category_ids(*id);
            tables.memberships.retain(|(p, c)| *p != *id || new_ids.contains(c));
            for category_id in &new_ids {
                tables.memberships.insert((*id, *category_id));
            }
            let touched: Vec<Uuid> = old_ids
                .into_iter()
                .chain(new_ids)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            tables.recount(&touched);
        }

        if let Some(urls) = &changes.images {
            tables.images.retain(|i| i.project_id != *id);
            tables.images.extend(ProjectImage::from_urls(*id, urls));
        }

        if let Some(patch) = &changes.social_links {
            let existing = tables.social_links.remove(id);
            let links = SocialLinks::merged(*id, existing, patch);
            tables.social_links.insert(*id, links);
        }

        tracing::info!(project_id = %id, "Project updated");
        Ok(tables.assemble(&row))
    }

    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.write().await?;
        if tables.projects.remove(id).is_none() {
            return Err(not_found("Project"));
        }

        let category_ids = tables.category_ids(*id);
        tables.memberships.retain(|(p, _)| p != id);
        tables.images.retain(|i| i.project_id != *id);
        tables.videos.retain(|_, v| v.project_id != *id);
        tables.social_links.remove(id);
        tables.recount(&category_ids);

        tracing::info!(project_id = %id, categories = category_ids.len(), "Project deleted");
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for InMemoryStore {
    async fn find_videos(&self, filter: &VideoFilter) -> Result<Vec<VideoResponse>, AppError> {
        let tables = self.read().await?;
        let mut videos = tables.filtered_videos(filter);
        videos.sort_by(|a, b| compare_videos(a, b, filter));

        Ok(match filter.page {
            Some(page) => videos
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
            None => videos,
        })
    }

    async fn count_videos(&self, filter: &VideoFilter) -> Result<i64, AppError> {
        let tables = self.read().await?;
        Ok(tables.filtered_videos(filter).len() as i64)
    }

    async fn get_video(&self, id: &Uuid) -> Result<VideoResponse, AppError> {
        let tables = self.read().await?;
        tables
            .videos
            .get(id)
            .and_then(|v| tables.video_response(v))
            .ok_or_else(|| not_found("Video"))
    }

    async fn create_video(&self, video: &ProjectVideo) -> Result<VideoResponse, AppError> {
        let mut tables = self.write().await?;
        if !tables.projects.contains_key(&video.project_id) {
            return Err(not_found("Project"));
        }
        if tables.videos.values().any(|v| v.playback_id == video.playback_id) {
            return Err(AppError::Conflict(DUPLICATE_PLAYBACK_ID.into()));
        }
        tables.videos.insert(video.id, video.clone());

        tracing::info!(video_id = %video.id, project_id = %video.project_id, "Video created");
        tables.video_response(video).ok_or_else(|| not_found("Project"))
    }

    async fn update_video(&self, id: &Uuid, changes: &UpdateVideoRequest) -> Result<VideoResponse, AppError> {
        let mut tables = self.write().await?;
        let mut video = tables.videos.get(id).cloned().ok_or_else(|| not_found("Video"))?;
        video.apply(changes);

        if tables
            .videos
            .values()
            .any(|v| v.id != *id && v.playback_id == video.playback_id)
        {
            return Err(AppError::Conflict(DUPLICATE_PLAYBACK_ID.into()));
        }
        tables.videos.insert(*id, video.clone());
        tables.video_response(&video).ok_or_else(|| not_found("Video"))
    }

    async fn delete_video(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.write().await?;
        tables.videos.remove(id).ok_or_else(|| not_found("Video"))?;

        tracing::info!(video_id = %id, "Video deleted");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn check_connection(&self) -> Result<(), AppError> {
        self.read().await.map(|_| ())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.read().await?;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let tables = self.read().await?;
        Ok(tables.users.get(id).cloned())
    }

    async fn create_user(&self, user: &UserInsert) -> Result<User, AppError> {
        let mut tables = self.write().await?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("User with this username already exists".into()));
        }
        let created = UserInsert {
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.clone(),
        }
        .into_user();
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl DashboardRepository for InMemoryStore {
    async fn dashboard(&self, recent: i64, top: i64) -> Result<Dashboard, AppError> {
        let tables = self.read().await?;

        let totals = CatalogTotals {
            projects: tables.projects.len() as i64,
            published_projects: tables
                .projects
                .values()
                .filter(|p| p.status == ProjectStatus::Published)
                .count() as i64,
            featured_projects: tables.featured_count(None),
            categories: tables.categories.len() as i64,
            videos: tables.videos.len() as i64,
        };

        let mut rows: Vec<&ProjectRow> = tables.projects.values().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let recent_projects = rows
            .into_iter()
            .take(recent.max(0) as usize)
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name.clone(),
                status: p.status,
                featured: p.featured,
                created_at: p.created_at,
            })
            .collect();

        let mut top_categories: Vec<Category> = tables.categories.values().cloned().collect();
        top_categories.sort_by(|a, b| b.project_count.cmp(&a.project_count).then(a.name.cmp(&b.name)));
        top_categories.truncate(top.max(0) as usize);

        Ok(Dashboard {
            totals,
            recent_projects,
            top_categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        category::NewCategoryRequest,
        project::{NewProjectRequest, ProjectFilter},
    };

    async fn seed_category(store: &InMemoryStore, name: &str) -> Category {
        store
            .create_category(&CategoryInsert::from(NewCategoryRequest {
                name: name.into(),
                description: "A category for testing".into(),
                icon: "icon".into(),
                featured: false,
            }))
            .await
            .unwrap()
    }

    fn project(name: &str, categories: &[&str], featured: bool) -> ProjectInsert {
        ProjectInsert::from(NewProjectRequest {
            name: name.into(),
            tagline: String::new(),
            description: "A project used in store tests".into(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            logo: None,
            hero_image: None,
            website: None,
            video_url: None,
            featured,
            status: None,
            is_hiring: false,
            career_page_url: None,
            is_open_for_bounty: false,
            bounty_submission_url: None,
            is_open_source: false,
            github_url: None,
            images: vec![],
            social_links: None,
        })
    }

    #[tokio::test]
    async fn membership_changes_keep_counts_in_sync() {
        let store = InMemoryStore::new();
        let defi = seed_category(&store, "DeFi").await;
        let nft = seed_category(&store, "NFT").await;

        let created = store.create_project(&project("Aqua", &["DeFi"], false)).await.unwrap();
        assert_eq!(created.categories, vec!["DeFi".to_string()]);
        assert_eq!(store.get_category(&defi.id).await.unwrap().project_count, 1);

        let changes = ProjectChanges {
            categories: Some(vec!["NFT".into()]),
            ..Default::default()
        };
        store.update_project(&created.id, &changes).await.unwrap();
        assert_eq!(store.get_category(&defi.id).await.unwrap().project_count, 0);
        assert_eq!(store.get_category(&nft.id).await.unwrap().project_count, 1);

        store.delete_project(&created.id).await.unwrap();
        assert_eq!(store.get_category(&nft.id).await.unwrap().project_count, 0);
    }

    #[tokio::test]
    async fn unknown_category_rolls_back_create() {
        let store = InMemoryStore::new();
        seed_category(&store, "DeFi").await;

        let err = store
            .create_project(&project("Aqua", &["DeFi", "Missing"], false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Category not found: Missing"));
        assert_eq!(store.count_projects(&ProjectFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn featured_cap_is_enforced() {
        let store = InMemoryStore::new();
        seed_category(&store, "DeFi").await;
        for i in 0..3 {
            store
                .create_project(&project(&format!("P{}", i), &["DeFi"], true))
                .await
                .unwrap();
        }

        let err = store.create_project(&project("P3", &["DeFi"], true)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(store.count_projects(&ProjectFilter::featured()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn category_with_projects_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let defi = seed_category(&store, "DeFi").await;
        store.create_project(&project("Aqua", &["DeFi"], false)).await.unwrap();

        let err = store.delete_category(&defi.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(msg) if msg == CATEGORY_IN_USE));
    }

    #[tokio::test]
    async fn lock_timeout_surfaces_as_store_error() {
        let store = InMemoryStore::with_lock_timeout(Duration::from_millis(20));
        let _held = store.inner.write().await;

        let err = store.list_categories(false).await.unwrap_err();
        assert!(matches!(err, AppError::StoreError(_)));
    }
}
