use std::sync::Arc;

use sqlx::PgPool;

use crate::repositories::{
    category::CategoryRepository,
    dashboard::DashboardRepository,
    memory::InMemoryStore,
    project::ProjectRepository,
    sqlx_repo::{SqlxCategoryRepo, SqlxDashboardRepo, SqlxProjectRepo, SqlxUserRepo, SqlxVideoRepo},
    user::UserRepository,
    video::VideoRepository,
};

/// One handle per repository trait, all backed by the same store.
#[derive(Clone)]
pub struct SharedRepositories {
    pub user_repo: Arc<dyn UserRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub video_repo: Arc<dyn VideoRepository>,
    pub dashboard_repo: Arc<dyn DashboardRepository>,
}

impl SharedRepositories {
    pub fn postgres(pool: PgPool) -> Self {
        SharedRepositories {
            user_repo: Arc::new(SqlxUserRepo::new(pool.clone())),
            category_repo: Arc::new(SqlxCategoryRepo::new(pool.clone())),
            project_repo: Arc::new(SqlxProjectRepo::new(pool.clone())),
            video_repo: Arc::new(SqlxVideoRepo::new(pool.clone())),
            dashboard_repo: Arc::new(SqlxDashboardRepo::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        SharedRepositories {
            user_repo: Arc::new(store.clone()),
            category_repo: Arc::new(store.clone()),
            project_repo: Arc::new(store.clone()),
            video_repo: Arc::new(store.clone()),
            dashboard_repo: Arc::new(store),
        }
    }
}
