use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod shared_repos;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, limiter, storage, utils};

use auth::{denylist::TokenDenylist, jwt::JwtService};
use repositories::{
    category::CategoryRepository, dashboard::DashboardRepository, project::ProjectRepository,
    user::UserRepository, video::VideoRepository,
};
use shared_repos::SharedRepositories;
use storage::{local::LocalBlobStore, BlobStore};
use use_cases::{
    admin::AdminHandler, auth::AuthHandler, category::CategoryHandler, media::MediaHandler,
    project::ProjectHandler, video::VideoHandler,
};

pub type AppAuthHandler = AuthHandler<dyn UserRepository, JwtService>;

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub category_handler: CategoryHandler<dyn CategoryRepository>,
    pub project_handler: ProjectHandler<dyn ProjectRepository>,
    pub video_handler: VideoHandler<dyn VideoRepository, dyn ProjectRepository>,
    pub admin_handler: AdminHandler<dyn DashboardRepository>,
    pub media_handler: MediaHandler,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, repos: SharedRepositories) -> Self {
        let jwt_service = JwtService::new(config);
        let denylist = TokenDenylist::new(config.redis_url.as_deref());
        let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(config, jwt_service.clone()));

        AppState {
            auth_handler: AuthHandler::new(repos.user_repo, jwt_service, denylist),
            category_handler: CategoryHandler::new(repos.category_repo),
            project_handler: ProjectHandler::new(repos.project_repo.clone()),
            video_handler: VideoHandler::new(repos.video_repo, repos.project_repo),
            admin_handler: AdminHandler::new(repos.dashboard_repo),
            media_handler: MediaHandler::new(blob_store, config.max_upload_bytes),
        }
    }
}
