use std::sync::Arc;

use validator::Validate;

use crate::{
    entities::{
        project::{PageRequest, Pagination},
        video::{
            NewVideoRequest, ProjectVideo, UpdateVideoRequest, VideoFilter, VideoQuery,
            VideoResponse,
        },
    },
    errors::AppError,
    repositories::{project::ProjectRepository, video::VideoRepository},
    utils::valid_uuid::valid_uuid,
};

/// Videos are always returned enriched with their project's name and categories.
pub struct VideoHandler<V, P>
where
    V: VideoRepository + ?Sized,
    P: ProjectRepository + ?Sized,
{
    pub video_repo: Arc<V>,
    pub project_repo: Arc<P>,
}

impl<V, P> VideoHandler<V, P>
where
    V: VideoRepository + ?Sized,
    P: ProjectRepository + ?Sized,
{
    pub fn new(video_repo: Arc<V>, project_repo: Arc<P>) -> Self {
        VideoHandler { video_repo, project_repo }
    }

    pub async fn list_videos(
        &self,
        query: VideoQuery,
    ) -> Result<(Vec<VideoResponse>, Pagination), AppError> {
        let filter = VideoFilter::from(query);
        let page = filter.page.unwrap_or_else(|| PageRequest::new(None, None));

        let total = self.video_repo.count_videos(&filter).await?;
        let videos = self.video_repo.find_videos(&filter).await?;

        Ok((videos, Pagination::new(page, total)))
    }

    pub async fn get_video(&self, id: &str) -> Result<VideoResponse, AppError> {
        let id = valid_uuid(id)?;
        self.video_repo.get_video(&id).await
    }

    pub async fn list_featured(&self) -> Result<Vec<VideoResponse>, AppError> {
        self.video_repo.find_videos(&VideoFilter::featured()).await
    }

    /// Fails with NotFound when the project itself does not exist.
    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<VideoResponse>, AppError> {
        let project_id = valid_uuid(project_id)?;
        self.project_repo.get_project(&project_id).await?;
        self.video_repo.find_videos(&VideoFilter::by_project(project_id)).await
    }

    pub async fn list_by_category(
        &self,
        category_name: &str,
    ) -> Result<Vec<VideoResponse>, AppError> {
        if category_name.trim().is_empty() {
            return Err(AppError::BadRequest("Category name is required".into()));
        }
        self.video_repo.find_videos(&VideoFilter::by_category(category_name)).await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<VideoResponse>, AppError> {
        if term.trim().is_empty() {
            return Err(AppError::BadRequest("Search query is required".into()));
        }
        self.video_repo.find_videos(&VideoFilter::search(term)).await
    }

    /// A project id in the path takes precedence over one in the body.
    pub async fn create_video(
        &self,
        path_project_id: Option<&str>,
        request: NewVideoRequest,
    ) -> Result<VideoResponse, AppError> {
        request.validate()?;

        let project_id = match path_project_id {
            Some(id) => valid_uuid(id)?,
            None => request
                .project_id
                .ok_or_else(|| AppError::invalid_field("projectId", "Project ID is required"))?,
        };

        let video = ProjectVideo::from_request(project_id, request);
        self.video_repo.create_video(&video).await
    }

    pub async fn update_video(
        &self,
        id: &str,
        request: UpdateVideoRequest,
    ) -> Result<VideoResponse, AppError> {
        request.validate()?;
        let id = valid_uuid(id)?;
        self.video_repo.update_video(&id, &request.normalized()).await
    }

    pub async fn delete_video(&self, id: &str) -> Result<(), AppError> {
        let id = valid_uuid(id)?;
        self.video_repo.delete_video(&id).await
    }
}
