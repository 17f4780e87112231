use std::sync::Arc;

use validator::Validate;

use crate::{
    entities::project::{
        NewProjectRequest, PageRequest, Pagination, Project, ProjectChanges, ProjectFilter,
        ProjectInsert, ProjectQuery, UpdateProjectRequest,
    },
    errors::AppError,
    repositories::project::ProjectRepository,
    utils::valid_uuid::valid_uuid,
};

pub struct ProjectHandler<R>
where
    R: ProjectRepository + ?Sized,
{
    pub project_repo: Arc<R>,
}

impl<R> ProjectHandler<R>
where
    R: ProjectRepository + ?Sized,
{
    pub fn new(project_repo: Arc<R>) -> Self {
        ProjectHandler { project_repo }
    }

    /// Filtered, sorted page of projects plus pagination totals.
    pub async fn list_projects(&self, query: ProjectQuery) -> Result<(Vec<Project>, Pagination), AppError> {
        let filter = ProjectFilter::from(query);
        let page = filter.page.unwrap_or_else(|| PageRequest::new(None, None));

        let total = self.project_repo.count_projects(&filter).await?;
        let projects = self.project_repo.find_projects(&filter).await?;

        Ok((projects, Pagination::new(page, total)))
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, AppError> {
        let id = valid_uuid(id)?;
        self.project_repo.get_project(&id).await
    }

    pub async fn list_featured(&self) -> Result<Vec<Project>, AppError> {
        self.project_repo.find_projects(&ProjectFilter::featured()).await
    }

    pub async fn list_by_category(&self, category_name: &str) -> Result<Vec<Project>, AppError> {
        if category_name.trim().is_empty() {
            return Err(AppError::BadRequest("Category name is required".into()));
        }
        self.project_repo.find_projects(&ProjectFilter::by_category(category_name)).await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Project>, AppError> {
        if term.trim().is_empty() {
            return Err(AppError::BadRequest("Search query is required".into()));
        }
        self.project_repo.find_projects(&ProjectFilter::search(term)).await
    }

    pub async fn create_project(&self, request: NewProjectRequest) -> Result<Project, AppError> {
        request.validate()?;
        let insert = ProjectInsert::from(request);
        self.project_repo.create_project(&insert).await
    }

    pub async fn update_project(&self, id: &str, request: UpdateProjectRequest) -> Result<Project, AppError> {
        request.validate()?;
        let id = valid_uuid(id)?;
        let changes = ProjectChanges::from(request);
        self.project_repo.update_project(&id, &changes).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let id = valid_uuid(id)?;
        self.project_repo.delete_project(&id).await
    }
}
