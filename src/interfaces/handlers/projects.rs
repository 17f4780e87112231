use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        project::{NewProjectRequest, ProjectQuery, SearchQuery, UpdateProjectRequest},
        response::ApiResponse,
    },
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(state, query))]
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<ProjectQuery>,
) -> Result<impl Responder, AppError> {
    let (projects, pagination) = state.project_handler.list_projects(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        projects,
        pagination,
        "Projects retrieved successfully",
    )))
}

#[instrument(skip(state))]
pub async fn list_featured_projects(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let projects = state.project_handler.list_featured().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects, "Featured projects retrieved successfully")))
}

#[instrument(skip(state, query))]
pub async fn search_projects(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, AppError> {
    let projects = state.project_handler.search(&query.q).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects, "Search results retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn list_projects_by_category(
    category_name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let projects = state.project_handler.list_by_category(&category_name).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(projects, "Projects retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn get_project(
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.get_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(project, "Project retrieved successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_project(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewProjectRequest>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.create_project(data.into_inner()).await?;
    tracing::info!(project_id = %project.id, featured = project.featured, "Project created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(project, "Project created successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateProjectRequest>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .update_project(&project_id, data.into_inner())
        .await?;
    tracing::info!(project_id = %project.id, "Project updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(project, "Project updated successfully")))
}

#[instrument(skip(_claims, state))]
pub async fn delete_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.project_handler.delete_project(&project_id).await?;
    tracing::info!(project_id = %project_id, "Project deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::message("Project deleted successfully")))
}
