use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        project::SearchQuery,
        response::ApiResponse,
        video::{NewVideoRequest, UpdateVideoRequest, VideoQuery},
    },
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(state, query))]
pub async fn list_videos(
    state: web::Data<AppState>,
    query: web::Query<VideoQuery>,
) -> Result<impl Responder, AppError> {
    let (videos, pagination) = state.video_handler.list_videos(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::paginated(videos, pagination, "Videos retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn list_featured_videos(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let videos = state.video_handler.list_featured().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(videos, "Featured videos retrieved successfully")))
}

#[instrument(skip(state, query))]
pub async fn search_videos(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, AppError> {
    let videos = state.video_handler.search(&query.q).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(videos, "Search results retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn list_videos_by_project(
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let videos = state.video_handler.list_by_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(videos, "Project videos retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn list_videos_by_category(
    category_name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let videos = state.video_handler.list_by_category(&category_name).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(videos, "Videos retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn get_video(
    video_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let video = state.video_handler.get_video(&video_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(video, "Video retrieved successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_video(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewVideoRequest>,
) -> Result<impl Responder, AppError> {
    let video = state.video_handler.create_video(None, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(video, "Video created successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_project_video(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<NewVideoRequest>,
) -> Result<impl Responder, AppError> {
    let video = state
        .video_handler
        .create_video(Some(&project_id), data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(video, "Video created successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_video(
    _claims: AdminClaims,
    video_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateVideoRequest>,
) -> Result<impl Responder, AppError> {
    let video = state.video_handler.update_video(&video_id, data.into_inner()).await?;
    tracing::info!(video_id = %video.id, "Video updated");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(video, "Video updated successfully")))
}

#[instrument(skip(_claims, state))]
pub async fn delete_video(
    _claims: AdminClaims,
    video_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.video_handler.delete_video(&video_id).await?;
    tracing::info!(video_id = %video_id, "Video deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::message("Video deleted successfully")))
}
