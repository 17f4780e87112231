use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        category::{NewCategoryRequest, UpdateCategoryRequest},
        response::ApiResponse,
    },
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(state))]
pub async fn list_categories(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let categories = state.category_handler.list_categories().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(categories, "Categories retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn list_featured_categories(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let categories = state.category_handler.list_featured().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(categories, "Featured categories retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn get_category(
    category_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let category = state.category_handler.get_category(&category_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(category, "Category retrieved successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_category(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = state.category_handler.create_category(data.into_inner()).await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(category, "Category created successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_category(
    _claims: AdminClaims,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = state
        .category_handler
        .update_category(&category_id, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(category, "Category updated successfully")))
}

#[instrument(skip(_claims, state))]
pub async fn delete_category(
    _claims: AdminClaims,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.category_handler.delete_category(&category_id).await?;
    tracing::info!(category_id = %category_id, "Category deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::message("Category deleted successfully")))
}
