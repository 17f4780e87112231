use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::entities::response::ApiResponse;
use crate::entities::token::{LogoutRequest, RefreshTokenRequest};
use crate::entities::user::LoginUser;
use crate::errors::AuthError;
use crate::use_cases::extractors::{bearer_token, AdminClaims, AuthClaims};
use crate::AppState;

#[post("/login")]
#[instrument(skip(state, user))]
pub async fn login(
    state: web::Data<AppState>,
    user: web::Json<LoginUser>,
) -> Result<impl Responder, AuthError> {
    let auth_response = state.auth_handler.login(user.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(auth_response, "Login successful")))
}

#[post("/refresh")]
#[instrument(skip(state, request))]
pub async fn refresh_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AuthError> {
    let auth_response = state.auth_handler.refresh_token(&request.refresh_token).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(auth_response, "Token refreshed")))
}

#[post("/logout")]
#[instrument(skip(request, state, claims, body))]
pub async fn logout(
    request: HttpRequest,
    claims: AuthClaims,
    state: web::Data<AppState>,
    body: Option<web::Json<LogoutRequest>>,
) -> Result<impl Responder, AuthError> {
    let access_token = bearer_token(&request).ok_or(AuthError::MissingCredentials)?;
    let refresh = body.as_ref().and_then(|b| b.refresh_token.as_deref());

    state
        .auth_handler
        .logout(&access_token, &claims.0, refresh)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Logged out successfully")))
}

#[get("/me")]
#[instrument(skip(state, claims))]
pub async fn me(claims: AuthClaims, state: web::Data<AppState>) -> Result<impl Responder, AuthError> {
    let user = state.auth_handler.me(&claims.0).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user, "Current user")))
}

#[get("/dashboard")]
#[instrument(skip(_admin, state))]
pub async fn admin_dashboard(
    _admin: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, crate::errors::AppError> {
    let dashboard = state.admin_handler.dashboard().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(dashboard, "Dashboard data retrieved successfully")))
}
