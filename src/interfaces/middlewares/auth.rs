use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    auth::denylist::ACCESS_DENY_PREFIX,
    entities::token::Claims,
    errors::AuthError,
    repositories::token::TokenServiceRepository,
    AppState,
};

const API_PREFIX: &str = "/api/v1";

/// Decodes the bearer token of every non-public request and stores its
/// `Claims` in the request extensions for the `AuthClaims`/`AdminClaims`
/// extractors.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let claims = match authenticate(&req).await {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::warn!(path = %req.path(), "Authentication failed: {}", e);
                    return Ok(req.into_response(e.error_response()));
                }
            };

            if let Err(e) = enforce_admin_access(req.path(), &claims) {
                return Ok(req.into_response(e.error_response()));
            }

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<Claims, AuthError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState missing in middleware");
        AuthError::MissingJwtService
    })?;

    let token = extract_token(req).ok_or(AuthError::MissingCredentials)?;
    let claims = state.auth_handler.token_service.decode_jwt(&token)?.claims;

    if state.auth_handler.denylist.is_revoked(ACCESS_DENY_PREFIX, &token).await? {
        return Err(AuthError::TokenRevoked);
    }
    Ok(claims)
}

/// Catalog reads, health, login/refresh, served files and signed-upload PUTs.
pub fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" || path == "/" {
        return true;
    }

    let Some(route) = path.strip_prefix(API_PREFIX) else {
        return false;
    };

    match method {
        "GET" | "HEAD" => {
            let catalog_read = ["/categories", "/projects", "/videos"]
                .iter()
                .any(|p| route == *p || route.starts_with(&format!("{}/", p)));
            catalog_read
                || route == "/health"
                || route.starts_with("/health/")
                || route == "/upload/health"
                || route.starts_with("/upload/files/")
        }
        "POST" => matches!(route, "/auth/login" | "/auth/refresh"),
        "PUT" => route.starts_with("/upload/signed/"),
        _ => false,
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

fn enforce_admin_access(path: &str, claims: &Claims) -> Result<(), AuthError> {
    if path.starts_with(&format!("{}/admin", API_PREFIX)) && !claims.is_admin() {
        tracing::warn!(user_id = %claims.sub, "Admin access required for path: {}", path);
        return Err(AuthError::Forbidden("Admin access required".into()));
    }
    Ok(())
}
