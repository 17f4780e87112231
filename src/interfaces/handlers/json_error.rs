use actix_web::{http::StatusCode, HttpRequest, HttpResponse};

pub fn json_error(status: StatusCode, error: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "error": error
    }))
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    json_error(
        StatusCode::NOT_FOUND,
        &format!("Route {} {} not found", req.method(), req.path()),
    )
}
