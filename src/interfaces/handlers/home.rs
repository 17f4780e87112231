use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Welcome to the Ecosystem Directory API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/v1/health",
            "categories": "/api/v1/categories",
            "projects": "/api/v1/projects",
            "videos": "/api/v1/videos",
            "auth": "/api/v1/auth",
            "upload": "/api/v1/upload"
        }
    }))
}
