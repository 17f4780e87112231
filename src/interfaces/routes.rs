use actix_web::web;

use crate::handlers::{home::home, json_error::not_found};

mod admin;
mod auth;
mod categories;
mod json_error;
mod projects;
mod system;
mod uploads;
mod videos;

/// Mounts every endpoint; `max_upload_bytes` bounds upload payloads.
pub fn configure_routes(max_upload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.configure(json_error::config_routes);
        cfg.service(home);

        cfg.service(
            web::scope("/api/v1")
                .configure(system::config_routes)
                .configure(auth::config_routes)
                .configure(admin::config_routes)
                .configure(categories::config_routes)
                .configure(projects::config_routes)
                .configure(videos::config_routes)
                .configure(|cfg| uploads::config_routes(cfg, max_upload_bytes))
        );

        cfg.default_service(web::route().to(not_found));
    }
}
