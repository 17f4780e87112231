use actix_web::web;

use crate::handlers::system;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(system::health_check)
        .service(system::health_status);
}
