use actix_web::web;

use crate::handlers::videos;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/videos")
            .service(
                web::resource("")
                    .route(web::get().to(videos::list_videos))
                    .route(web::post().to(videos::create_video))
            )
            .service(
                web::resource("/featured")
                    .route(web::get().to(videos::list_featured_videos))
            )
            .service(
                web::resource("/search")
                    .route(web::get().to(videos::search_videos))
            )
            .service(
                web::resource("/project/{project_id}")
                    .route(web::get().to(videos::list_videos_by_project))
                    .route(web::post().to(videos::create_project_video))
            )
            .service(
                web::resource("/category/{category_name}")
                    .route(web::get().to(videos::list_videos_by_category))
            )
            .service(
                web::resource("/{video_id}")
                    .route(web::get().to(videos::get_video))
                    .route(web::put().to(videos::update_video))
                    .route(web::patch().to(videos::update_video))
                    .route(web::delete().to(videos::delete_video))
            )
    );
}
