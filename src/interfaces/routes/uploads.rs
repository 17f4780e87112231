use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::handlers::uploads;
use crate::use_cases::media::MAX_FILES_PER_REQUEST;

/// Multipart bodies may carry a full batch; raw signed PUTs a single file.
pub fn config_routes(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.service(
        web::scope("/upload")
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(max_upload_bytes * MAX_FILES_PER_REQUEST)
                    .memory_limit(64 * 1024),
            )
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .service(web::resource("/single").route(web::post().to(uploads::upload_single)))
            .service(web::resource("/multiple").route(web::post().to(uploads::upload_multiple)))
            .service(web::resource("/signed-url").route(web::post().to(uploads::signed_upload_url)))
            .service(web::resource("/health").route(web::get().to(uploads::upload_health)))
            .service(
                web::resource("/files/{key:.*}")
                    .route(web::get().to(uploads::get_file))
                    .route(web::delete().to(uploads::delete_file))
            )
            .service(web::resource("/metadata/{key:.*}").route(web::get().to(uploads::file_metadata)))
            .service(web::resource("/signed/{key:.*}").route(web::put().to(uploads::put_signed_upload)))
            .service(
                web::resource("/project/{project_name}/files")
                    .route(web::get().to(uploads::list_project_files))
            )
    );
}
