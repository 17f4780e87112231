use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{http::header::CONTENT_TYPE, web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        media::{ListFilesQuery, PendingUpload, SignedUploadQuery, SignedUrlRequest},
        response::ApiResponse,
    },
    errors::AppError,
    use_cases::{extractors::AdminClaims, media::UploadTarget},
    AppState,
};

#[derive(Debug, MultipartForm)]
pub struct SingleUploadForm {
    pub file: Option<TempFile>,
    #[multipart(rename = "type")]
    pub kind: Option<Text<String>>,
    pub folder: Option<Text<String>>,
    #[multipart(rename = "projectName")]
    pub project_name: Option<Text<String>>,
    #[multipart(rename = "playbackId")]
    pub playback_id: Option<Text<String>>,
}

#[derive(Debug, MultipartForm)]
pub struct MultipleUploadForm {
    #[multipart(rename = "files")]
    pub files: Vec<TempFile>,
    #[multipart(rename = "type")]
    pub kind: Option<Text<String>>,
    pub folder: Option<Text<String>>,
    #[multipart(rename = "projectName")]
    pub project_name: Option<Text<String>>,
}

fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(Text::into_inner)
}

async fn read_temp_file(file: TempFile) -> Result<PendingUpload, AppError> {
    let bytes = tokio::fs::read(file.file.path()).await.map_err(|e| {
        tracing::error!("Failed to read spooled upload: {}", e);
        AppError::InternalError("Failed to read uploaded file".into())
    })?;
    Ok(PendingUpload {
        original_name: file.file_name.unwrap_or_else(|| "upload".to_string()),
        declared_type: file.content_type.map(|m| m.essence_str().to_string()),
        bytes,
    })
}

#[instrument(skip(_claims, state, form))]
pub async fn upload_single(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<SingleUploadForm>,
) -> Result<impl Responder, AppError> {
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;
    let target = UploadTarget {
        kind: text(form.kind),
        folder: text(form.folder),
        project_name: text(form.project_name),
        playback_id: text(form.playback_id),
    };

    let pending = read_temp_file(file).await?;
    let uploaded = state.media_handler.upload_single(&target, pending).await?;
    tracing::info!(key = %uploaded.key, size = uploaded.size, "File uploaded");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(uploaded, "File uploaded successfully")))
}

#[instrument(skip(_claims, state, form))]
pub async fn upload_multiple(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<MultipleUploadForm>,
) -> Result<impl Responder, AppError> {
    let target = UploadTarget {
        kind: text(form.kind),
        folder: text(form.folder),
        project_name: text(form.project_name),
        playback_id: None,
    };

    let mut pending = Vec::with_capacity(form.files.len());
    for file in form.files {
        pending.push(read_temp_file(file).await?);
    }

    let uploaded = state.media_handler.upload_multiple(&target, pending).await?;
    let message = format!("{} files uploaded successfully", uploaded.len());
    Ok(HttpResponse::Ok().json(ApiResponse::ok(uploaded, message)))
}

#[instrument(skip(state))]
pub async fn get_file(key: web::Path<String>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let (bytes, metadata) = state.media_handler.get_file(&key).await?;
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, metadata.content_type))
        .body(bytes))
}

#[instrument(skip(_claims, state))]
pub async fn delete_file(
    _claims: AdminClaims,
    key: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.media_handler.delete_file(&key).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("File deleted successfully")))
}

#[instrument(skip(_claims, state))]
pub async fn file_metadata(
    _claims: AdminClaims,
    key: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let metadata = state.media_handler.metadata(&key).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(metadata, "File metadata retrieved successfully")))
}

#[instrument(skip(_claims, state, data))]
pub async fn signed_upload_url(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<SignedUrlRequest>,
) -> Result<impl Responder, AppError> {
    let signed = state.media_handler.signed_url(data.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(signed, "Signed upload URL generated")))
}

/// Target of a signed URL; the token in the query string is the only credential.
#[instrument(skip(req, state, query, body))]
pub async fn put_signed_upload(
    req: HttpRequest,
    key: web::Path<String>,
    state: web::Data<AppState>,
    query: web::Query<SignedUploadQuery>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let declared_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let original_name = key.rsplit('/').next().unwrap_or(key.as_str()).to_string();
    let pending = PendingUpload {
        original_name,
        declared_type,
        bytes: body.to_vec(),
    };

    let uploaded = state.media_handler.put_signed(&key, &query.token, pending).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(uploaded, "File uploaded successfully")))
}

#[instrument(skip(_claims, state, query))]
pub async fn list_project_files(
    _claims: AdminClaims,
    project_name: web::Path<String>,
    state: web::Data<AppState>,
    query: web::Query<ListFilesQuery>,
) -> Result<impl Responder, AppError> {
    let files = state
        .media_handler
        .project_files(&project_name, query.folder.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(files, "Project files retrieved successfully")))
}

#[instrument(skip(state))]
pub async fn upload_health(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    state.media_handler.health().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        serde_json::json!({ "timestamp": chrono::Utc::now().to_rfc3339() }),
        "Blob store is healthy",
    )))
}
