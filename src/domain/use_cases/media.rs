use std::sync::Arc;

use validator::Validate;

use crate::{
    entities::media::{
        BlobMetadata, PendingUpload, ProjectFiles, SignedUrlRequest, SignedUrlResponse, StoredObject,
        UploadKind, UploadedFile, IMAGE_TYPES, VIDEO_TYPES,
    },
    errors::AppError,
    storage::{build_key, detect_content_type, extension_for, validate_key, BlobStore},
};

pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Where an upload goes and who it belongs to.
#[derive(Debug, Default, Clone)]
pub struct UploadTarget {
    pub kind: Option<String>,
    pub folder: Option<String>,
    pub project_name: Option<String>,
    pub playback_id: Option<String>,
}

impl UploadTarget {
    fn resolve(&self) -> Result<UploadKind, AppError> {
        UploadKind::resolve(
            self.kind.as_deref(),
            self.folder.as_deref(),
            self.playback_id.as_deref(),
        )
        .map_err(|msg| AppError::BadRequest(msg.into()))
    }
}

pub struct MediaHandler {
    pub blob_store: Arc<dyn BlobStore>,
    pub max_upload_bytes: usize,
}

impl MediaHandler {
    pub fn new(blob_store: Arc<dyn BlobStore>, max_upload_bytes: usize) -> Self {
        MediaHandler {
            blob_store,
            max_upload_bytes,
        }
    }

    /// Size and type checks, returning the sniffed content type.
    fn check_upload(&self, kind: &UploadKind, file: &PendingUpload) -> Result<String, AppError> {
        if file.bytes.is_empty() {
            return Err(AppError::BadRequest("No file uploaded".into()));
        }

        let limit = kind.max_bytes().min(self.max_upload_bytes);
        if file.bytes.len() > limit {
            tracing::warn!(size = file.bytes.len(), limit, "Upload rejected: too large");
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} MB",
                limit / (1024 * 1024)
            )));
        }

        let content_type = detect_content_type(&file.bytes, file.declared_type.as_deref());
        if !kind.allowed_types().contains(&content_type.as_str()) {
            tracing::warn!(content_type = %content_type, "Upload rejected: type not allowed");
            return Err(AppError::BadRequest(format!(
                "Invalid file type: {}. Allowed: {}",
                content_type,
                kind.allowed_types().join(", ")
            )));
        }

        Ok(content_type)
    }

    async fn store(
        &self,
        kind: &UploadKind,
        project_name: Option<&str>,
        file: PendingUpload,
    ) -> Result<UploadedFile, AppError> {
        let content_type = self.check_upload(kind, &file)?;
        let extension = extension_for(&content_type, Some(&file.original_name));
        let key = build_key(project_name, &kind.folder(), &extension);

        let stored = self.blob_store.put(&key, file.bytes).await?;
        Ok(UploadedFile {
            url: self.blob_store.public_url(&key),
            key,
            original_name: file.original_name,
            size: stored.size,
            mimetype: content_type,
        })
    }

    pub async fn upload_single(&self, target: &UploadTarget, file: PendingUpload) -> Result<UploadedFile, AppError> {
        let kind = target.resolve()?;
        self.store(&kind, target.project_name.as_deref(), file).await
    }

    /// Every file is checked before any is written.
    pub async fn upload_multiple(
        &self,
        target: &UploadTarget,
        files: Vec<PendingUpload>,
    ) -> Result<Vec<UploadedFile>, AppError> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".into()));
        }
        if files.len() > MAX_FILES_PER_REQUEST {
            return Err(AppError::BadRequest(format!(
                "Too many files. Maximum is {}",
                MAX_FILES_PER_REQUEST
            )));
        }

        let kind = target.resolve()?;
        for file in &files {
            self.check_upload(&kind, file)?;
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(self.store(&kind, target.project_name.as_deref(), file).await?);
        }
        Ok(uploaded)
    }

    pub async fn get_file(&self, key: &str) -> Result<(Vec<u8>, BlobMetadata), AppError> {
        self.blob_store.get(key).await
    }

    pub async fn metadata(&self, key: &str) -> Result<BlobMetadata, AppError> {
        self.blob_store.head(key).await
    }

    pub async fn delete_file(&self, key: &str) -> Result<(), AppError> {
        self.blob_store.delete(key).await
    }

    pub fn signed_url(&self, request: SignedUrlRequest) -> Result<SignedUrlResponse, AppError> {
        request.validate()?;

        let content_type = request.content_type.trim().to_ascii_lowercase();
        let kind = UploadKind::resolve(None, request.folder.as_deref(), None)
            .map_err(|msg| AppError::BadRequest(msg.into()))?;
        if !kind.allowed_types().contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(format!("Invalid file type: {}", content_type)));
        }

        let extension = extension_for(&content_type, Some(&request.filename));
        let key = build_key(request.project_name.as_deref(), &kind.folder(), &extension);
        let signed_url = self.blob_store.signed_upload_url(&key, Some(&content_type))?;

        Ok(SignedUrlResponse {
            signed_url,
            key,
            expires_in: self.blob_store.signed_url_ttl_secs(),
        })
    }

    /// Stores the body of a `PUT` against a previously signed URL.
    pub async fn put_signed(&self, key: &str, token: &str, file: PendingUpload) -> Result<UploadedFile, AppError> {
        let claims = self.blob_store.verify_signed_upload(key, token)?;

        if file.bytes.is_empty() {
            return Err(AppError::BadRequest("No file uploaded".into()));
        }
        if file.bytes.len() > self.max_upload_bytes {
            return Err(AppError::BadRequest("File too large".into()));
        }

        let declared = claims.content_type.as_deref().or(file.declared_type.as_deref());
        let content_type = detect_content_type(&file.bytes, declared);
        let allowed = IMAGE_TYPES.contains(&content_type.as_str()) || VIDEO_TYPES.contains(&content_type.as_str());
        if !allowed || claims.content_type.as_deref().is_some_and(|ct| ct != content_type) {
            tracing::warn!(key, content_type = %content_type, "Signed upload rejected: type mismatch");
            return Err(AppError::BadRequest(format!("Invalid file type: {}", content_type)));
        }

        let stored = self.blob_store.put(key, file.bytes).await?;
        Ok(UploadedFile {
            url: self.blob_store.public_url(key),
            key: key.to_string(),
            original_name: file.original_name,
            size: stored.size,
            mimetype: content_type,
        })
    }

    pub async fn project_files(&self, project_name: &str, folder: Option<&str>) -> Result<ProjectFiles, AppError> {
        let project = slug::slugify(project_name);
        if project.is_empty() {
            return Err(AppError::BadRequest("Project name is required".into()));
        }
        let folder = folder.map(str::trim).filter(|f| !f.is_empty()).unwrap_or("");

        let prefix = if folder.is_empty() {
            project.clone()
        } else {
            format!("{}/{}", project, folder)
        };
        validate_key(&prefix)?;

        let files = self
            .blob_store
            .list(&prefix)
            .await?
            .into_iter()
            .map(|meta| StoredObject {
                url: self.blob_store.public_url(&meta.key),
                key: meta.key,
                size: meta.size,
                last_modified: meta.last_modified,
            })
            .collect();

        Ok(ProjectFiles {
            project_name: project_name.to_string(),
            folder: folder.to_string(),
            files,
        })
    }

    pub async fn health(&self) -> Result<(), AppError> {
        self.blob_store.health().await
    }
}
