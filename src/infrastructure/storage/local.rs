use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{fs, io::AsyncReadExt};

use crate::{
    auth::jwt::JwtService,
    entities::{media::BlobMetadata, token::UploadClaims},
    errors::{AppError, AuthError},
    repositories::token::TokenServiceRepository,
    settings::AppConfig,
};

use super::{detect_content_type, validate_key, BlobStore};

const SNIFF_BYTES: usize = 512;

/// Blob store backed by a directory on the local filesystem.
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
    signer: JwtService,
}

impl LocalBlobStore {
    pub fn new(config: &AppConfig, signer: JwtService) -> Self {
        LocalBlobStore {
            root: PathBuf::from(&config.upload_dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            signer,
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    async fn metadata_for(&self, key: &str, path: &Path) -> Result<BlobMetadata, AppError> {
        let meta = fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(AppError::NotFound("File not found".into()));
        }

        let mut head = vec![0u8; SNIFF_BYTES];
        let mut file = fs::File::open(path).await?;
        let read = file.read(&mut head).await?;
        head.truncate(read);

        let last_modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(BlobMetadata {
            key: key.to_string(),
            size: meta.len(),
            content_type: detect_content_type(&head, None),
            last_modified,
        })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<BlobMetadata, AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;

        tracing::info!(key, size = bytes.len(), "Blob stored");
        self.metadata_for(key, &path).await
    }

    async fn get(&self, key: &str) -> Result<(Vec<u8>, BlobMetadata), AppError> {
        let path = self.path_for(key)?;
        let metadata = self.metadata_for(key, &path).await?;
        let bytes = fs::read(&path).await?;
        Ok((bytes, metadata))
    }

    async fn head(&self, key: &str) -> Result<BlobMetadata, AppError> {
        let path = self.path_for(key)?;
        self.metadata_for(key, &path).await
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        fs::remove_file(&path).await?;

        tracing::info!(key, "Blob deleted");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMetadata>, AppError> {
        let prefix = prefix.trim_matches('/');
        let start = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.path_for(prefix)?
        };

        let mut found = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                found.push(self.metadata_for(&key, &path).await?);
            }
        }

        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    async fn health(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).await?;
        let meta = fs::metadata(&self.root).await?;
        if meta.permissions().readonly() {
            return Err(AppError::StoreError("Upload directory is read-only".into()));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/api/v1/upload/files/{}", self.public_base_url, key)
    }

    fn signed_upload_url<'a>(&self, key: &str, content_type: Option<&'a str>) -> Result<String, AppError> {
        validate_key(key)?;
        let token = self.signer.create_upload_token(key, content_type).map_err(|e| {
            tracing::error!("Failed to sign upload URL: {}", e);
            AppError::InternalError("Failed to sign upload URL".into())
        })?;
        Ok(format!(
            "{}/api/v1/upload/signed/{}?token={}",
            self.public_base_url,
            key,
            urlencoding::encode(&token)
        ))
    }

    fn verify_signed_upload(&self, key: &str, token: &str) -> Result<UploadClaims, AppError> {
        let claims = self.signer.decode_upload_token(token).map_err(|e| match e {
            AuthError::TokenExpired => AppError::ForbiddenAccess,
            _ => AppError::UnauthorizedAccess,
        })?;
        if claims.key != key {
            tracing::warn!(key, signed_for = %claims.key, "Signed upload used for a different key");
            return Err(AppError::ForbiddenAccess);
        }
        Ok(claims)
    }

    fn signed_url_ttl_secs(&self) -> u64 {
        self.signer.upload_ttl_secs().max(0) as u64
    }
}
