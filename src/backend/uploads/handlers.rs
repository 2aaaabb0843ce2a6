/**
 * Upload Handler
 *
 * Streams the `file` field to disk chunk by chunk and stops with `413` as
 * soon as the configured limit is crossed. A partially written file is
 * removed before the error is returned.
 */

use std::path::Path;
use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::backend::error::ApiError;
use crate::backend::middleware::AuthUser;
use crate::backend::response::{ApiResponse, ApiResult};
use crate::backend::uploads::{allowed_extension, base_name, ALLOWED_EXTENSIONS};
use crate::shared::config::AppConfig;

const FIELD_NAME: &str = "file";

#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    /// Stored name, `<uuid>.<ext>`
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
    pub url: String,
}

pub async fn upload_file(
    State(config): State<Arc<AppConfig>>,
    AuthUser(identity): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadedFile> {
    let owner = identity.user_id()?.to_string();
    let mut multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }

        let original_name = base_name(field.file_name().unwrap_or_default()).to_string();
        let extension = allowed_extension(&original_name).ok_or_else(|| {
            ApiError::bad_request(format!(
                "file type not allowed, expected one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let dir = config.upload.dir.join(&owner);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ApiError::internal(format!("create upload dir {}: {}", dir.display(), e)))?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let path = dir.join(&file_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ApiError::internal(format!("create {}: {}", path.display(), e)))?;

        let limit = config.upload.max_bytes as u64;
        let mut size: u64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    discard(&path).await;
                    return Err(e.into());
                }
            };
            size += chunk.len() as u64;
            if size > limit {
                discard(&path).await;
                tracing::warn!("Upload by {} exceeded {} bytes", owner, limit);
                return Err(ApiError::PayloadTooLarge(format!(
                    "file exceeds the maximum size of {} bytes",
                    limit
                )));
            }
            if let Err(e) = file.write_all(&chunk).await {
                discard(&path).await;
                return Err(ApiError::internal(format!("write {}: {}", path.display(), e)));
            }
        }
        if let Err(e) = file.flush().await {
            discard(&path).await;
            return Err(ApiError::internal(format!("flush {}: {}", path.display(), e)));
        }

        if size == 0 {
            discard(&path).await;
            return Err(ApiError::bad_request("uploaded file is empty"));
        }

        tracing::info!("Stored upload {} ({} bytes) for {}", file_name, size, owner);
        let url = format!("{}/uploads/{}/{}", config.server.base_url, owner, file_name);
        return Ok(ApiResponse::created(
            "file uploaded",
            UploadedFile {
                file_name,
                original_name,
                size,
                url,
            },
        ));
    }

    Err(ApiError::bad_request("multipart field `file` is required"))
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Failed to remove partial upload {}: {}", path.display(), e);
    }
}
