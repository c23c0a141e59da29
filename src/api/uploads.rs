use super::{AppError, AppState};
use crate::credentials::StoredFile;
use crate::drive::GuestUpload;
use crate::error::RelayError;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub file_id: String,
    pub filename: String,
    pub size_bytes: u64,
}

/// Multipart fields of a guest upload
#[derive(Default)]
struct UploadForm {
    file: Option<(String, String, Bytes)>,
    guest_name: Option<String>,
    comment: Option<String>,
    folder_id: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or("upload")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                form.file = Some((filename, content_type, content));
            }
            "guest_name" | "comment" | "folder_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid '{}' field: {}", name, e)))?;
                let value = Some(value).filter(|v| !v.trim().is_empty());
                match name.as_str() {
                    "guest_name" => form.guest_name = value,
                    "comment" => form.comment = value,
                    _ => form.folder_id = value,
                }
            }
            other => debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

/// POST /api/clients/:client_ref/albums/:album_ref/photos
///
/// Relays a guest's photo into the host's Drive. Without `folder_id` a
/// fallback folder is created for it.
pub(super) async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Path((client_ref, album_ref)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;

    let (filename, content_type, content) = form
        .file
        .ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;
    let uploader_name = form
        .guest_name
        .ok_or_else(|| AppError::BadRequest("Missing 'guest_name' field".to_string()))?;

    debug!(
        client_ref = %client_ref,
        album_ref = %album_ref,
        filename = %filename,
        size = content.len(),
        "Guest upload received"
    );

    let stored = state
        .relay
        .relay_upload(GuestUpload {
            client_ref,
            album_ref,
            destination_id: form.folder_id.unwrap_or_default(),
            uploader_name,
            comment: form.comment,
            filename,
            content_type,
            content,
        })
        .await?;

    info!(
        album_ref = %stored.album_ref,
        file_id = %stored.provider_file_id,
        uploader = %stored.uploader_name,
        "Guest upload stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: stored.id,
            file_id: stored.provider_file_id,
            filename: stored.filename,
            size_bytes: stored.size_bytes,
        }),
    )
        .into_response())
}

/// GET /api/albums/:album_ref/photos
///
/// Photos relayed for an album, oldest first.
pub(super) async fn list_photos(
    State(state): State<Arc<AppState>>,
    Path(album_ref): Path<String>,
) -> Result<Json<Vec<StoredFile>>, AppError> {
    let files = state
        .store
        .list_stored_files(&album_ref)
        .map_err(|e| AppError::from(RelayError::Storage(e)))?;

    debug!(album_ref = %album_ref, count = files.len(), "Listed album photos");

    Ok(Json(files))
}
