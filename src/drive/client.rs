//! Google Drive v3 API client for folder creation and resumable uploads.

use crate::config::ProviderEndpoints;
use crate::error::{RelayError, RelayResult};
use bytes::Bytes;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Resumable chunks must be multiples of 256 KiB (except the last one).
const CHUNK_GRANULARITY: usize = 256 * 1024;

const FILE_FIELDS: &str = "id,name,mimeType,size";

/// Drive file metadata returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes as a decimal string (files only)
    #[serde(default)]
    pub size: Option<String>,
}

/// Drive API client. Access tokens are passed per call since every client has its own.
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    api_base: String,
    upload_base: String,
    chunk_size: usize,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, endpoints: &ProviderEndpoints, chunk_size: usize) -> Self {
        // Round down to the protocol granularity, never below one unit
        let chunk_size = (chunk_size / CHUNK_GRANULARITY).max(1) * CHUNK_GRANULARITY;

        Self {
            http,
            api_base: endpoints.drive_api_base.trim_end_matches('/').to_string(),
            upload_base: endpoints.drive_upload_base.trim_end_matches('/').to_string(),
            chunk_size,
        }
    }

    /// Create a folder, optionally inside `parent_id`.
    pub async fn create_folder(
        &self,
        access_token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> RelayResult<DriveFile> {
        let url = format!("{}/files", self.api_base);

        let mut metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE
        });

        if let Some(parent) = parent_id {
            metadata["parents"] = serde_json::json!([parent]);
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("fields", FILE_FIELDS)])
            .json(&metadata)
            .send()
            .await?;

        handle_response(response).await
    }

    /// Upload `content` into `parent_id` using the resumable protocol.
    ///
    /// Chunks are zero-copy slices of `content`.
    pub async fn upload_resumable(
        &self,
        access_token: &str,
        name: &str,
        parent_id: &str,
        content: Bytes,
        mime_type: &str,
    ) -> RelayResult<DriveFile> {
        let total_size = content.len() as u64;
        let upload_uri = self
            .start_resumable_upload(access_token, name, parent_id, mime_type, total_size)
            .await?;

        if content.is_empty() {
            return self
                .upload_chunk(&upload_uri, Bytes::new(), 0, 0)
                .await?
                .ok_or_else(incomplete_upload);
        }

        let mut offset = 0usize;
        while offset < content.len() {
            let end = (offset + self.chunk_size).min(content.len());
            let chunk = content.slice(offset..end);

            if let Some(file) = self
                .upload_chunk(&upload_uri, chunk, offset as u64, total_size)
                .await?
            {
                return Ok(file);
            }

            offset = end;
        }

        Err(incomplete_upload())
    }

    /// Start a resumable upload session, returning the session URI.
    async fn start_resumable_upload(
        &self,
        access_token: &str,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        total_size: u64,
    ) -> RelayResult<String> {
        let url = format!("{}/files", self.upload_base);

        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id]
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("uploadType", "resumable"), ("fields", FILE_FIELDS)])
            .header("X-Upload-Content-Type", mime_type)
            .header("X-Upload-Content-Length", total_size.to_string())
            .json(&metadata)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::from_response(response).await);
        }

        let upload_uri = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RelayError::Provider {
                status: response.status().as_u16(),
                reason: "No upload session URI in response".to_string(),
            })?
            .to_string();

        Ok(upload_uri)
    }

    /// Upload one chunk. Returns the file once the provider reports completion.
    async fn upload_chunk(
        &self,
        upload_uri: &str,
        chunk: Bytes,
        start_byte: u64,
        total_size: u64,
    ) -> RelayResult<Option<DriveFile>> {
        let content_range = if chunk.is_empty() {
            format!("bytes */{}", total_size)
        } else {
            let end_byte = start_byte + chunk.len() as u64 - 1;
            format!("bytes {}-{}/{}", start_byte, end_byte, total_size)
        };

        let response = self
            .http
            .put(upload_uri)
            .header(header::CONTENT_RANGE, content_range)
            .body(chunk)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::OK || status == StatusCode::CREATED {
            let status = status.as_u16();
            let file: DriveFile = response.json().await.map_err(|e| RelayError::Provider {
                status,
                reason: format!("Malformed upload response: {}", e),
            })?;
            Ok(Some(file))
        } else if status == StatusCode::PERMANENT_REDIRECT {
            // 308 Resume Incomplete
            Ok(None)
        } else {
            Err(RelayError::from_response(response).await)
        }
    }
}

fn incomplete_upload() -> RelayError {
    RelayError::Provider {
        status: StatusCode::PERMANENT_REDIRECT.as_u16(),
        reason: "Upload session did not complete".to_string(),
    }
}

/// Parse a JSON body on success, or turn the response into a `Provider` error.
async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> RelayResult<T> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(|e| RelayError::Provider {
            status: status.as_u16(),
            reason: format!("Malformed response: {}", e),
        })
    } else {
        Err(RelayError::from_response(response).await)
    }
}
