//! Relays guest uploads into the host's Google Drive.
//!
//! Every operation first resolves the client's credential through the
//! [`CredentialRefresher`], so an expired token is renewed transparently and a
//! client without a usable grant fails with `NotConnected`.

mod client;

pub use client::{DriveClient, DriveFile, FOLDER_MIME_TYPE};

use crate::config::UploadConfig;
use crate::credentials::{ClientLocks, GrantStore, StoredFile};
use crate::error::{RelayError, RelayResult};
use crate::oauth::{Credential, CredentialRefresher, IdentityHint};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A guest photo on its way to the host's Drive.
#[derive(Clone, Debug)]
pub struct GuestUpload {
    pub client_ref: String,
    pub album_ref: String,
    /// Album's Drive folder; empty means "create one"
    pub destination_id: String,
    pub uploader_name: String,
    pub comment: Option<String>,
    pub filename: String,
    pub content_type: String,
    pub content: Bytes,
}

/// Drive connection summary for the host dashboard.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

/// Folder creation, uploads and disconnects for connected clients.
pub struct StorageRelay {
    refresher: CredentialRefresher,
    drive: DriveClient,
    store: Arc<GrantStore>,
    locks: Arc<ClientLocks>,
    upload: UploadConfig,
}

impl StorageRelay {
    pub fn new(
        refresher: CredentialRefresher,
        drive: DriveClient,
        store: Arc<GrantStore>,
        locks: Arc<ClientLocks>,
        upload: UploadConfig,
    ) -> Self {
        Self {
            refresher,
            drive,
            store,
            locks,
            upload,
        }
    }

    async fn require_credential(&self, client_ref: &str) -> RelayResult<Credential> {
        self.refresher
            .resolve_active_credential(client_ref)
            .await?
            .ok_or(RelayError::NotConnected)
    }

    /// Creates the folder `"<name> - <event_label>"` in the client's Drive.
    ///
    /// # Returns
    /// * `Ok(Some(id))` - Folder created
    /// * `Ok(None)` - Provider rejected the request; the caller continues without a folder
    ///
    /// # Errors
    /// - `NotConnected` if the client has no usable credential
    pub async fn create_destination_folder(
        &self,
        client_ref: &str,
        name: &str,
        event_label: &str,
    ) -> RelayResult<Option<String>> {
        let credential = self.require_credential(client_ref).await?;
        self.create_folder_with(&credential, name, event_label).await
    }

    async fn create_folder_with(
        &self,
        credential: &Credential,
        name: &str,
        event_label: &str,
    ) -> RelayResult<Option<String>> {
        let folder_name = format!("{} - {}", name, event_label);

        match self
            .drive
            .create_folder(&credential.access_token, &folder_name, None)
            .await
        {
            Ok(folder) => {
                info!(
                    client_ref = %credential.client_ref,
                    folder_id = %folder.id,
                    folder_name = %folder_name,
                    "Drive folder created"
                );
                Ok(Some(folder.id))
            }
            Err(RelayError::Provider { status, reason }) => {
                warn!(
                    client_ref = %credential.client_ref,
                    status,
                    reason = %reason,
                    "Drive rejected folder creation"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Uploads `content` into `destination_id`, returning the provider file id.
    ///
    /// A blank `destination_id` gets a fallback folder created first.
    ///
    /// # Errors
    /// - `NotConnected` if the client has no usable credential
    /// - `DestinationUnavailable` if the fallback folder could not be created
    /// - `Provider` / `Transport` if the upload itself fails
    pub async fn upload_file(
        &self,
        client_ref: &str,
        destination_id: &str,
        content: Bytes,
        filename: &str,
        mime_type: &str,
    ) -> RelayResult<String> {
        let credential = self.require_credential(client_ref).await?;

        let destination_id = if destination_id.trim().is_empty() {
            debug!(client_ref = %client_ref, "No destination folder, creating fallback");
            self.create_folder_with(
                &credential,
                &self.upload.fallback_folder_name,
                &self.upload.fallback_event_label,
            )
            .await?
            .ok_or(RelayError::DestinationUnavailable)?
        } else {
            destination_id.trim().to_string()
        };

        let size = content.len();
        let file = self
            .drive
            .upload_resumable(
                &credential.access_token,
                filename,
                &destination_id,
                content,
                mime_type,
            )
            .await
            .map_err(|e| {
                error!(
                    client_ref = %client_ref,
                    folder_id = %destination_id,
                    filename = %filename,
                    error = %e,
                    "Drive upload failed"
                );
                e
            })?;

        info!(
            client_ref = %client_ref,
            folder_id = %destination_id,
            file_id = %file.id,
            size,
            "Upload relayed to Drive"
        );

        Ok(file.id)
    }

    /// Uploads a guest photo and records the resulting [`StoredFile`].
    pub async fn relay_upload(&self, upload: GuestUpload) -> RelayResult<StoredFile> {
        let size_bytes = upload.content.len() as u64;

        let provider_file_id = self
            .upload_file(
                &upload.client_ref,
                &upload.destination_id,
                upload.content,
                &upload.filename,
                &upload.content_type,
            )
            .await?;

        let stored = StoredFile {
            id: Uuid::new_v4().to_string(),
            provider_file_id,
            album_ref: upload.album_ref,
            client_ref: upload.client_ref,
            uploader_name: upload.uploader_name,
            comment: upload.comment,
            filename: upload.filename,
            size_bytes,
            content_type: upload.content_type,
            created_at: Utc::now(),
        };

        self.store.insert_stored_file(&stored)?;

        Ok(stored)
    }

    /// Deactivates the client's grants.
    ///
    /// Returns `false` when nothing was connected.
    pub async fn disconnect(&self, client_ref: &str) -> RelayResult<bool> {
        let _guard = self.locks.acquire(client_ref).await;
        let deactivated = self.store.deactivate_grants(client_ref)?;

        info!(client_ref = %client_ref, deactivated, "Google Drive disconnected");

        Ok(deactivated > 0)
    }

    /// Reports whether the client has an active grant. Does not contact the provider.
    pub fn connection_status(&self, client_ref: &str) -> RelayResult<ConnectionStatus> {
        let status = match self.store.active_grant(client_ref)? {
            Some(grant) => ConnectionStatus {
                connected: true,
                email: IdentityHint::from_stored(grant.identity_hint.as_deref())
                    .email()
                    .map(|e| e.to_string()),
                expires_at: grant.expires_at,
                connected_at: Some(grant.created_at),
            },
            None => ConnectionStatus {
                connected: false,
                email: None,
                expires_at: None,
                connected_at: None,
            },
        };

        Ok(status)
    }
}
