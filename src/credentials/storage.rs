//! Grant, provider-config and stored-file persistence using SQLite.
//!
//! Secrets are sealed with [`TokenCipher`] before they reach the database.

use super::{
    AuthorizationGrant, NewGrant, NewProviderConfig, ProviderConfig, StoredFile, TokenCipher,
};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS provider_configs (
    id               TEXT PRIMARY KEY,
    app_id           TEXT NOT NULL,
    app_secret       TEXT NOT NULL,
    app_secret_nonce TEXT NOT NULL,
    callback_url     TEXT NOT NULL,
    scopes           TEXT NOT NULL,
    active           INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_provider_configs_single_active
    ON provider_configs(active) WHERE active = 1;

CREATE TABLE IF NOT EXISTS grants (
    id                  TEXT PRIMARY KEY,
    client_ref          TEXT NOT NULL,
    access_token        TEXT NOT NULL,
    access_token_nonce  TEXT NOT NULL,
    refresh_token       TEXT,
    refresh_token_nonce TEXT,
    token_endpoint      TEXT NOT NULL,
    scopes              TEXT NOT NULL,
    expires_at          TEXT,
    identity_hint       TEXT,
    active              INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_grants_single_active
    ON grants(client_ref) WHERE active = 1;
CREATE INDEX IF NOT EXISTS idx_grants_client ON grants(client_ref);

CREATE TABLE IF NOT EXISTS stored_files (
    id               TEXT PRIMARY KEY,
    provider_file_id TEXT NOT NULL,
    album_ref        TEXT NOT NULL,
    client_ref       TEXT NOT NULL,
    uploader_name    TEXT NOT NULL,
    comment          TEXT,
    filename         TEXT NOT NULL,
    size_bytes       INTEGER NOT NULL,
    content_type     TEXT NOT NULL,
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stored_files_album ON stored_files(album_ref);
"#;

const GRANT_COLUMNS: &str = "id, client_ref, access_token, access_token_nonce, \
     refresh_token, refresh_token_nonce, token_endpoint, scopes, expires_at, \
     identity_hint, active, created_at, updated_at";

/// Grant storage backed by SQLite.
///
/// # Invariants
/// - At most one provider config row has `active = 1`
/// - At most one grant row per `client_ref` has `active = 1`
///
/// Both are enforced by partial unique indexes; the writers deactivate and
/// insert inside one immediate transaction so the indexes never trip in
/// normal operation.
///
/// # Thread Safety
/// - Connection is wrapped in a Mutex, statements are serialized
/// - Multi-step sequences spanning a provider call also take the
///   per-client lock from [`super::ClientLocks`]
pub struct GrantStore {
    conn: Mutex<Connection>,
    cipher: TokenCipher,
}

/// Raw grant row before secrets are opened.
struct GrantRow {
    id: String,
    client_ref: String,
    access_token: String,
    access_token_nonce: String,
    refresh_token: Option<String>,
    refresh_token_nonce: Option<String>,
    token_endpoint: String,
    scopes: String,
    expires_at: Option<String>,
    identity_hint: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl GrantRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            client_ref: row.get(1)?,
            access_token: row.get(2)?,
            access_token_nonce: row.get(3)?,
            refresh_token: row.get(4)?,
            refresh_token_nonce: row.get(5)?,
            token_endpoint: row.get(6)?,
            scopes: row.get(7)?,
            expires_at: row.get(8)?,
            identity_hint: row.get(9)?,
            active: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Failed to parse timestamp '{}'", value))
}

fn encode_scopes(scopes: &[String]) -> Result<String> {
    serde_json::to_string(scopes).context("Failed to encode scopes")
}

fn decode_scopes(value: &str) -> Result<Vec<String>> {
    serde_json::from_str(value).context("Failed to decode scopes")
}

impl GrantStore {
    /// Creates or opens a grant store.
    ///
    /// # Arguments
    /// * `db_path` - Path to SQLite database file (`:memory:` for tests)
    /// * `encryption_key` - Base64-encoded 32-byte master key
    pub fn new<P: AsRef<Path>>(db_path: P, encryption_key: &str) -> Result<Self> {
        let cipher = TokenCipher::from_base64(encryption_key).context("Invalid encryption key")?;

        let conn = Connection::open(db_path).context("Failed to open database")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to create grant store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
            cipher,
        })
    }

    /// Makes `config` the only active provider config.
    ///
    /// Previously active configs are kept but deactivated.
    pub fn activate_provider_config(&self, config: &NewProviderConfig) -> Result<ProviderConfig> {
        let (secret, secret_nonce) = self
            .cipher
            .seal(&config.app_secret)
            .context("Failed to encrypt app secret")?;
        let scopes = encode_scopes(&config.scopes)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        tx.execute(
            "UPDATE provider_configs SET active = 0 WHERE active = 1",
            [],
        )
        .context("Failed to deactivate provider configs")?;

        tx.execute(
            r#"
            INSERT INTO provider_configs (
                id, app_id, app_secret, app_secret_nonce,
                callback_url, scopes, active, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
            "#,
            params![
                id,
                config.app_id,
                secret,
                secret_nonce,
                config.callback_url,
                scopes,
                timestamp(now),
            ],
        )
        .context("Failed to insert provider config")?;

        tx.commit().context("Failed to commit provider config")?;

        Ok(ProviderConfig {
            id,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            callback_url: config.callback_url.clone(),
            scopes: config.scopes.clone(),
            active: true,
            created_at: now,
        })
    }

    /// Returns the active provider config, if one was ever activated.
    pub fn active_provider_config(&self) -> Result<Option<ProviderConfig>> {
        let row = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                r#"
                SELECT id, app_id, app_secret, app_secret_nonce,
                       callback_url, scopes, created_at
                FROM provider_configs
                WHERE active = 1
                "#,
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()
            .context("Failed to query provider config")?
        };

        let Some((id, app_id, secret, secret_nonce, callback_url, scopes, created_at)) = row
        else {
            return Ok(None);
        };

        Ok(Some(ProviderConfig {
            id,
            app_id,
            app_secret: self
                .cipher
                .open(&secret, &secret_nonce)
                .context("Failed to decrypt app secret")?,
            callback_url,
            scopes: decode_scopes(&scopes)?,
            active: true,
            created_at: parse_timestamp(&created_at)?,
        }))
    }

    /// Inserts a new active grant for `client_ref`, deactivating any prior active grant.
    pub fn replace_active_grant(
        &self,
        client_ref: &str,
        grant: &NewGrant,
    ) -> Result<AuthorizationGrant> {
        let (access_token, access_token_nonce) = self
            .cipher
            .seal(&grant.access_token)
            .context("Failed to encrypt access token")?;
        let (refresh_token, refresh_token_nonce) = self
            .cipher
            .seal_optional(grant.refresh_token.as_deref())
            .context("Failed to encrypt refresh token")?;
        let scopes = encode_scopes(&grant.scopes)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = timestamp(now);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        let superseded = tx
            .execute(
                "UPDATE grants SET active = 0, updated_at = ?1 WHERE client_ref = ?2 AND active = 1",
                params![now_str, client_ref],
            )
            .context("Failed to deactivate previous grants")?;

        tx.execute(
            r#"
            INSERT INTO grants (
                id, client_ref,
                access_token, access_token_nonce,
                refresh_token, refresh_token_nonce,
                token_endpoint, scopes, expires_at, identity_hint,
                active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
            "#,
            params![
                id,
                client_ref,
                access_token,
                access_token_nonce,
                refresh_token,
                refresh_token_nonce,
                grant.token_endpoint,
                scopes,
                grant.expires_at.map(timestamp),
                grant.identity_hint,
                now_str,
            ],
        )
        .context("Failed to insert grant")?;

        tx.commit().context("Failed to commit grant")?;

        tracing::debug!(client_ref = %client_ref, superseded, "Stored new active grant");

        Ok(AuthorizationGrant {
            id,
            client_ref: client_ref.to_string(),
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            token_endpoint: grant.token_endpoint.clone(),
            scopes: grant.scopes.clone(),
            expires_at: grant.expires_at,
            identity_hint: grant.identity_hint.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the active grant for `client_ref`, if any.
    pub fn active_grant(&self, client_ref: &str) -> Result<Option<AuthorizationGrant>> {
        let row = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                &format!(
                    "SELECT {} FROM grants WHERE client_ref = ?1 AND active = 1",
                    GRANT_COLUMNS
                ),
                params![client_ref],
                GrantRow::from_row,
            )
            .optional()
            .context("Failed to query active grant")?
        };

        row.map(|row| self.open_grant(row)).transpose()
    }

    /// Lists every grant a client ever completed, oldest first.
    #[cfg(test)]
    pub(crate) fn list_grants(&self, client_ref: &str) -> Result<Vec<AuthorizationGrant>> {
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM grants WHERE client_ref = ?1 ORDER BY created_at, rowid",
                    GRANT_COLUMNS
                ))
                .context("Failed to prepare query")?;

            let rows = stmt
                .query_map(params![client_ref], GrantRow::from_row)
                .context("Failed to execute query")?
                .collect::<Result<Vec<GrantRow>, _>>()
                .context("Failed to read results")?;
            rows
        };

        rows.into_iter().map(|row| self.open_grant(row)).collect()
    }

    /// Number of active grants for a client (0 or 1 by construction).
    #[cfg(test)]
    pub(crate) fn count_active_grants(&self, client_ref: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM grants WHERE client_ref = ?1 AND active = 1",
                params![client_ref],
                |row| row.get(0),
            )
            .context("Failed to count active grants")?;
        Ok(count as usize)
    }

    /// Updates a still-active grant in place after a token refresh.
    ///
    /// # Returns
    /// * `Ok(true)` - Row updated
    /// * `Ok(false)` - Grant no longer active (e.g. disconnected meanwhile)
    pub fn update_grant_tokens(
        &self,
        grant_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let (access_token, access_token_nonce) = self
            .cipher
            .seal(access_token)
            .context("Failed to encrypt access token")?;
        let (refresh_token, refresh_token_nonce) = self
            .cipher
            .seal_optional(refresh_token)
            .context("Failed to encrypt refresh token")?;

        let rows_affected = self
            .conn
            .lock()
            .unwrap()
            .execute(
                r#"
                UPDATE grants SET
                    access_token = ?1,
                    access_token_nonce = ?2,
                    refresh_token = COALESCE(?3, refresh_token),
                    refresh_token_nonce = COALESCE(?4, refresh_token_nonce),
                    expires_at = ?5,
                    updated_at = ?6
                WHERE id = ?7 AND active = 1
                "#,
                params![
                    access_token,
                    access_token_nonce,
                    refresh_token,
                    refresh_token_nonce,
                    expires_at.map(timestamp),
                    timestamp(Utc::now()),
                    grant_id,
                ],
            )
            .context("Failed to update grant tokens")?;

        Ok(rows_affected > 0)
    }

    /// Deactivates every active grant of a client. Rows are kept.
    ///
    /// Returns the number of grants that were active.
    pub fn deactivate_grants(&self, client_ref: &str) -> Result<usize> {
        let rows_affected = self
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE grants SET active = 0, updated_at = ?1 WHERE client_ref = ?2 AND active = 1",
                params![timestamp(Utc::now()), client_ref],
            )
            .context("Failed to deactivate grants")?;

        Ok(rows_affected)
    }

    /// Records a relayed upload.
    pub fn insert_stored_file(&self, file: &StoredFile) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO stored_files (
                    id, provider_file_id, album_ref, client_ref, uploader_name,
                    comment, filename, size_bytes, content_type, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    file.id,
                    file.provider_file_id,
                    file.album_ref,
                    file.client_ref,
                    file.uploader_name,
                    file.comment,
                    file.filename,
                    file.size_bytes as i64,
                    file.content_type,
                    timestamp(file.created_at),
                ],
            )
            .context("Failed to insert stored file")?;
        Ok(())
    }

    /// Lists stored files of an album, oldest first.
    pub fn list_stored_files(&self, album_ref: &str) -> Result<Vec<StoredFile>> {
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, provider_file_id, album_ref, client_ref, uploader_name,
                           comment, filename, size_bytes, content_type, created_at
                    FROM stored_files
                    WHERE album_ref = ?1
                    ORDER BY created_at, rowid
                    "#,
                )
                .context("Failed to prepare query")?;

            let rows = stmt
                .query_map(params![album_ref], |row| {
                    Ok((
                        StoredFile {
                            id: row.get(0)?,
                            provider_file_id: row.get(1)?,
                            album_ref: row.get(2)?,
                            client_ref: row.get(3)?,
                            uploader_name: row.get(4)?,
                            comment: row.get(5)?,
                            filename: row.get(6)?,
                            size_bytes: row.get::<_, i64>(7)? as u64,
                            content_type: row.get(8)?,
                            created_at: Utc::now(),
                        },
                        row.get::<_, String>(9)?,
                    ))
                })
                .context("Failed to execute query")?
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read results")?;
            rows
        };

        rows.into_iter()
            .map(|(mut file, created_at)| {
                file.created_at = parse_timestamp(&created_at)?;
                Ok(file)
            })
            .collect()
    }

    fn open_grant(&self, row: GrantRow) -> Result<AuthorizationGrant> {
        let access_token = self
            .cipher
            .open(&row.access_token, &row.access_token_nonce)
            .context("Failed to decrypt access token")?;
        let refresh_token = self
            .cipher
            .open_optional(row.refresh_token.as_deref(), row.refresh_token_nonce.as_deref())
            .context("Failed to decrypt refresh token")?;
        let expires_at = row
            .expires_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(AuthorizationGrant {
            id: row.id,
            client_ref: row.client_ref,
            access_token,
            refresh_token,
            token_endpoint: row.token_endpoint,
            scopes: decode_scopes(&row.scopes)?,
            expires_at,
            identity_hint: row.identity_hint,
            active: row.active,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use chrono::Duration;

    fn create_test_store() -> GrantStore {
        let key = BASE64.encode([0u8; 32]);
        GrantStore::new(":memory:", &key).expect("Failed to create test store")
    }

    fn create_test_grant(token: &str) -> NewGrant {
        NewGrant {
            access_token: token.to_string(),
            refresh_token: Some("refresh-token-67890".to_string()),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/drive.file".to_string(),
                "openid".to_string(),
            ],
            expires_at: Some(Utc::now() + Duration::hours(1)),
            identity_hint: Some("host@example.com".to_string()),
        }
    }

    fn create_test_config(app_id: &str) -> NewProviderConfig {
        NewProviderConfig {
            app_id: app_id.to_string(),
            app_secret: "app-secret".to_string(),
            callback_url: "https://fotos.example.com/api/auth/google/callback".to_string(),
            scopes: vec!["openid".to_string()],
        }
    }

    #[test]
    fn test_no_provider_config() {
        let store = create_test_store();
        assert!(store.active_provider_config().unwrap().is_none());
    }

    #[test]
    fn test_activate_provider_config_supersedes_previous() {
        let store = create_test_store();

        store.activate_provider_config(&create_test_config("first")).unwrap();
        let second = store.activate_provider_config(&create_test_config("second")).unwrap();

        let active = store.active_provider_config().unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(active.app_id, "second");
        assert_eq!(active.app_secret, "app-secret");
        assert_eq!(active.scopes, vec!["openid".to_string()]);
    }

    #[test]
    fn test_store_and_get_active_grant() {
        let store = create_test_store();
        let grant = store
            .replace_active_grant("client-1", &create_test_grant("tok1"))
            .unwrap();

        let retrieved = store.active_grant("client-1").unwrap().expect("grant not found");
        assert_eq!(retrieved.id, grant.id);
        assert_eq!(retrieved.access_token, "tok1");
        assert_eq!(retrieved.refresh_token.as_deref(), Some("refresh-token-67890"));
        assert_eq!(retrieved.scopes.len(), 2);
        assert_eq!(retrieved.identity_hint.as_deref(), Some("host@example.com"));
        assert!(retrieved.active);
    }

    #[test]
    fn test_active_grant_nonexistent() {
        let store = create_test_store();
        assert!(store.active_grant("nobody").unwrap().is_none());
    }

    #[test]
    fn test_replace_keeps_history_with_single_active() {
        let store = create_test_store();

        store.replace_active_grant("client-1", &create_test_grant("tok1")).unwrap();
        store.replace_active_grant("client-1", &create_test_grant("tok2")).unwrap();
        store.replace_active_grant("client-2", &create_test_grant("other")).unwrap();

        let history = store.list_grants("client-1").unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].active);
        assert!(history[1].active);
        assert_eq!(store.count_active_grants("client-1").unwrap(), 1);
        assert_eq!(store.active_grant("client-1").unwrap().unwrap().access_token, "tok2");

        // Other clients are untouched
        assert_eq!(store.active_grant("client-2").unwrap().unwrap().access_token, "other");
    }

    #[test]
    fn test_update_grant_tokens_in_place() {
        let store = create_test_store();
        let grant = store
            .replace_active_grant("client-1", &create_test_grant("tok1"))
            .unwrap();

        let new_expiry = Utc::now() + Duration::hours(2);
        let updated = store
            .update_grant_tokens(&grant.id, "tok1-refreshed", None, Some(new_expiry))
            .unwrap();
        assert!(updated);

        let retrieved = store.active_grant("client-1").unwrap().unwrap();
        assert_eq!(retrieved.id, grant.id);
        assert_eq!(retrieved.access_token, "tok1-refreshed");
        // Refresh token kept when the provider doesn't rotate it
        assert_eq!(retrieved.refresh_token.as_deref(), Some("refresh-token-67890"));
        assert_eq!(
            retrieved.expires_at.unwrap().timestamp(),
            new_expiry.timestamp()
        );
        assert_eq!(store.list_grants("client-1").unwrap().len(), 1);
    }

    #[test]
    fn test_update_skips_deactivated_grant() {
        let store = create_test_store();
        let grant = store
            .replace_active_grant("client-1", &create_test_grant("tok1"))
            .unwrap();
        store.deactivate_grants("client-1").unwrap();

        let updated = store
            .update_grant_tokens(&grant.id, "late", Some("late-refresh"), None)
            .unwrap();
        assert!(!updated);
        assert!(store.active_grant("client-1").unwrap().is_none());
    }

    #[test]
    fn test_deactivate_grants() {
        let store = create_test_store();

        assert_eq!(store.deactivate_grants("client-1").unwrap(), 0);

        store.replace_active_grant("client-1", &create_test_grant("tok1")).unwrap();
        assert_eq!(store.deactivate_grants("client-1").unwrap(), 1);
        assert_eq!(store.count_active_grants("client-1").unwrap(), 0);

        // Rows are kept
        assert_eq!(store.list_grants("client-1").unwrap().len(), 1);
        assert_eq!(store.deactivate_grants("client-1").unwrap(), 0);
    }

    #[test]
    fn test_grant_without_refresh_token_or_expiry() {
        let store = create_test_store();
        let grant = NewGrant {
            refresh_token: None,
            expires_at: None,
            identity_hint: None,
            ..create_test_grant("access-only")
        };

        store.replace_active_grant("client-1", &grant).unwrap();

        let retrieved = store.active_grant("client-1").unwrap().unwrap();
        assert_eq!(retrieved.access_token, "access-only");
        assert!(retrieved.refresh_token.is_none());
        assert!(retrieved.expires_at.is_none());
        assert!(retrieved.identity_hint.is_none());
    }

    #[test]
    fn test_stored_files() {
        let store = create_test_store();
        let file = StoredFile {
            id: Uuid::new_v4().to_string(),
            provider_file_id: "drive-file-1".to_string(),
            album_ref: "album-1".to_string(),
            client_ref: "client-1".to_string(),
            uploader_name: "Tia Maria".to_string(),
            comment: Some("Que festa!".to_string()),
            filename: "bolo.jpg".to_string(),
            size_bytes: 2048,
            content_type: "image/jpeg".to_string(),
            created_at: Utc::now(),
        };

        store.insert_stored_file(&file).unwrap();

        let files = store.list_stored_files("album-1").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].provider_file_id, "drive-file-1");
        assert_eq!(files[0].size_bytes, 2048);
        assert_eq!(files[0].comment.as_deref(), Some("Que festa!"));
        assert!(store.list_stored_files("album-2").unwrap().is_empty());
    }

    #[test]
    fn test_tokens_encrypted_at_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.db");
        let key = BASE64.encode([3u8; 32]);

        let store = GrantStore::new(&path, &key).unwrap();
        store.replace_active_grant("client-1", &create_test_grant("plain-token")).unwrap();
        drop(store);

        let conn = Connection::open(&path).unwrap();
        let raw: String = conn
            .query_row("SELECT access_token FROM grants", [], |row| row.get(0))
            .unwrap();
        assert_ne!(raw, "plain-token");

        // Reopening with the same key decrypts
        let store = GrantStore::new(&path, &key).unwrap();
        assert_eq!(
            store.active_grant("client-1").unwrap().unwrap().access_token,
            "plain-token"
        );
    }

    #[test]
    fn test_invalid_encryption_key() {
        assert!(GrantStore::new(":memory:", "short").is_err());
        assert!(GrantStore::new(":memory:", "not-valid-base64!@#$").is_err());
    }
}
