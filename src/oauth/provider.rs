//! Authorization URL construction.

use crate::credentials::ProviderConfig;

/// Build the provider authorization URL for the consent redirect.
///
/// Requests offline access so a refresh token is issued and forces the
/// consent screen so re-authorizing always yields a new refresh token.
pub fn build_auth_url(
    auth_url: &str,
    config: &ProviderConfig,
    state: &str,
    redirect_uri: &str,
) -> String {
    let scopes = config.scopes.join(" ");
    let separator = if auth_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
        auth_url,
        separator,
        urlencoding::encode(&config.app_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes),
        urlencoding::encode(state)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            id: "cfg-1".to_string(),
            app_id: "test_client_id".to_string(),
            app_secret: "test_secret".to_string(),
            callback_url: "http://localhost:8001/api/auth/google/callback".to_string(),
            scopes: vec!["read".to_string(), "write".to_string()],
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_auth_url() {
        let url = build_auth_url(
            "https://example.com/oauth/authorize",
            &test_config(),
            "client_id:client-1",
            "http://localhost:3000/callback",
        );

        assert!(url.starts_with("https://example.com/oauth/authorize?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback"));
        // URL encoding converts spaces to %20
        assert!(url.contains("scope=read%20write"));
        assert!(url.contains("state=client_id%3Aclient-1"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(!url.contains("test_secret"));
    }

    #[test]
    fn test_build_auth_url_with_existing_query() {
        let url = build_auth_url(
            "https://example.com/auth?hd=example.com",
            &test_config(),
            "client_id:c",
            "https://host/cb",
        );
        assert!(url.starts_with("https://example.com/auth?hd=example.com&client_id="));
    }
}
