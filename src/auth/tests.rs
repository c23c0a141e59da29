use super::*;
use axum::http::HeaderMap;

fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("authorization", value.parse().unwrap());
    headers
}

mod extract_bearer_token_tests {
    use super::*;

    #[test]
    fn valid_bearer_token() {
        let result = extract_bearer_token(&headers_with("Bearer admin-s3cret"));
        assert_eq!(result, Ok("admin-s3cret".to_string()));
    }

    #[test]
    fn valid_bearer_token_with_extra_whitespace() {
        let result = extract_bearer_token(&headers_with("Bearer   admin-s3cret  "));
        assert_eq!(result, Ok("admin-s3cret".to_string()));
    }

    #[test]
    fn case_insensitive_bearer() {
        let result = extract_bearer_token(&headers_with("bearer admin-s3cret"));
        assert_eq!(result, Ok("admin-s3cret".to_string()));
    }

    #[test]
    fn missing_authorization_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), Err(TokenError::Missing));
    }

    #[test]
    fn wrong_scheme() {
        assert_eq!(
            extract_bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(TokenError::InvalidFormat)
        );
    }

    #[test]
    fn no_space_after_bearer() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer")),
            Err(TokenError::InvalidFormat)
        );
    }

    #[test]
    fn empty_token() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer   ")), Err(TokenError::Empty));
    }
}

mod authorize_admin_tests {
    use super::*;

    #[test]
    fn no_token_configured_allows_everything() {
        assert_eq!(authorize_admin(&HeaderMap::new(), None), Ok(()));
    }

    #[test]
    fn matching_token() {
        assert_eq!(
            authorize_admin(&headers_with("Bearer admin-s3cret"), Some("admin-s3cret")),
            Ok(())
        );
    }

    #[test]
    fn wrong_token() {
        assert_eq!(
            authorize_admin(&headers_with("Bearer guess"), Some("admin-s3cret")),
            Err(TokenError::Mismatch)
        );
    }

    #[test]
    fn token_prefix_of_admin_token() {
        assert_eq!(
            authorize_admin(&headers_with("Bearer admin"), Some("admin-s3cret")),
            Err(TokenError::Mismatch)
        );
        assert_eq!(
            authorize_admin(&headers_with("Bearer admin-s3cret-and-more"), Some("admin-s3cret")),
            Err(TokenError::Mismatch)
        );
    }

    #[test]
    fn missing_token() {
        assert_eq!(
            authorize_admin(&HeaderMap::new(), Some("admin-s3cret")),
            Err(TokenError::Missing)
        );
    }
}
