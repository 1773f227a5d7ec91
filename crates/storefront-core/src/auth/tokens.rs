use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::warn;

use crate::storage::KeyValueStore;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// The access/refresh credential pair, persisted in a key-value store.
///
/// Storage failures never reach the caller: they are logged and reads
/// degrade to "absent". Empty strings also read as absent.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Write the access token, and the refresh token only when one was issued.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        self.write(ACCESS_TOKEN_KEY, access);
        if let Some(refresh) = refresh {
            self.write(REFRESH_TOKEN_KEY, refresh);
        }
    }

    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.backend.remove(key) {
                warn!(key = key, error = %e, "Failed to remove token from storage");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read token from storage");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!(key = key, error = %e, "Failed to write token to storage");
        }
    }
}

/// Headers for an API request: JSON content type, plus a bearer
/// `Authorization` header when an access token is present.
pub fn build_headers(access_token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = access_token {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => warn!("Access token is not a valid header value, sending request without it"),
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_set_tokens_keeps_refresh_when_not_rotated() {
        let tokens = store();
        tokens.set_tokens("a1", Some("r1"));
        tokens.set_tokens("a2", None);
        assert_eq!(tokens.access_token().as_deref(), Some("a2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("r1"));

        tokens.set_tokens("a3", Some("r2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("r2"));
    }

    #[test]
    fn test_clear_removes_both() {
        let tokens = store();
        tokens.set_tokens("a1", Some("r1"));
        tokens.clear();
        assert_eq!(tokens.access_token(), None);
        assert_eq!(tokens.refresh_token(), None);
    }

    #[test]
    fn test_empty_token_reads_as_absent() {
        let tokens = store();
        tokens.set_tokens("", None);
        assert_eq!(tokens.access_token(), None);
    }

    #[test]
    fn test_build_headers() {
        let headers = build_headers(Some("abc"));
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");

        let headers = build_headers(None);
        assert!(headers.get(header::AUTHORIZATION).is_none());
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_build_headers_skips_invalid_token() {
        let headers = build_headers(Some("bad\ntoken"));
        assert!(headers.get(header::AUTHORIZATION).is_none());
        assert_eq!(headers.len(), 1);
    }
}
