use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by the session client and the API clients built on it.
///
/// `Clone` so that one refresh outcome can be handed to every request
/// waiting on it.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("Network error: {0}")]
    Network(Arc<reqwest::Error>),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Application(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Invalid response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Token refresh was abandoned before completing")]
    RefreshAborted,

    #[error("The cart is empty")]
    EmptyCart,
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Network(Arc::new(err))
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl SessionError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an `Http` error from a non-success response.
    ///
    /// The envelope `message` is preferred; a non-JSON body is used verbatim
    /// (truncated) and an empty body falls back to a generic message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { message: Some(m) }) if !m.trim().is_empty() => m,
            Ok(_) => format!("HTTP error: {}", status.as_u16()),
            Err(_) if body.trim().is_empty() => format!("HTTP error: {}", status.as_u16()),
            Err(_) => Self::truncate_body(body.trim()),
        };
        SessionError::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_prefers_envelope_message() {
        let err = SessionError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"Invalid credentials"}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_from_status_generic_fallback() {
        let err = SessionError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.to_string(), "HTTP error: 500");

        let err = SessionError::from_status(StatusCode::NOT_FOUND, r#"{"success":false}"#);
        assert_eq!(err.to_string(), "HTTP error: 404");
    }

    #[test]
    fn test_from_status_truncates_plain_body() {
        let body = "x".repeat(2000);
        let err = SessionError::from_status(StatusCode::BAD_GATEWAY, &body);
        let message = err.to_string();
        assert!(message.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(message.ends_with("(truncated, 2000 total bytes)"));
    }
}
