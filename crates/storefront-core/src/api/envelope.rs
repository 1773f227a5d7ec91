//! The `{ success, message, data }` envelope every endpoint responds with.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::SessionError;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Read a response whose envelope must carry `data`, decoded as `T`.
///
/// `fallback` is the message used when the server reports failure without one.
pub async fn read_data<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, SessionError> {
    let value = read_envelope(response, fallback)
        .await?
        .ok_or_else(|| SessionError::MalformedResponse("response has no data".to_string()))?;
    decode(value)
}

/// Read a response, checking status and `success` only. `data` may be absent.
pub async fn read_envelope(
    response: Response,
    fallback: &str,
) -> Result<Option<Value>, SessionError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        debug!(status = status.as_u16(), "Request failed");
        return Err(SessionError::from_status(status, &body));
    }
    parse_envelope(&body, fallback)
}

/// Like `read_envelope`, but hand back the whole JSON body for endpoints
/// that put fields next to `data` instead of inside it.
pub async fn read_body(response: Response, fallback: &str) -> Result<Value, SessionError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SessionError::from_status(status, &body));
    }
    parse_envelope(&body, fallback)?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| SessionError::MalformedResponse(e.to_string()))
}

pub fn parse_envelope(body: &str, fallback: &str) -> Result<Option<Value>, SessionError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: Envelope<Value> = serde_json::from_str(body)
        .map_err(|e| SessionError::MalformedResponse(format!("expected JSON envelope: {}", e)))?;

    if envelope.success == Some(false) {
        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(SessionError::Application(message));
    }

    Ok(envelope.data.filter(|v| !v.is_null()))
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, SessionError> {
    serde_json::from_value(value).map_err(|e| SessionError::MalformedResponse(e.to_string()))
}

/// Decode `data.<key>` when the server wrapped the payload, else `data` itself.
pub fn decode_keyed<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, SessionError> {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(|v| !v.is_null()) => {
            decode(map.remove(key).unwrap_or(Value::Null))
        }
        other => decode(other),
    }
}
