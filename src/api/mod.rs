//! REST API access.
//!
//! - `client`: blocking HTTP client for the auth, organization, animal and plan
//!   endpoints (native targets only)
//! - `generation`: request-generation guard that drops superseded responses
//!
//! Failures are surfaced to the user as-is; nothing here retries.

#[cfg(not(target_arch = "wasm32"))]
mod client;
pub mod generation;

#[cfg(not(target_arch = "wasm32"))]
pub use client::{ApiClient, TokenResponse};
pub use generation::{Generation, RequestGeneration};

use thiserror::Error;

/// Base path of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Errors returned by API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials rejected or token no longer valid (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed, e.g. inactive subscription (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Connection, DNS, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Build the error for a non-success status, preferring the server's
    /// `detail` message over the raw body.
    pub fn from_status(code: u16, body: &str) -> Self {
        let message = extract_detail(body).unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                format!("status {}", code)
            } else {
                body.to_string()
            }
        });

        match code {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Status { code, message },
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_detail() {
        let err = ApiError::from_status(401, r#"{"detail":"Email ou senha incorretos"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Email ou senha incorretos"));
    }

    #[test]
    fn test_from_status_falls_back_to_body() {
        let err = ApiError::from_status(502, "Bad gateway");
        assert!(matches!(
            err,
            ApiError::Status { code: 502, ref message } if message == "Bad gateway"
        ));
        assert!(err.is_retryable());

        let err = ApiError::from_status(418, "");
        assert_eq!(err.to_string(), "HTTP 418: status 418");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_classes() {
        assert!(matches!(ApiError::from_status(403, "{}"), ApiError::Forbidden(_)));
        assert!(matches!(ApiError::from_status(404, "{}"), ApiError::NotFound(_)));
        assert!(!ApiError::from_status(404, "{}").is_retryable());
        assert!(ApiError::Transport("timed out".into()).is_retryable());
    }
}
