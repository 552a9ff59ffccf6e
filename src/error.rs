//! Typed error surface for every backend call.
//!
//! The UI layer keys its behavior on `status()`: 0 means the request never
//! reached the backend (DNS, refused connection, timeout), anything else is
//! the HTTP status the backend answered with. Errors are `Clone` so a shared
//! in-flight login future can hand the same failure to every waiter.

use serde_json::Value;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    ///
    /// `message` is taken from the response body's `message` field when
    /// present, falling back to the canonical status text. `body` is the raw
    /// parsed response body.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The request never produced an HTTP response.
    #[error("network error: {message}")]
    Network { message: String },
}

impl ApiError {
    /// HTTP status code, or 0 for transport-level failures.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } => *status,
            ApiError::Network { .. } => 0,
        }
    }

    /// Raw parsed error body, when the backend sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Http { body, .. } => body.as_ref(),
            ApiError::Network { .. } => None,
        }
    }

    /// True for 401/403 — the session is missing or rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), 401 | 403)
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }
}
