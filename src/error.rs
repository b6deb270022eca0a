//! Error types shared by the API client, the gate and the dashboard.

use thiserror::Error;

/// Errors produced by a single user action against the desk API.
///
/// Every variant is terminal for the action that raised it; nothing retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered 401. Any admin call hitting this locks the gate.
    #[error("invalid admin secret")]
    AuthInvalid,

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx, non-401 response. `message` is the response body when the
    /// server sent one, otherwise the status code.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Rejected locally before any network call.
    #[error("{0}")]
    Validation(String),

    /// The server answered 2xx with a body we could not decode.
    #[error("unexpected response format: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthInvalid)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}
