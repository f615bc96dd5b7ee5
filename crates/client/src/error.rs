//! Error types for the backend and app API clients.

use serde::Deserialize;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the backend or the app API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected a query. Displays the backend's own message.
    #[error("{message}")]
    Backend {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },

    /// The app API answered with a non-success status.
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ClientError {
    /// Build a backend error from a PostgREST error response.
    ///
    /// Falls back to the raw body, then to the status reason, when the body
    /// is not the usual `{message, code, details, hint}` object.
    pub fn from_backend_response(status: reqwest::StatusCode, body: &str) -> Self {
        match serde_json::from_str::<PostgrestErrorBody>(body) {
            Ok(parsed) if parsed.message.is_some() => Self::Backend {
                status: status.as_u16(),
                message: parsed.message.unwrap_or_default(),
                code: parsed.code,
                details: parsed.details,
                hint: parsed.hint,
            },
            _ => {
                let message = if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body.to_string()
                };
                Self::Backend {
                    status: status.as_u16(),
                    message,
                    code: None,
                    details: None,
                    hint: None,
                }
            }
        }
    }
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}
