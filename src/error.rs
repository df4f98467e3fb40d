use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for hookwise
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A payload that violates the caller contract (e.g. a JSON `null` handed
    /// to action extraction). This is a defect in the calling code.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised while loading receiver configuration
///
/// Secret values never appear in these messages, only their ids and lengths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "secret for receiver '{receiver}' and id '{id}' is {len} bytes; it must be between {min} and {max} bytes"
    )]
    SecretLength {
        receiver: String,
        id: String,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid secret length bounds: min {min}, max {max}")]
    InvalidBounds { min: usize, max: usize },

    #[error("receiver name must not be empty")]
    EmptyReceiverName,

    #[error("base path '{0}' must start with '/'")]
    InvalidBasePath(String),

    #[error("invalid server address '{0}'")]
    InvalidAddress(String),

    #[error("maximum body size must be greater than 0")]
    InvalidBodyLimit,

    #[error("invalid log level '{0}', must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Standard JSON error body for failures raised by downstream handlers.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    error_id: String,
}

impl ReceiverError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidPayload(_)
            | Self::Config(_)
            | Self::Internal(_)
            | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a message safe to send to the client.
    ///
    /// Client errors (4xx) carry their message. Server errors (5xx) collapse to a
    /// generic message; the detail is only logged (CWE-209).
    fn safe_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::NotFound(msg) => format!("Not found: {}", msg),
            Self::UnsupportedMediaType(msg) => format!("Unsupported media type: {}", msg),
            Self::InvalidPayload(_) | Self::Config(_) | Self::Internal(_) | Self::Anyhow(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for ReceiverError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Request failed"
        );

        let body = Json(ErrorResponse {
            error: self.safe_message(),
            error_id,
        });

        (status, body).into_response()
    }
}

/// Result type alias for hookwise operations
pub type Result<T> = std::result::Result<T, ReceiverError>;

impl From<serde_json::Error> for ReceiverError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            ReceiverError::BadRequest(format!("JSON error: {}", err))
        } else {
            ReceiverError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}
