use axum::http::StatusCode;
use thiserror::Error;
use tokio::sync::AcquireError;

/// Classified failure of a capture call or an artifact operation.
///
/// Every variant carries a human readable message that ends up in the
/// `detail` field of the HTTP error body.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch target: {0}")]
    Fetch(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Capture engine error: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CaptureError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Errors caused by the request or by the target site rather than by this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CaptureError::InvalidInput(_) | CaptureError::Fetch(_) | CaptureError::NotFound(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CaptureError::InvalidInput(_) | CaptureError::Fetch(_) => StatusCode::BAD_REQUEST,
            CaptureError::NotFound(_) => StatusCode::NOT_FOUND,
            CaptureError::Render(_)
            | CaptureError::Engine(_)
            | CaptureError::Storage(_)
            | CaptureError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::InvalidInput(_) => "invalid_input",
            CaptureError::Fetch(_) => "fetch",
            CaptureError::Render(_) => "render",
            CaptureError::Engine(_) => "engine",
            CaptureError::Storage(_) => "storage",
            CaptureError::NotFound(_) => "not_found",
            CaptureError::Configuration(_) => "configuration",
        }
    }
}

impl From<AcquireError> for CaptureError {
    fn from(err: AcquireError) -> Self {
        CaptureError::Engine(format!("capture slot unavailable: {err}"))
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::Configuration(err.to_string())
    }
}
