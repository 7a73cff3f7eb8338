use thiserror::Error;

/// Failure of a single call against the platform API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, reset, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status or `success: false`.
    #[error("API error ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body was not the expected JSON shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status to report for this failure (500 for anything that is not
    /// a server rejection).
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Rejected { status, .. } => *status,
            ApiError::Network(_) | ApiError::Parse(_) => 500,
        }
    }

    /// Whether the server explicitly refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}
