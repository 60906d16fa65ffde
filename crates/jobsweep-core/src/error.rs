use std::fmt;

use thiserror::Error;

/// How a failed fetch should be handled by the retrying fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credential ran out of credits. Recovered by rotating credentials.
    QuotaExceeded,
    /// Credential is being throttled. Recovered by rotating credentials.
    RateLimited,
    /// Temporary failure. Recovered by a delayed retry with the same credential.
    Transient,
    /// Not worth retrying (malformed request, bad response, cancelled run).
    Fatal,
}

impl FailureKind {
    /// Returns true for the failures that are handled by credential rotation.
    pub fn rotates_credential(&self) -> bool {
        matches!(self, FailureKind::QuotaExceeded | FailureKind::RateLimited)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::QuotaExceeded => write!(f, "quota-exceeded"),
            FailureKind::RateLimited => write!(f, "rate-limited"),
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// Application-wide error types for jobsweep.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing configuration (e.g. no credentials). Aborts the run.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The extraction service reports the credential has no credits left.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The extraction service answered with a non-success status.
    #[error("HTTP error ({status_code}): {message}")]
    HttpError { status_code: u16, message: String },

    /// The request could not be built or was rejected as malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Persisting the final record set failed.
    #[error("Sink error: {0}")]
    SinkError(String),

    /// The run was cancelled while waiting or between pages.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Classify this error for the retrying fetcher.
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            AppError::RateLimitExceeded => FailureKind::RateLimited,
            AppError::Timeout(_) | AppError::NetworkError(_) => FailureKind::Transient,
            AppError::HttpError { status_code, .. } => {
                if *status_code == 408 || *status_code >= 500 {
                    FailureKind::Transient
                } else {
                    FailureKind::Fatal
                }
            }
            AppError::ConfigError(_)
            | AppError::InvalidRequest(_)
            | AppError::SerializationError(_)
            | AppError::SinkError(_)
            | AppError::Cancelled => FailureKind::Fatal,
        }
    }

    /// Returns true if this error is worth retrying at all.
    pub fn is_retryable(&self) -> bool {
        self.kind() != FailureKind::Fatal
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::SinkError(e.to_string())
    }
}
