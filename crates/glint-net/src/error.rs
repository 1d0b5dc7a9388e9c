use thiserror::Error;

/// Errors surfaced by the REST collaborator.
///
/// These are returned to the caller of the failing operation and never
/// retried by the core; a failed call leaves the stores untouched.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, TLS, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the backend.
    #[error("API returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// 2xx response whose envelope reported `success: false`.
    #[error("API rejected the request: {0}")]
    Rejected(String),

    /// 2xx response with a well-formed envelope but no payload.
    #[error("API response carried no data")]
    MissingData,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
