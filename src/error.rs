use thiserror::Error;

/// Errors from the SHOWDESK gateway.
///
/// `Transport` covers everything that went wrong reaching the backend;
/// `Rejected` is the backend answering with `success: false` (or a non-2xx
/// status); `InvalidResponse` is a reply we could not make sense of.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request rejected by server: {detail}")]
    Rejected { detail: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Session controller errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Caller invoked an operation outside its stated preconditions
    /// (empty url, no active session, operation already in flight).
    #[error("Precondition violated: {0}")]
    Precondition(&'static str),
}

/// Screen capture errors. These never leave the capture pipeline.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
