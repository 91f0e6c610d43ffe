#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the credential; the session has been invalidated.
    #[error("unauthorized")]
    Unauthorized,

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
