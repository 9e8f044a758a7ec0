use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CollectError {
    /// Transport failures and error statuses are worth retrying; a response
    /// that arrived but does not parse is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            Self::Server { .. } => true,
            Self::Json(_) => false,
        }
    }
}
