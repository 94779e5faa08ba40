use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
}
