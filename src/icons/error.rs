use thiserror::Error;

#[derive(Debug, Error)]
pub enum IconError {
    #[error("avatar fetch failed: {0}")]
    Fetch(String),
    #[error("avatar decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("avatar has no pixels")]
    EmptyImage,
    #[error("icon render task failed: {0}")]
    Render(String),
}

impl From<reqwest::Error> for IconError {
    fn from(err: reqwest::Error) -> Self {
        IconError::Fetch(err.to_string())
    }
}
