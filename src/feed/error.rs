use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("live feed already running")]
    AlreadyRunning,
    #[error("live feed needs a tokio runtime to run its fetches")]
    NoRuntime,
}
