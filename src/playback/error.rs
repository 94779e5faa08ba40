use thiserror::Error;

use super::PlaybackStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("no samples loaded")]
    NoSamples,
    #[error("cannot {action} while {status}")]
    InvalidTransition {
        action: &'static str,
        status: PlaybackStatus,
    },
    #[error("index {index} out of range for {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("speed must be a positive finite multiplier, got {0}")]
    InvalidSpeed(f64),
}
