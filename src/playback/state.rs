use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
    Completed,
}

/// Replay position. Only `Idle` lacks a current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing { index: usize },
    Paused { index: usize },
    Completed { index: usize },
}

impl PlaybackState {
    pub fn status(&self) -> PlaybackStatus {
        match self {
            PlaybackState::Idle => PlaybackStatus::Idle,
            PlaybackState::Playing { .. } => PlaybackStatus::Playing,
            PlaybackState::Paused { .. } => PlaybackStatus::Paused,
            PlaybackState::Completed { .. } => PlaybackStatus::Completed,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match *self {
            PlaybackState::Idle => None,
            PlaybackState::Playing { index }
            | PlaybackState::Paused { index }
            | PlaybackState::Completed { index } => Some(index),
        }
    }
}
