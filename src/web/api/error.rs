use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::history::HistoryError;
use crate::playback::PlaybackError;

#[derive(Debug)]
pub enum ServiceError {
    Validation(String),
    NoData,
    NoSession,
    Conflict(String),
    Transport(String),
}

impl From<PlaybackError> for ServiceError {
    fn from(e: PlaybackError) -> Self {
        match e {
            PlaybackError::IndexOutOfRange { .. } | PlaybackError::InvalidSpeed(_) => {
                ServiceError::Validation(e.to_string())
            }
            PlaybackError::NoSamples | PlaybackError::InvalidTransition { .. } => {
                ServiceError::Conflict(e.to_string())
            }
        }
    }
}

impl From<HistoryError> for ServiceError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::InvalidRange { .. } | HistoryError::MissingEntity => {
                ServiceError::Validation(e.to_string())
            }
            HistoryError::Transport(inner) => ServiceError::Transport(inner.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ServiceError::NoData => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_message(
                    "no_data_for_range",
                    "no location data for this range",
                )),
            )
                .into_response(),
            ServiceError::NoSession => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("no_replay_session")),
            )
                .into_response(),
            ServiceError::Conflict(msg) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::with_message("invalid_transition", &msg)),
            )
                .into_response(),
            ServiceError::Transport(msg) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::with_message("transport_error", &msg)),
            )
                .into_response(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
