use std::sync::atomic::Ordering;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::history::{HistoryOutcome, HistoryRequest};
use crate::playback::{PlaybackEngine, PlaybackError, PlaybackFrame};
use crate::web::api::error::{ErrorResponse, ServiceError, ServiceResult};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SeekRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SpeedRequest {
    pub multiplier: f64,
}

#[utoipa::path(
    post,
    path = "/api/replay",
    request_body = HistoryRequest,
    responses(
        (status = 200, description = "New replay session loaded", body = PlaybackFrame),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 404, description = "No data for this range", body = ErrorResponse),
        (status = 409, description = "Superseded by a newer selection", body = ErrorResponse),
        (status = 502, description = "Backend unreachable", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn load(
    State(state): State<AppState>,
    Json(request): Json<HistoryRequest>,
) -> ServiceResult<Json<PlaybackFrame>> {
    // A new selection always ends the previous session, even if the query fails.
    let generation = {
        let mut replay = state.replay.lock().await;
        replay.take();
        state.replay_generation.fetch_add(1, Ordering::SeqCst) + 1
    };

    let outcome = state.history.fetch(&request).await?;
    let mut engine = state.new_engine();
    if !outcome.load_into(&mut engine) {
        return Err(ServiceError::NoData);
    }

    let mut replay = state.replay.lock().await;
    if state.replay_generation.load(Ordering::SeqCst) != generation {
        log::debug!(
            "dropping replay selection for {} superseded by a newer one",
            request.entity_id
        );
        return Err(ServiceError::Conflict(
            "superseded by a newer replay selection".into(),
        ));
    }
    let frame = engine.frame();
    *replay = Some(engine);
    Ok(Json(frame))
}

#[utoipa::path(
    get,
    path = "/api/replay",
    responses(
        (status = 200, description = "Current replay frame", body = PlaybackFrame),
        (status = 404, description = "No active replay", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn frame(State(state): State<AppState>) -> ServiceResult<Json<PlaybackFrame>> {
    with_engine(&state, |engine| Ok(engine.frame())).await
}

#[utoipa::path(
    delete,
    path = "/api/replay",
    responses(
        (status = 204, description = "Replay session discarded")
    ),
    tag = "replay"
)]
pub async fn discard(State(state): State<AppState>) -> StatusCode {
    if let Some(engine) = state.replay.lock().await.take() {
        log::info!("replay session {} discarded", engine.session_id());
    }
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/api/replay/play",
    responses(
        (status = 200, description = "Playing", body = PlaybackFrame),
        (status = 404, description = "No active replay", body = ErrorResponse),
        (status = 409, description = "Not idle or paused", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn play(State(state): State<AppState>) -> ServiceResult<Json<PlaybackFrame>> {
    with_engine(&state, PlaybackEngine::play).await
}

#[utoipa::path(
    post,
    path = "/api/replay/pause",
    responses(
        (status = 200, description = "Paused", body = PlaybackFrame),
        (status = 404, description = "No active replay", body = ErrorResponse),
        (status = 409, description = "Not playing", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn pause(State(state): State<AppState>) -> ServiceResult<Json<PlaybackFrame>> {
    with_engine(&state, PlaybackEngine::pause).await
}

#[utoipa::path(
    post,
    path = "/api/replay/reset",
    responses(
        (status = 200, description = "Back to idle", body = PlaybackFrame),
        (status = 404, description = "No active replay", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn reset(State(state): State<AppState>) -> ServiceResult<Json<PlaybackFrame>> {
    with_engine(&state, PlaybackEngine::reset).await
}

#[utoipa::path(
    post,
    path = "/api/replay/seek",
    request_body = SeekRequest,
    responses(
        (status = 200, description = "Paused at index", body = PlaybackFrame),
        (status = 400, description = "Index out of range", body = ErrorResponse),
        (status = 404, description = "No active replay", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn seek(
    State(state): State<AppState>,
    Json(request): Json<SeekRequest>,
) -> ServiceResult<Json<PlaybackFrame>> {
    with_engine(&state, |engine| engine.seek(request.index)).await
}

#[utoipa::path(
    post,
    path = "/api/replay/speed",
    request_body = SpeedRequest,
    responses(
        (status = 200, description = "Speed changed", body = PlaybackFrame),
        (status = 400, description = "Speed not positive", body = ErrorResponse),
        (status = 404, description = "No active replay", body = ErrorResponse)
    ),
    tag = "replay"
)]
pub async fn speed(
    State(state): State<AppState>,
    Json(request): Json<SpeedRequest>,
) -> ServiceResult<Json<PlaybackFrame>> {
    with_engine(&state, |engine| engine.set_speed(request.multiplier)).await
}

async fn with_engine<F>(state: &AppState, action: F) -> ServiceResult<Json<PlaybackFrame>>
where
    F: FnOnce(&mut PlaybackEngine) -> Result<PlaybackFrame, PlaybackError>,
{
    let mut replay = state.replay.lock().await;
    let engine = replay.as_mut().ok_or(ServiceError::NoSession)?;
    Ok(Json(action(engine)?))
}
