use axum::{extract::State, Json};

use crate::camera::CameraState;
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/camera",
    responses(
        (status = 200, description = "Stored map viewport", body = CameraState)
    ),
    tag = "camera"
)]
pub async fn get_camera(State(state): State<AppState>) -> Json<CameraState> {
    Json(state.camera.state())
}

#[utoipa::path(
    put,
    path = "/api/camera",
    request_body = CameraState,
    responses(
        (status = 200, description = "Viewport captured after user pan/zoom", body = CameraState)
    ),
    tag = "camera"
)]
pub async fn put_camera(
    State(state): State<AppState>,
    Json(view): Json<CameraState>,
) -> Json<CameraState> {
    state.camera.on_user_interaction_end(view.center, view.zoom);
    Json(state.camera.state())
}
