use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::camera::CameraState;
use crate::feed::FeedSnapshot;
use crate::icons::MarkerIcon;
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveView {
    pub feed: FeedSnapshot,
    /// Keyed by entity id.
    pub icons: HashMap<String, MarkerIcon>,
    pub camera: CameraState,
}

#[utoipa::path(
    get,
    path = "/api/live",
    responses(
        (status = 200, description = "Latest positions of all tracked entities", body = LiveView)
    ),
    tag = "live"
)]
pub async fn live(State(state): State<AppState>) -> Json<LiveView> {
    let feed = state.feed.borrow().clone();
    Json(LiveView {
        feed,
        icons: state.icons.icons(),
        camera: state.camera.state(),
    })
}
