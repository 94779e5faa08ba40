use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CameraState {
    pub center: LatLng,
    pub zoom: f64,
}

/// Owns the map viewport.
///
/// Every render reads the stored state; data refreshes never compute a new
/// viewport. Writers are user interaction (pan/zoom end) and replay
/// recentring. The live feed is never handed a controller.
#[derive(Debug, Clone)]
pub struct CameraController {
    state: Arc<RwLock<CameraState>>,
}

impl CameraController {
    pub fn new(initial: CameraState) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn state(&self) -> CameraState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_state(&self, next: CameraState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Map became idle after the user panned or zoomed.
    pub fn on_user_interaction_end(&self, center: LatLng, zoom: f64) {
        log::debug!(
            "camera moved by user to {:.5},{:.5} z{}",
            center.lat,
            center.lng,
            zoom
        );
        self.set_state(CameraState { center, zoom });
    }

    /// Replay-only: move the center, keep the user's zoom.
    pub fn recenter(&self, center: LatLng) {
        self.state.write().unwrap_or_else(|e| e.into_inner()).center = center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_view() -> CameraState {
        CameraState {
            center: LatLng::new(20.59, 78.96),
            zoom: 5.0,
        }
    }

    #[test]
    fn user_interaction_replaces_viewport() {
        let camera = CameraController::new(default_view());
        camera.on_user_interaction_end(LatLng::new(12.9, 77.6), 14.0);
        assert_eq!(
            camera.state(),
            CameraState {
                center: LatLng::new(12.9, 77.6),
                zoom: 14.0
            }
        );
    }

    #[test]
    fn recenter_keeps_zoom_and_is_shared_between_clones() {
        let camera = CameraController::new(default_view());
        let replay_handle = camera.clone();
        camera.on_user_interaction_end(LatLng::new(0.0, 0.0), 11.0);
        replay_handle.recenter(LatLng::new(1.0, 2.0));

        let state = camera.state();
        assert_eq!(state.center, LatLng::new(1.0, 2.0));
        assert_eq!(state.zoom, 11.0);
    }
}
