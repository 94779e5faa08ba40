use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::camera::CameraController;
use crate::feed::FeedSnapshot;
use crate::history::HistoryQuery;
use crate::icons::IconCache;
use crate::playback::{PlaybackEngine, PlaybackSettings};
use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub feed: watch::Receiver<FeedSnapshot>,
    pub icons: IconCache,
    pub camera: CameraController,
    pub history: HistoryQuery,
    pub scheduler: Arc<dyn Scheduler>,
    pub playback: PlaybackSettings,
    /// The single active replay, if any.
    pub replay: Arc<Mutex<Option<PlaybackEngine>>>,
    /// Bumped under the `replay` lock by every selection; only the latest
    /// selection may install its session.
    pub replay_generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new_engine(&self) -> PlaybackEngine {
        PlaybackEngine::new(self.playback, self.scheduler.clone(), self.camera.clone())
    }
}
