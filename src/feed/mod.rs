//! Near-real-time view of every tracked entity's latest position.
//!
//! Polls on a fixed interval and republishes the whole entity set on each
//! successful fetch. Fetches are spawned, not awaited against each other, so
//! a slow response can land after a newer one; the set then briefly shows
//! the older data until the next tick.

mod error;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::backend::{BackendError, EntityRecord, LocationApi};
use crate::icons::IconCache;
use crate::model::TrackedEntity;
use crate::scheduler::{CancelHandle, Scheduler};

pub use error::FeedError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    /// Bumped on every successful replacement of `entities`.
    pub revision: u64,
    pub entities: Vec<TrackedEntity>,
    /// Last fetch failure, cleared by the next successful fetch.
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct LiveFeed {
    api: Arc<dyn LocationApi>,
    scheduler: Arc<dyn Scheduler>,
    interval: Duration,
    tx: Arc<watch::Sender<FeedSnapshot>>,
    poller: Option<CancelHandle>,
}

impl LiveFeed {
    pub fn new(
        api: Arc<dyn LocationApi>,
        scheduler: Arc<dyn Scheduler>,
        interval: Duration,
    ) -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::default());
        Self {
            api,
            scheduler,
            interval,
            tx: Arc::new(tx),
            poller: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_cancelled())
    }

    /// Fetches once right away, then every interval until [`LiveFeed::stop`].
    pub fn start(&mut self) -> Result<(), FeedError> {
        if self.is_running() {
            return Err(FeedError::AlreadyRunning);
        }
        let runtime = Handle::try_current().map_err(|_| FeedError::NoRuntime)?;

        log::info!("live feed polling every {:?}", self.interval);

        let api = self.api.clone();
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let _ = refresh(api.as_ref(), &tx).await;
        });

        let api = self.api.clone();
        let tx = self.tx.clone();
        let poller = self.scheduler.schedule_repeating(
            self.interval,
            Box::new(move || {
                let api = api.clone();
                let tx = tx.clone();
                runtime.spawn(async move {
                    let _ = refresh(api.as_ref(), &tx).await;
                });
                std::ops::ControlFlow::Continue(())
            }),
        );
        self.poller = Some(poller);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
            log::info!("live feed stopped");
        }
    }

    /// One fetch outside the timer, applied exactly as a tick would apply it.
    pub async fn poll_once(&self) -> Result<usize, BackendError> {
        refresh(self.api.as_ref(), &self.tx).await
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Rebuilds marker icons whenever the published entity set changes.
/// Returns when the feed is dropped.
pub async fn drive_icons(mut rx: watch::Receiver<FeedSnapshot>, icons: IconCache) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.revision > 0 {
            icons.sync(snapshot.revision, &snapshot.entities).await;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn refresh(
    api: &dyn LocationApi,
    tx: &watch::Sender<FeedSnapshot>,
) -> Result<usize, BackendError> {
    match api.latest_locations().await {
        Ok(records) => {
            let received = records.len();
            let entities: Vec<TrackedEntity> = records
                .into_iter()
                .filter_map(EntityRecord::into_tracked)
                .collect();
            let published = entities.len();
            if published < received {
                log::debug!(
                    "live feed dropped {} entities without coordinates",
                    received - published
                );
            }

            tx.send_modify(|snapshot| {
                snapshot.revision += 1;
                snapshot.entities = entities;
                snapshot.error = None;
                snapshot.updated_at = Some(Utc::now());
            });
            Ok(published)
        }
        Err(e) => {
            log::warn!("live feed fetch failed: {}", e);
            let message = e.to_string();
            tx.send_modify(|snapshot| snapshot.error = Some(message));
            Err(e)
        }
    }
}
