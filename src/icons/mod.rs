//! Marker icons: circular, cover-fit crops of each entity's avatar.
//!
//! Rendering failures never reach the caller; the icon degrades to the
//! original avatar URL. Every request carries a generation token and a
//! finished render is only stored if its token is still the newest one for
//! that entity, so a slow fetch cannot overwrite a newer icon or resurrect
//! an entity that has left the set.

mod error;
mod fetch;
mod render;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinSet;
use utoipa::ToSchema;

use crate::model::TrackedEntity;

pub use error::IconError;
pub use fetch::{AvatarFetcher, HttpAvatarFetcher};
pub use render::{cover_fit, png_data_url, render_circular_png, CoverFit};

pub const DEFAULT_ICON_SIZE: u32 = 72;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerIcon {
    Rendered { data_url: String },
    Fallback { url: String },
}

impl MarkerIcon {
    /// Value for the marker's image source.
    pub fn src(&self) -> &str {
        match self {
            MarkerIcon::Rendered { data_url } => data_url,
            MarkerIcon::Fallback { url } => url,
        }
    }
}

#[derive(Default)]
struct IconState {
    next_token: u64,
    revision: Option<u64>,
    pending: HashMap<String, u64>,
    icons: HashMap<String, MarkerIcon>,
}

#[derive(Clone)]
pub struct IconCache {
    fetcher: Arc<dyn AvatarFetcher>,
    size: u32,
    state: Arc<Mutex<IconState>>,
}

impl IconCache {
    pub fn new(fetcher: Arc<dyn AvatarFetcher>, size: u32) -> Self {
        Self {
            fetcher,
            size,
            state: Arc::new(Mutex::new(IconState::default())),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn icon(&self, entity_id: &str) -> Option<MarkerIcon> {
        self.lock().icons.get(entity_id).cloned()
    }

    pub fn icons(&self) -> HashMap<String, MarkerIcon> {
        self.lock().icons.clone()
    }

    /// Rebuilds icons for the whole entity set when `revision` differs from
    /// the last one seen. Entities that left the set lose their icon.
    pub async fn sync(&self, revision: u64, entities: &[TrackedEntity]) {
        let jobs: Vec<(String, String, u64)> = {
            let mut state = self.lock();
            if state.revision == Some(revision) {
                return;
            }
            state.revision = Some(revision);

            let present: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
            state.icons.retain(|id, _| present.contains(id.as_str()));
            state.pending.retain(|id, _| present.contains(id.as_str()));

            let mut jobs = Vec::new();
            for entity in entities {
                match &entity.avatar_url {
                    Some(url) => {
                        let token = issue_token(&mut state, &entity.id);
                        jobs.push((entity.id.clone(), url.clone(), token));
                    }
                    None => {
                        state.icons.remove(&entity.id);
                        state.pending.remove(&entity.id);
                    }
                }
            }
            jobs
        };

        log::debug!("rebuilding {} marker icons (revision {})", jobs.len(), revision);

        let mut tasks = JoinSet::new();
        for (entity_id, url, token) in jobs {
            let cache = self.clone();
            tasks.spawn(async move {
                let icon = cache.build(&url).await;
                cache.apply(&entity_id, token, icon);
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    /// Builds and stores one icon. Returns false if a newer request for the
    /// same entity superseded this one while it was in flight.
    pub async fn prepare(&self, entity_id: &str, avatar_url: &str) -> bool {
        let token = issue_token(&mut self.lock(), entity_id);
        let icon = self.build(avatar_url).await;
        self.apply(entity_id, token, icon)
    }

    /// Drops every icon and invalidates in-flight renders.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.icons.clear();
        state.pending.clear();
        state.revision = None;
    }

    async fn build(&self, url: &str) -> MarkerIcon {
        match self.render(url).await {
            Ok(data_url) => MarkerIcon::Rendered { data_url },
            Err(e) => {
                log::warn!("marker icon for {} falls back to source url: {}", url, e);
                MarkerIcon::Fallback {
                    url: url.to_string(),
                }
            }
        }
    }

    async fn render(&self, url: &str) -> Result<String, IconError> {
        let bytes = self.fetcher.fetch(url).await?;
        let size = self.size;
        let png = tokio::task::spawn_blocking(move || render_circular_png(&bytes, size))
            .await
            .map_err(|e| IconError::Render(e.to_string()))??;
        Ok(png_data_url(&png))
    }

    fn apply(&self, entity_id: &str, token: u64, icon: MarkerIcon) -> bool {
        let mut state = self.lock();
        if state.pending.get(entity_id) != Some(&token) {
            log::debug!("discarding stale icon for {} (token {})", entity_id, token);
            return false;
        }
        state.pending.remove(entity_id);
        state.icons.insert(entity_id.to_string(), icon);
        true
    }

    fn lock(&self) -> MutexGuard<'_, IconState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn issue_token(state: &mut IconState, entity_id: &str) -> u64 {
    state.next_token += 1;
    let token = state.next_token;
    state.pending.insert(entity_id.to_string(), token);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use crate::model::LatLng;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeFetcher {
        images: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn with(urls: &[&str]) -> Arc<Self> {
            let img = RgbaImage::from_pixel(40, 80, Rgba([10, 120, 240, 255]));
            let mut png = Cursor::new(Vec::new());
            DynamicImage::ImageRgba8(img)
                .write_to(&mut png, ImageFormat::Png)
                .unwrap();
            let bytes = png.into_inner();
            Arc::new(Self {
                images: urls.iter().map(|u| (u.to_string(), bytes.clone())).collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AvatarFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, IconError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.images
                .get(url)
                .cloned()
                .ok_or_else(|| IconError::Fetch(format!("404 {}", url)))
        }
    }

    fn entity(id: &str, avatar: Option<&str>) -> TrackedEntity {
        TrackedEntity {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            avatar_url: avatar.map(String::from),
            position: LatLng::new(0.0, 0.0),
            latest_sample: None,
        }
    }

    #[tokio::test]
    async fn sync_renders_and_falls_back() {
        let fetcher = FakeFetcher::with(&["http://cdn/a.png"]);
        let cache = IconCache::new(fetcher, DEFAULT_ICON_SIZE);
        cache
            .sync(
                1,
                &[
                    entity("a", Some("http://cdn/a.png")),
                    entity("b", Some("http://cdn/missing.png")),
                    entity("c", None),
                ],
            )
            .await;

        assert!(cache.icon("a").unwrap().src().starts_with("data:image/png;base64,"));
        assert_eq!(
            cache.icon("b"),
            Some(MarkerIcon::Fallback {
                url: "http://cdn/missing.png".into()
            })
        );
        assert!(cache.icon("c").is_none());
    }

    #[tokio::test]
    async fn same_revision_is_not_recomputed() {
        let fetcher = FakeFetcher::with(&["http://cdn/a.png"]);
        let cache = IconCache::new(fetcher.clone(), 16);
        let set = [entity("a", Some("http://cdn/a.png"))];

        cache.sync(4, &set).await;
        cache.sync(4, &set).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        cache.sync(5, &set).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn departed_entities_lose_their_icon() {
        let fetcher = FakeFetcher::with(&["http://cdn/a.png", "http://cdn/b.png"]);
        let cache = IconCache::new(fetcher, 16);
        cache
            .sync(
                1,
                &[
                    entity("a", Some("http://cdn/a.png")),
                    entity("b", Some("http://cdn/b.png")),
                ],
            )
            .await;
        cache.sync(2, &[entity("b", Some("http://cdn/b.png"))]).await;

        let icons = cache.icons();
        assert_eq!(icons.len(), 1);
        assert!(icons.contains_key("b"));
    }

    #[test]
    fn superseded_request_is_discarded() {
        let cache = IconCache::new(FakeFetcher::with(&[]), 16);
        let first = issue_token(&mut cache.lock(), "a");
        let second = issue_token(&mut cache.lock(), "a");

        let newer = MarkerIcon::Fallback { url: "new".into() };
        let older = MarkerIcon::Fallback { url: "old".into() };
        assert!(cache.apply("a", second, newer.clone()));
        assert!(!cache.apply("a", first, older));
        assert_eq!(cache.icon("a"), Some(newer));
    }

    #[test]
    fn clear_invalidates_in_flight_requests() {
        let cache = IconCache::new(FakeFetcher::with(&[]), 16);
        let token = issue_token(&mut cache.lock(), "a");
        cache.clear();
        assert!(!cache.apply("a", token, MarkerIcon::Fallback { url: "x".into() }));
        assert!(cache.icons().is_empty());
    }

    #[tokio::test]
    async fn prepare_stores_single_icon() {
        let cache = IconCache::new(FakeFetcher::with(&["http://cdn/z.png"]), 24);
        assert!(cache.prepare("z", "http://cdn/z.png").await);
        assert!(matches!(cache.icon("z"), Some(MarkerIcon::Rendered { .. })));
    }
}
