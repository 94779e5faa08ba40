use axum::{routing::get, routing::post, Router};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::backend::{HttpLocationApi, LocationApi};
use crate::camera::CameraController;
use crate::feed::{drive_icons, LiveFeed};
use crate::history::HistoryQuery;
use crate::icons::{HttpAvatarFetcher, IconCache};
use crate::scheduler::{Scheduler, TokioScheduler};

use super::api::camera as camera_handlers;
use super::api::live as live_handlers;
use super::api::replay as replay_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend client: {0}")]
    Backend(#[from] crate::backend::BackendError),
    #[error("avatar client: {0}")]
    Icons(#[from] crate::icons::IconError),
    #[error("live feed: {0}")]
    Feed(#[from] crate::feed::FeedError),
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/live", get(live_handlers::live))
        .route(
            "/api/camera",
            get(camera_handlers::get_camera).put(camera_handlers::put_camera),
        )
        .route(
            "/api/replay",
            get(replay_handlers::frame)
                .post(replay_handlers::load)
                .delete(replay_handlers::discard),
        )
        .route("/api/replay/play", post(replay_handlers::play))
        .route("/api/replay/pause", post(replay_handlers::pause))
        .route("/api/replay/reset", post(replay_handlers::reset))
        .route("/api/replay/seek", post(replay_handlers::seek))
        .route("/api/replay/speed", post(replay_handlers::speed))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();

    let api: Arc<dyn LocationApi> =
        Arc::new(HttpLocationApi::new(&config.api.base_url, config.api.timeout)?);
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(Handle::current()));
    let camera = CameraController::new(config.camera_state());
    let icons = IconCache::new(
        Arc::new(HttpAvatarFetcher::new(config.api.timeout)?),
        config.icons.size,
    );

    let mut feed = LiveFeed::new(api.clone(), scheduler.clone(), config.live.poll_interval);
    feed.start()?;
    tokio::spawn(drive_icons(feed.subscribe(), icons.clone()));

    let state = AppState {
        feed: feed.subscribe(),
        icons,
        camera,
        history: HistoryQuery::new(api),
        scheduler,
        playback: config.playback.settings(),
        replay: Arc::new(Mutex::new(None)),
        replay_generation: Arc::new(AtomicU64::new(0)),
    };

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await?;

    feed.stop();
    Ok(())
}
