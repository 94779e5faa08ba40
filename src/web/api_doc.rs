use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::live::LiveView;
use super::api::replay::{SeekRequest, SpeedRequest};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::live::live,
        super::api::camera::get_camera,
        super::api::camera::put_camera,
        super::api::replay::load,
        super::api::replay::frame,
        super::api::replay::discard,
        super::api::replay::play,
        super::api::replay::pause,
        super::api::replay::reset,
        super::api::replay::seek,
        super::api::replay::speed,
    ),
    components(
        schemas(
            LiveView,
            SeekRequest,
            SpeedRequest,
            ErrorResponse,
            crate::camera::CameraState,
            crate::model::LatLng,
            crate::model::LocationSample,
            crate::model::TrackedEntity,
            crate::feed::FeedSnapshot,
            crate::icons::MarkerIcon,
            crate::history::HistoryRequest,
            crate::playback::PlaybackFrame,
            crate::playback::PlaybackStatus,
            crate::playback::StaticMarker,
            crate::playback::Progress,
        )
    ),
    info(
        title = "Fieldtrack Map API",
        description = "Live positions and historical replay for field staff",
        version = "0.1.0"
    ),
    tags(
        (name = "live", description = "Live tracking"),
        (name = "camera", description = "Map viewport"),
        (name = "replay", description = "Historical replay")
    )
)]
pub struct ApiDoc;
