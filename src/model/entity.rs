use serde::Serialize;
use utoipa::ToSchema;

use super::{LatLng, LocationSample};

/// A monitored field-staff member. Rebuilt from scratch on every feed tick.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub position: LatLng,
    /// Absent when the device reported a fix without a readable timestamp.
    pub latest_sample: Option<LocationSample>,
}
