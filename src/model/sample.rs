use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::parsing::captured_at_serde;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One timestamped GPS reading as reported by a field device.
///
/// The informational scalars are carried through untouched for display;
/// nothing in the engine interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub entity_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "captured_at_serde")]
    #[schema(value_type = String, example = "14:05:09 2024-03-18")]
    pub captured_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_previous_km: Option<f64>,
}

impl LocationSample {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Calendar date of the device timestamp.
    pub fn captured_on(&self) -> NaiveDate {
        self.captured_at.date()
    }
}
