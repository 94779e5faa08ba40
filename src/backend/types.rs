use serde::Deserialize;

use crate::model::{parse_captured_at, LatLng, LocationSample, TrackedEntity};

/// Entry of the latest-locations listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub latest_sample: Option<RawSample>,
}

/// A latest-location sample as the backend sends it. Coordinates may be
/// missing when a device has not reported a fix yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub captured_at: Option<String>,
    #[serde(default)]
    pub battery_percent: Option<f64>,
    #[serde(default)]
    pub connectivity_type: Option<String>,
    #[serde(default)]
    pub connectivity_status: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub distance_from_previous_km: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub locations: Vec<LocationSample>,
}

impl RawSample {
    /// `None` unless both coordinates are present and finite.
    pub fn position(&self) -> Option<LatLng> {
        let latitude = self.latitude.filter(|v| v.is_finite())?;
        let longitude = self.longitude.filter(|v| v.is_finite())?;
        Some(LatLng::new(latitude, longitude))
    }

    /// `None` unless both coordinates and a readable timestamp are present.
    pub fn into_sample(self, entity_id: &str) -> Option<LocationSample> {
        let latitude = self.latitude.filter(|v| v.is_finite())?;
        let longitude = self.longitude.filter(|v| v.is_finite())?;
        let captured_at = self.captured_at.as_deref().and_then(parse_captured_at)?;

        Some(LocationSample {
            entity_id: entity_id.to_string(),
            latitude,
            longitude,
            captured_at,
            battery_percent: self.battery_percent,
            connectivity_type: self.connectivity_type,
            connectivity_status: self.connectivity_status,
            accuracy: self.accuracy,
            distance_from_previous_km: self.distance_from_previous_km,
        })
    }
}

impl EntityRecord {
    /// Converts to a tracked entity, dropping records without coordinates.
    /// A fix whose `capturedAt` cannot be read keeps its position but
    /// carries no sample.
    pub fn into_tracked(self) -> Option<TrackedEntity> {
        let raw = self.latest_sample?;
        let position = raw.position()?;
        let captured_at = raw.captured_at.clone();
        let sample = raw.into_sample(&self.id);
        if sample.is_none() {
            log::warn!(
                "entity {} has unreadable capturedAt {:?}; showing position only",
                self.id,
                captured_at
            );
        }
        Some(TrackedEntity {
            id: self.id,
            display_name: self.display_name,
            avatar_url: self.avatar_url.filter(|u| !u.trim().is_empty()),
            position,
            latest_sample: sample,
        })
    }
}
