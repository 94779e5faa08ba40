//! One-shot range query feeding the replay engine.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::backend::{BackendError, LocationApi};
use crate::model::LocationSample;
use crate::playback::PlaybackEngine;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("invalid range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
    #[error("entity id must not be empty")]
    MissingEntity,
    #[error(transparent)]
    Transport(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub entity_id: String,
    /// First day, inclusive.
    pub from: NaiveDate,
    /// Last day, inclusive.
    pub to: NaiveDate,
}

impl HistoryRequest {
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.entity_id.trim().is_empty() {
            return Err(HistoryError::MissingEntity);
        }
        if self.from > self.to {
            return Err(HistoryError::InvalidRange {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }
}

/// A successful query either has samples or reports that the range is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Samples(Vec<LocationSample>),
    NoData,
}

impl HistoryOutcome {
    /// Installs the samples into `engine`. An empty outcome leaves the
    /// engine as it was and returns false.
    pub fn load_into(self, engine: &mut PlaybackEngine) -> bool {
        match self {
            HistoryOutcome::Samples(samples) => {
                engine.load(samples);
                true
            }
            HistoryOutcome::NoData => false,
        }
    }
}

#[derive(Clone)]
pub struct HistoryQuery {
    api: Arc<dyn LocationApi>,
}

impl HistoryQuery {
    pub fn new(api: Arc<dyn LocationApi>) -> Self {
        Self { api }
    }

    pub async fn fetch(&self, request: &HistoryRequest) -> Result<HistoryOutcome, HistoryError> {
        request.validate()?;

        let samples = self
            .api
            .location_history(&request.entity_id, request.from, request.to)
            .await?;

        if samples.is_empty() {
            log::info!(
                "no location history for {} between {} and {}",
                request.entity_id,
                request.from,
                request.to
            );
            return Ok(HistoryOutcome::NoData);
        }

        if let Some(i) = first_out_of_order(&samples) {
            log::warn!(
                "history for {} is not chronological at index {}; replaying as received",
                request.entity_id,
                i
            );
        }
        Ok(HistoryOutcome::Samples(samples))
    }
}

fn first_out_of_order(samples: &[LocationSample]) -> Option<usize> {
    samples
        .windows(2)
        .position(|w| w[1].captured_at < w[0].captured_at)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EntityRecord;
    use crate::camera::{CameraController, CameraState};
    use crate::model::{parse_captured_at, LatLng};
    use crate::playback::{PlaybackSettings, PlaybackStatus};
    use crate::scheduler::VirtualScheduler;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedHistory {
        result: Mutex<Option<Result<Vec<LocationSample>, BackendError>>>,
        requested: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    }

    impl FixedHistory {
        fn new(result: Result<Vec<LocationSample>, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LocationApi for FixedHistory {
        async fn latest_locations(&self) -> Result<Vec<EntityRecord>, BackendError> {
            Ok(Vec::new())
        }

        async fn location_history(
            &self,
            entity_id: &str,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<LocationSample>, BackendError> {
            self.requested
                .lock()
                .unwrap()
                .push((entity_id.to_string(), from, to));
            self.result.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(from: &str, to: &str) -> HistoryRequest {
        HistoryRequest {
            entity_id: "42".into(),
            from: date(from),
            to: date(to),
        }
    }

    fn sample(ts: &str) -> LocationSample {
        LocationSample {
            entity_id: "42".into(),
            latitude: 1.0,
            longitude: 2.0,
            captured_at: parse_captured_at(ts).unwrap(),
            battery_percent: Some(55.0),
            connectivity_type: None,
            connectivity_status: None,
            accuracy: None,
            distance_from_previous_km: Some(0.3),
        }
    }

    fn engine() -> PlaybackEngine {
        let camera = CameraController::new(CameraState {
            center: LatLng::new(0.0, 0.0),
            zoom: 4.0,
        });
        PlaybackEngine::new(
            PlaybackSettings::default(),
            Arc::new(VirtualScheduler::new()),
            camera,
        )
    }

    #[tokio::test]
    async fn empty_range_is_no_data_and_engine_stays_unloaded() {
        let query = HistoryQuery::new(FixedHistory::new(Ok(Vec::new())));
        let outcome = query.fetch(&request("2024-01-01", "2024-01-03")).await.unwrap();
        assert_eq!(outcome, HistoryOutcome::NoData);

        let mut engine = engine();
        assert!(!outcome.load_into(&mut engine));
        assert!(!engine.is_loaded());
        assert_eq!(engine.status(), PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn samples_are_loaded_in_received_order() {
        let api = FixedHistory::new(Ok(vec![
            sample("10:00:00 2024-01-02"),
            sample("09:00:00 2024-01-02"),
        ]));
        let query = HistoryQuery::new(api.clone());
        let outcome = query.fetch(&request("2024-01-02", "2024-01-02")).await.unwrap();

        let mut engine = engine();
        assert!(outcome.load_into(&mut engine));
        let frame = engine.frame();
        assert_eq!(frame.total_samples, 2);
        assert_eq!(frame.status, PlaybackStatus::Idle);
        assert_eq!(
            api.requested.lock().unwrap()[0],
            ("42".to_string(), date("2024-01-02"), date("2024-01-02"))
        );
    }

    #[tokio::test]
    async fn transport_failure_is_distinct_from_no_data() {
        let query = HistoryQuery::new(FixedHistory::new(Err(BackendError::InvalidResponse {
            endpoint: "locations/history".into(),
            message: "eof".into(),
        })));
        let err = query.fetch(&request("2024-01-01", "2024-01-01")).await.unwrap_err();
        assert!(matches!(err, HistoryError::Transport(_)));
    }

    #[tokio::test]
    async fn reversed_range_is_rejected_before_any_request() {
        let api = FixedHistory::new(Ok(vec![sample("10:00:00 2024-01-02")]));
        let query = HistoryQuery::new(api.clone());
        let err = query.fetch(&request("2024-02-01", "2024-01-01")).await.unwrap_err();
        assert!(matches!(err, HistoryError::InvalidRange { .. }));
        assert!(api.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn detects_clock_regressions() {
        let ordered = [sample("09:00:00 2024-01-02"), sample("09:00:00 2024-01-02")];
        assert_eq!(first_out_of_order(&ordered), None);
        let regressed = [
            sample("09:00:00 2024-01-02"),
            sample("10:00:00 2024-01-02"),
            sample("08:00:00 2024-01-02"),
        ];
        assert_eq!(first_out_of_order(&regressed), Some(2));
    }
}
