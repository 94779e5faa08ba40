use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

use super::error::BackendError;
use super::types::{EntityRecord, HistoryResponse};
use super::LocationApi;
use crate::model::LocationSample;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct HttpLocationApi {
    base_url: String,
    http: Client,
}

impl HttpLocationApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl LocationApi for HttpLocationApi {
    async fn latest_locations(&self) -> Result<Vec<EntityRecord>, BackendError> {
        let url = self.endpoint("locations/latest");
        log::debug!("GET {}", url);
        let records = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<EntityRecord>>()
            .await?;
        Ok(records)
    }

    async fn location_history(
        &self,
        entity_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LocationSample>, BackendError> {
        let url = self.endpoint("locations/history");
        let from = from.format(DATE_FORMAT).to_string();
        let to = to.format(DATE_FORMAT).to_string();
        log::debug!("GET {} entity={} from={} to={}", url, entity_id, from, to);

        let body = self
            .http
            .get(&url)
            .query(&[("entityId", entity_id), ("from", from.as_str()), ("to", to.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let parsed: HistoryResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::InvalidResponse {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;
        Ok(parsed.locations)
    }
}
