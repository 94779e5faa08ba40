//! Boundary to the dashboard REST backend.
//!
//! Only the two location endpoints the engine consumes are modelled here;
//! everything else the backend serves is handled elsewhere.

mod client;
mod error;
mod types;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::LocationSample;

pub use client::HttpLocationApi;
pub use error::BackendError;
pub use types::{EntityRecord, HistoryResponse, RawSample};

#[async_trait]
pub trait LocationApi: Send + Sync {
    /// Latest known sample for every tracked entity.
    async fn latest_locations(&self) -> Result<Vec<EntityRecord>, BackendError>;

    /// Ordered samples for one entity between two dates, both inclusive.
    async fn location_history(
        &self,
        entity_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LocationSample>, BackendError>;
}
