use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::error::IconError;

#[async_trait]
pub trait AvatarFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, IconError>;
}

pub struct HttpAvatarFetcher {
    http: Client,
}

impl HttpAvatarFetcher {
    pub fn new(timeout: Duration) -> Result<Self, IconError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl AvatarFetcher for HttpAvatarFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, IconError> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
