use async_trait::async_trait;
use tracing::info;

use super::{select_price_text, FetchAdapter};
use crate::errors::FetchError;
use crate::types::{FetchMethod, SiteProfile};

/// Fetcher for sites that serve the price in the initial document
pub struct StaticClient {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl StaticClient {
    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self { client, timeout_secs }
    }
}

#[async_trait]
impl FetchAdapter for StaticClient {
    fn method(&self) -> FetchMethod {
        FetchMethod::Static
    }

    async fn fetch_price_text(&self, profile: &SiteProfile) -> Result<Option<String>, FetchError> {
        info!(site = %profile.name, "fetching with static method");

        let response = self
            .client
            .get(&profile.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout_secs)
                } else {
                    FetchError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(select_price_text(&body, profile))
    }
}
