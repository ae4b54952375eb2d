use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use super::{select_price_text, FetchAdapter};
use crate::errors::FetchError;
use crate::types::{FetchMethod, SiteProfile};

/// Attempts before giving the site up as absent this session
const RENDER_ATTEMPTS: u32 = 3;
/// Pause between attempts; total wait stays within the 15 s fetch budget
const RENDER_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fetcher for sites that fill the price in after the initial load.
///
/// Stands in for a scripted-browser wait: the page is re-requested a bounded
/// number of times with a pause in between, so the caller always gets text
/// or a bounded-time absence.
pub struct RenderedClient {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl RenderedClient {
    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self { client, timeout_secs }
    }

    async fn fetch_document(&self, profile: &SiteProfile) -> Result<String, FetchError> {
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

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))
    }
}

#[async_trait]
impl FetchAdapter for RenderedClient {
    fn method(&self) -> FetchMethod {
        FetchMethod::Dynamic
    }

    async fn fetch_price_text(&self, profile: &SiteProfile) -> Result<Option<String>, FetchError> {
        info!(site = %profile.name, "fetching with rendered method");

        for attempt in 1..=RENDER_ATTEMPTS {
            match self.fetch_document(profile).await {
                Ok(body) => {
                    if let Some(text) = select_price_text(&body, profile) {
                        return Ok(Some(text));
                    }
                    warn!(
                        site = %profile.name,
                        attempt,
                        "price element not present yet"
                    );
                }
                Err(e) => {
                    // Last attempt's transport error is the site's verdict
                    if attempt == RENDER_ATTEMPTS {
                        return Err(e);
                    }
                    warn!(site = %profile.name, attempt, error = %e, "fetch attempt failed");
                }
            }

            if attempt < RENDER_ATTEMPTS {
                sleep(RENDER_RETRY_DELAY).await;
            }
        }

        Ok(None)
    }
}
