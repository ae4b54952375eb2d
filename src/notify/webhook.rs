use async_trait::async_trait;
use tracing::info;

use super::Notifier;
use crate::errors::NotifyError;
use crate::types::AlertDecision;

/// POSTs the alert payload as JSON to a configured endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, alert: &AlertDecision) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook returned status {status}"
            )));
        }

        info!(site = %alert.site, price = alert.price, "alert delivered to webhook");
        Ok(())
    }
}
