//! Alert delivery channels

pub mod console;
pub mod webhook;

use async_trait::async_trait;
use tracing::info;

use crate::config::AlertCfg;
use crate::errors::NotifyError;
use crate::types::AlertDecision;
use console::ConsoleNotifier;
use webhook::WebhookNotifier;

/// Delivery seam for qualified deals
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &AlertDecision) -> Result<(), NotifyError>;
}

/// Pick the delivery channel from config.
/// Dry-run takes precedence and never touches a real channel.
pub fn create_notifier(cfg: &AlertCfg) -> Box<dyn Notifier> {
    if cfg.dry_run {
        return Box::new(DryRunNotifier);
    }
    match &cfg.webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url.clone())),
        None => Box::new(ConsoleNotifier::new()),
    }
}

/// Logs what would have been sent and stops there
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn send(&self, alert: &AlertDecision) -> Result<(), NotifyError> {
        info!(
            site = %alert.site,
            price = alert.price,
            reasons = %alert.reason_line(),
            "dry-run mode, would send alert"
        );
        Ok(())
    }
}
