use async_trait::async_trait;
use tracing::info;

use super::Notifier;
use crate::errors::NotifyError;
use crate::types::AlertDecision;

/// Prints the alert to the terminal; the fallback when no webhook is set
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, alert: &AlertDecision) -> Result<(), NotifyError> {
        println!("🎯 Deal alert: {}", alert.site);
        println!("   💰 Current price: ₹{:.2}", alert.price);
        println!("   🎯 Your target: ₹{:.2}", alert.threshold);
        match alert.historical_low {
            Some(low) => println!("   📈 Historical low: ₹{low:.2}"),
            None => println!("   📈 Historical low: no previous data"),
        }
        println!("   🔥 Reason: {}", alert.reason_line());
        println!("   🛒 {}", alert.url);

        info!(site = %alert.site, "alert sent to console");
        Ok(())
    }
}
