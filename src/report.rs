// src/report.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{HistoricalStats, MissKind, SiteCheck, SiteOutcome};

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub product: String,
    pub threshold: f64,
    pub historical_low: Option<f64>,

    /// Retrieved prices, sorted ascending
    pub prices: Vec<PriceLine>,
    /// Sites that produced no observation this session
    pub unavailable: Vec<UnavailableLine>,

    pub alerts_sent: usize,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PriceLine {
    pub site: String,
    pub price: f64,
    pub below_threshold: bool,
    pub suspect: bool,
}

#[derive(Debug, Serialize)]
pub struct UnavailableLine {
    pub site: String,
    pub reason: String,
}

impl SessionReport {
    pub fn new(
        product: &str,
        checks: &[SiteCheck],
        stats: &HistoricalStats,
        threshold: f64,
        alerts_sent: usize,
    ) -> Self {
        let mut prices = Vec::new();
        let mut unavailable = Vec::new();

        for check in checks {
            match &check.outcome {
                SiteOutcome::Observed(obs) => prices.push(PriceLine {
                    site: check.site.clone(),
                    price: obs.price,
                    below_threshold: obs.price <= threshold,
                    suspect: obs.suspect,
                }),
                SiteOutcome::Miss(kind) => unavailable.push(UnavailableLine {
                    site: check.site.clone(),
                    reason: miss_reason(kind),
                }),
            }
        }
        prices.sort_by(|a, b| a.price.total_cmp(&b.price));

        Self {
            product: product.to_string(),
            threshold,
            historical_low: stats.lowest_ever,
            prices,
            unavailable,
            alerts_sent,
            completed_at: Utc::now(),
        }
    }

    pub fn best(&self) -> Option<&PriceLine> {
        self.prices.first()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Console summary of the session, mirroring what the JSON form carries
    pub fn print(&self) {
        println!();
        println!("{}", "=".repeat(60));
        println!("🔍 {} PRICE SUMMARY", self.product.to_uppercase());
        println!("{}", "=".repeat(60));

        match self.best() {
            Some(best) => {
                println!("🏆 Best current price: ₹{:.2} at {}", best.price, best.site)
            }
            None => println!("❌ No prices were successfully retrieved"),
        }
        println!("🎯 Your target price: ₹{:.2}", self.threshold);
        match self.historical_low {
            Some(low) => println!("📊 Historical low: ₹{low:.2}"),
            None => println!("📊 Historical low: no previous data"),
        }

        if !self.prices.is_empty() {
            println!("\n📋 All current prices (sorted):");
            for line in &self.prices {
                let marker = if line.below_threshold { "🔥" } else { "💰" };
                let suspect = if line.suspect { " (suspect)" } else { "" };
                println!("  {marker} {}: ₹{:.2}{suspect}", line.site, line.price);
            }
        }

        if !self.unavailable.is_empty() {
            println!("\n🚫 Unavailable this session:");
            for line in &self.unavailable {
                println!("  ✗ {}: {}", line.site, line.reason);
            }
        }

        if self.alerts_sent > 0 {
            println!("\n🎉 {} price alert(s) sent!", self.alerts_sent);
        } else {
            println!("\n😌 No alerts triggered this time");
        }
        println!("{}", "=".repeat(60));
    }
}

fn miss_reason(kind: &MissKind) -> String {
    match kind {
        MissKind::LocatorMiss => "price element not found".to_string(),
        MissKind::Fetch(msg) => format!("fetch failed: {msg}"),
        MissKind::Normalize(e) => format!("could not extract price: {e}"),
    }
}
