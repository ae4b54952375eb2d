//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::NormalizeError;

/// How a site delivers its price markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// Price is present in the initially served document
    Static,
    /// Price is filled in by scripts after the initial load
    Dynamic,
}

/// One tracked storefront, validated at startup
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub name: String,
    pub url: String,
    pub price_selector: scraper::Selector,
    pub backup_selector: Option<scraper::Selector>,
    pub method: FetchMethod,
    pub wait_time_secs: u64,
}

/// A successfully normalized price reading for one site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceObservation {
    pub site: String,
    pub url: String,
    pub price: f64,
    /// Outside the configured plausible range; kept visible, never dropped
    pub suspect: bool,
    pub observed_at: DateTime<Utc>,
}

/// Why a site produced no observation this session
#[derive(Debug, Clone, PartialEq)]
pub enum MissKind {
    /// Neither the primary nor the backup locator matched
    LocatorMiss,
    /// Transport-level failure, message retained for the summary
    Fetch(String),
    /// A located value that did not normalize to a price
    Normalize(NormalizeError),
}

/// Per-site result of one collection pass
#[derive(Debug, Clone)]
pub enum SiteOutcome {
    Observed(PriceObservation),
    Miss(MissKind),
}

/// One site's entry in the session mapping, in check order
#[derive(Debug, Clone)]
pub struct SiteCheck {
    pub site: String,
    pub outcome: SiteOutcome,
}

impl SiteCheck {
    pub fn observation(&self) -> Option<&PriceObservation> {
        match &self.outcome {
            SiteOutcome::Observed(obs) => Some(obs),
            SiteOutcome::Miss(_) => None,
        }
    }
}

/// Derived view over the ledger, recomputed on demand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalStats {
    /// None until at least one record with a readable price exists
    pub lowest_ever: Option<f64>,
    pub total_records: usize,
}

impl HistoricalStats {
    pub fn no_data() -> Self {
        Self { lowest_ever: None, total_records: 0 }
    }
}

/// Durable form of an observation, one CSV row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub site: String,
    pub price: f64,
    pub is_new_low: bool,
    pub below_threshold: bool,
}

/// Why an alert fired, in fixed evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    AtOrBelowTarget,
    NewHistoricalLow,
    SignificantDrop,
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AlertReason::AtOrBelowTarget => "at/below target",
            AlertReason::NewHistoricalLow => "new historical low",
            AlertReason::SignificantDrop => "significant drop",
        };
        write!(f, "{label}")
    }
}

/// A qualifying deal for one site in one session
#[derive(Debug, Clone, Serialize)]
pub struct AlertDecision {
    pub site: String,
    pub price: f64,
    pub threshold: f64,
    pub historical_low: Option<f64>,
    pub reasons: Vec<AlertReason>,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}

impl AlertDecision {
    /// Reasons joined for human-facing output, rule order preserved
    pub fn reason_line(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
