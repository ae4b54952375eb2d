// src/evaluate.rs
use crate::types::{AlertDecision, AlertReason, HistoricalStats, PriceObservation};

/// An undercut of more than 10% below the historical floor
const SIGNIFICANT_DROP_FACTOR: f64 = 0.9;

/// Apply every alert rule independently, in fixed order.
///
/// The rules are not mutually exclusive and never short-circuit; a price can
/// be at target, a new low, and a significant drop all at once.
pub fn evaluate(
    obs: &PriceObservation,
    stats: &HistoricalStats,
    threshold: f64,
) -> Vec<AlertReason> {
    let mut reasons = Vec::new();

    if obs.price <= threshold {
        reasons.push(AlertReason::AtOrBelowTarget);
    }

    if let Some(lowest) = stats.lowest_ever {
        if obs.price < lowest {
            reasons.push(AlertReason::NewHistoricalLow);
        }
        if obs.price < lowest * SIGNIFICANT_DROP_FACTOR {
            reasons.push(AlertReason::SignificantDrop);
        }
    }

    reasons
}

/// One alert decision per qualifying site, none when no rule matched
pub fn decide(
    obs: &PriceObservation,
    stats: &HistoricalStats,
    threshold: f64,
) -> Option<AlertDecision> {
    let reasons = evaluate(obs, stats, threshold);
    if reasons.is_empty() {
        return None;
    }

    Some(AlertDecision {
        site: obs.site.clone(),
        price: obs.price,
        threshold,
        historical_low: stats.lowest_ever,
        reasons,
        url: obs.url.clone(),
        detected_at: obs.observed_at,
    })
}
