// src/normalize.rs
use serde::Deserialize;
use tracing::warn;

use crate::errors::NormalizeError;

/// Locale-specific markers to strip plus the plausible price band
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeRules {
    #[serde(default = "default_markers")]
    pub currency_markers: Vec<String>,
    pub plausible_min: f64,
    pub plausible_max: f64,
}

fn default_markers() -> Vec<String> {
    vec!["₹".to_string(), "Rs".to_string(), "INR".to_string()]
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self {
            currency_markers: default_markers(),
            plausible_min: 5000.0,
            plausible_max: 15000.0,
        }
    }
}

/// A parsed price, possibly flagged as outside the plausible band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPrice {
    pub value: f64,
    pub suspect: bool,
}

/// Turn raw price text like "₹8,999.00" into a numeric price.
///
/// The first numeric token wins: price text conventionally leads with the
/// headline figure, and later numbers are usually strikethrough originals or
/// tax annotations. Out-of-band values are returned flagged, never dropped.
pub fn normalize(text: &str, rules: &NormalizeRules) -> Result<NormalizedPrice, NormalizeError> {
    if text.trim().is_empty() {
        return Err(NormalizeError::EmptyInput);
    }

    let mut cleaned = text.to_string();
    for marker in &rules.currency_markers {
        cleaned = cleaned.replace(marker.as_str(), "");
    }
    cleaned = cleaned.replace(',', "");

    let token = first_numeric_token(&cleaned).ok_or(NormalizeError::NoNumericToken)?;

    // Token is digits with at most one dot, so this parse cannot fail
    let value: f64 = token.parse().map_err(|_| NormalizeError::NoNumericToken)?;

    let suspect = value < rules.plausible_min || value > rules.plausible_max;
    if suspect {
        warn!(
            price = value,
            min = rules.plausible_min,
            max = rules.plausible_max,
            "price outside expected range, keeping it flagged"
        );
    }

    Ok(NormalizedPrice { value, suspect })
}

/// First `\d+(\.\d*)?` run in the text
fn first_numeric_token(text: &str) -> Option<String> {
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !c.is_ascii_digit() {
            continue;
        }
        let mut token = String::new();
        token.push(c);
        let mut seen_dot = false;
        while let Some(&(_, next)) = chars.peek() {
            if next.is_ascii_digit() {
                token.push(next);
                chars.next();
            } else if next == '.' && !seen_dot {
                seen_dot = true;
                token.push(next);
                chars.next();
            } else {
                break;
            }
        }
        return Some(token);
    }
    None
}
