//! Fetch adapters - one per site fetch method

pub mod rendered_client;
pub mod static_client;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::FetchError;
use crate::types::{FetchMethod, SiteProfile};
use rendered_client::RenderedClient;
use static_client::StaticClient;

/// Unified interface over the ways a site can serve its price text
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    /// The fetch method this adapter handles
    fn method(&self) -> FetchMethod;

    /// Raw price text for the profile, `Ok(None)` when neither locator matched
    async fn fetch_price_text(&self, profile: &SiteProfile) -> Result<Option<String>, FetchError>;
}

/// Create a fetch adapter for the profile's method tag
pub fn create_adapter(
    method: FetchMethod,
    client: reqwest::Client,
    timeout_secs: u64,
) -> Box<dyn FetchAdapter> {
    match method {
        FetchMethod::Static => Box::new(StaticClient::new(client, timeout_secs)),
        FetchMethod::Dynamic => Box::new(RenderedClient::new(client, timeout_secs)),
    }
}

/// Pull the price fragment out of a fetched document.
///
/// The backup selector only covers a locator miss; a matched element whose
/// text turns out to be garbage is the normalizer's problem, not a reason
/// to re-locate.
pub(crate) fn select_price_text(html: &str, profile: &SiteProfile) -> Option<String> {
    let document = scraper::Html::parse_document(html);

    let mut element = document.select(&profile.price_selector).next();
    if element.is_none() {
        if let Some(backup) = &profile.backup_selector {
            debug!(site = %profile.name, "primary selector missed, trying backup");
            element = document.select(backup).next();
        }
    }

    element.map(|el| el.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(primary: &str, backup: Option<&str>) -> SiteProfile {
        SiteProfile {
            name: "Test Store".to_string(),
            url: "https://example.com/product".to_string(),
            price_selector: scraper::Selector::parse(primary).unwrap(),
            backup_selector: backup.map(|s| scraper::Selector::parse(s).unwrap()),
            method: FetchMethod::Static,
            wait_time_secs: 0,
        }
    }

    const PAGE: &str = r#"
        <html><body>
            <div class="listing">
                <span class="price">₹8,999.00</span>
                <span class="mrp">₹11,995.00</span>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_primary_selector_hit() {
        let text = select_price_text(PAGE, &profile(".price", Some(".mrp")));
        assert_eq!(text.as_deref(), Some("₹8,999.00"));
    }

    #[test]
    fn test_backup_used_only_on_locator_miss() {
        let text = select_price_text(PAGE, &profile(".sale-price", Some(".mrp")));
        assert_eq!(text.as_deref(), Some("₹11,995.00"));
    }

    #[test]
    fn test_both_selectors_miss() {
        let text = select_price_text(PAGE, &profile(".sale-price", Some(".deal-price")));
        assert_eq!(text, None);
    }

    #[test]
    fn test_matched_garbage_does_not_fall_back() {
        // Primary matches an element with no usable number; the backup would
        // match a clean price, but locator fallback must not paper over that.
        let page = r#"<div><span class="price">Out of stock</span>
                      <span class="mrp">₹9,995</span></div>"#;
        let text = select_price_text(page, &profile(".price", Some(".mrp")));
        assert_eq!(text.as_deref(), Some("Out of stock"));
    }

    #[test]
    fn test_nested_text_is_joined() {
        let page = r#"<div class="pdp-price"><strong>₹ <span>7,495</span></strong></div>"#;
        let text = select_price_text(page, &profile(".pdp-price strong", None));
        assert_eq!(text.as_deref(), Some("₹ 7,495"));
    }
}
