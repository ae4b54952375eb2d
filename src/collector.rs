// src/collector.rs
use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::HttpCfg;
use crate::fetch::{self, FetchAdapter};
use crate::normalize::{normalize, NormalizeRules};
use crate::types::{MissKind, PriceObservation, SiteCheck, SiteOutcome, SiteProfile};

/// Walks the configured sites serially and produces one outcome per site.
///
/// Owns the HTTP client for the session; dropping the collector releases it
/// on every exit path.
pub struct ObservationCollector {
    client: reqwest::Client,
    timeout_secs: u64,
    rules: NormalizeRules,
}

impl ObservationCollector {
    pub fn new(http: &HttpCfg, rules: NormalizeRules) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&http.user_agent)
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            client,
            timeout_secs: http.timeout_secs,
            rules,
        })
    }

    /// One pass over all profiles. Always returns the full mapping: a site
    /// that fails is recorded as a miss, never allowed to block the rest.
    pub async fn collect(&self, profiles: &[SiteProfile]) -> Vec<SiteCheck> {
        info!("starting price check across {} sites", profiles.len());
        let mut checks = Vec::with_capacity(profiles.len());

        for profile in profiles {
            let adapter =
                fetch::create_adapter(profile.method, self.client.clone(), self.timeout_secs);
            debug!(site = %profile.name, method = ?adapter.method(), "dispatching fetch");
            let outcome = self.outcome_for(adapter.as_ref(), profile).await;

            match &outcome {
                SiteOutcome::Observed(obs) => {
                    info!(site = %profile.name, price = obs.price, "price retrieved");
                }
                SiteOutcome::Miss(kind) => {
                    warn!(site = %profile.name, ?kind, "no price this session");
                }
            }
            checks.push(SiteCheck { site: profile.name.clone(), outcome });

            // Politeness pause, applied after every check
            sleep(Duration::from_secs(profile.wait_time_secs)).await;
        }

        let retrieved = checks.iter().filter(|c| c.observation().is_some()).count();
        info!("price check completed, retrieved {retrieved} of {} sites", checks.len());
        checks
    }

    pub(crate) async fn outcome_for(
        &self,
        adapter: &dyn FetchAdapter,
        profile: &SiteProfile,
    ) -> SiteOutcome {
        match adapter.fetch_price_text(profile).await {
            Ok(Some(text)) => {
                info!(site = %profile.name, text = %text, "found price text");
                match normalize(&text, &self.rules) {
                    Ok(price) => SiteOutcome::Observed(PriceObservation {
                        site: profile.name.clone(),
                        url: profile.url.clone(),
                        price: price.value,
                        suspect: price.suspect,
                        observed_at: Utc::now(),
                    }),
                    Err(e) => {
                        warn!(site = %profile.name, error = %e, text = %text, "could not extract price");
                        SiteOutcome::Miss(MissKind::Normalize(e))
                    }
                }
            }
            Ok(None) => {
                warn!(site = %profile.name, "price element not found");
                SiteOutcome::Miss(MissKind::LocatorMiss)
            }
            Err(e) => {
                warn!(site = %profile.name, error = %e, "fetch failed");
                SiteOutcome::Miss(MissKind::Fetch(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FetchError, NormalizeError};
    use crate::types::FetchMethod;
    use async_trait::async_trait;

    fn profile(name: &str) -> SiteProfile {
        SiteProfile {
            name: name.to_string(),
            url: format!("https://{}.example/product", name.to_lowercase()),
            price_selector: scraper::Selector::parse(".price").unwrap(),
            backup_selector: None,
            method: FetchMethod::Static,
            wait_time_secs: 0,
        }
    }

    fn collector() -> ObservationCollector {
        ObservationCollector::new(&HttpCfg::default(), NormalizeRules::default()).unwrap()
    }

    /// Scripted adapter keyed on site name
    struct StubAdapter;

    #[async_trait]
    impl FetchAdapter for StubAdapter {
        fn method(&self) -> FetchMethod {
            FetchMethod::Static
        }

        async fn fetch_price_text(
            &self,
            profile: &SiteProfile,
        ) -> Result<Option<String>, FetchError> {
            match profile.name.as_str() {
                "Down" => Err(FetchError::Http("connection reset".to_string())),
                "NoElement" => Ok(None),
                "Garbage" => Ok(Some("Currently unavailable".to_string())),
                _ => Ok(Some("₹8,999.00".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_one_failing_site_does_not_block_others() {
        let collector = collector();
        let adapter = StubAdapter;
        let profiles = [profile("Down"), profile("Amazon"), profile("Flipkart")];

        let mut outcomes = Vec::new();
        for p in &profiles {
            outcomes.push(collector.outcome_for(&adapter, p).await);
        }

        assert!(matches!(&outcomes[0], SiteOutcome::Miss(MissKind::Fetch(_))));
        assert!(matches!(&outcomes[1], SiteOutcome::Observed(o) if o.price == 8999.0));
        assert!(matches!(&outcomes[2], SiteOutcome::Observed(o) if o.price == 8999.0));
    }

    #[tokio::test]
    async fn test_locator_miss_and_bad_value_are_distinct() {
        let collector = collector();
        let adapter = StubAdapter;

        let miss = collector.outcome_for(&adapter, &profile("NoElement")).await;
        assert!(matches!(miss, SiteOutcome::Miss(MissKind::LocatorMiss)));

        let garbage = collector.outcome_for(&adapter, &profile("Garbage")).await;
        assert!(matches!(
            garbage,
            SiteOutcome::Miss(MissKind::Normalize(NormalizeError::NoNumericToken))
        ));
    }

    #[tokio::test]
    async fn test_collect_returns_full_mapping_when_every_site_misses() {
        // Nothing listens on port 9; every fetch fails fast and locally
        let collector = collector();
        let mut profiles = vec![profile("a"), profile("b")];
        for p in &mut profiles {
            p.url = "http://127.0.0.1:9/".to_string();
        }

        let checks = collector.collect(&profiles).await;
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.observation().is_none()));
    }

    #[tokio::test]
    async fn test_suspect_price_still_counts_as_observation() {
        struct CheapAdapter;

        #[async_trait]
        impl FetchAdapter for CheapAdapter {
            fn method(&self) -> FetchMethod {
                FetchMethod::Static
            }
            async fn fetch_price_text(
                &self,
                _profile: &SiteProfile,
            ) -> Result<Option<String>, FetchError> {
                Ok(Some("₹499".to_string()))
            }
        }

        let collector = collector();
        let outcome = collector.outcome_for(&CheapAdapter, &profile("Outlet")).await;
        match outcome {
            SiteOutcome::Observed(obs) => {
                assert_eq!(obs.price, 499.0);
                assert!(obs.suspect);
            }
            other => panic!("expected observation, got {other:?}"),
        }
    }
}
