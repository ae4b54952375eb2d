// src/config.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::normalize::NormalizeRules;
use crate::types::{FetchMethod, SiteProfile};

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCfg {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertCfg {
    pub price_threshold: f64,
    #[serde(default)]
    pub dry_run: bool,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerCfg {
    pub history_file: String,
}

impl Default for LedgerCfg {
    fn default() -> Self {
        Self { history_file: "price_history.csv".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollCfg {
    pub check_interval_hours: u64,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self { check_interval_hours: 6 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpCfg {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteCfg {
    pub name: String,
    pub url: String,
    pub price_selector: String,
    pub backup_selector: Option<String>,
    pub method: FetchMethod,
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: u64,
}

fn default_wait_time() -> u64 {
    3
}

impl SiteCfg {
    /// Validate one raw site entry into a typed profile.
    /// Selectors are parsed here so a bad one fails at load, not mid-fetch.
    pub fn build_profile(&self) -> Result<SiteProfile> {
        if self.name.trim().is_empty() {
            bail!("site entry with empty name");
        }
        if self.url.trim().is_empty() {
            bail!("site '{}' has an empty url", self.name);
        }

        let price_selector = scraper::Selector::parse(&self.price_selector)
            .map_err(|e| anyhow::anyhow!("site '{}': bad price_selector '{}': {e}", self.name, self.price_selector))?;

        // A backup identical to the primary adds nothing; treat it as absent
        let backup_selector = match &self.backup_selector {
            Some(sel) if sel != &self.price_selector => Some(
                scraper::Selector::parse(sel)
                    .map_err(|e| anyhow::anyhow!("site '{}': bad backup_selector '{}': {e}", self.name, sel))?,
            ),
            _ => None,
        };

        Ok(SiteProfile {
            name: self.name.clone(),
            url: self.url.clone(),
            price_selector,
            backup_selector,
            method: self.method,
            wait_time_secs: self.wait_time_secs,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub product: ProductCfg,
    pub alert: AlertCfg,
    #[serde(default)]
    pub normalize: NormalizeRules,
    #[serde(default)]
    pub ledger: LedgerCfg,
    #[serde(default)]
    pub poll: PollCfg,
    #[serde(default)]
    pub http: HttpCfg,
    pub sites: Vec<SiteCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read config file {}", path.as_ref().display()))?;
        let cfg: Self = toml::from_str(&s).context("parse Config.toml")?;
        Ok(cfg)
    }

    /// All site profiles, rejected eagerly if any entry is malformed
    pub fn site_profiles(&self) -> Result<Vec<SiteProfile>> {
        if self.sites.is_empty() {
            bail!("no sites configured");
        }
        self.sites.iter().map(SiteCfg::build_profile).collect()
    }
}
