// src/app.rs
use anyhow::Result;
use tracing::{error, info};

use crate::collector::ObservationCollector;
use crate::config::{AlertCfg, Config, HttpCfg};
use crate::evaluate;
use crate::ledger::HistoryLedger;
use crate::normalize::NormalizeRules;
use crate::notify;
use crate::report::SessionReport;
use crate::types::{PriceObservation, SiteProfile};

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub product: String,
    pub alert: AlertCfg,
    pub normalize: NormalizeRules,
    pub history_file: String,
    pub check_interval_hours: u64,
    pub http: HttpCfg,
    pub profiles: Vec<SiteProfile>,
    pub once: bool,
}

impl AppCfg {
    pub fn from_config(cfg: Config, once: bool) -> Result<Self> {
        // Profiles are validated here, before any session starts
        let profiles = cfg.site_profiles()?;

        Ok(Self {
            product: cfg.product.name,
            alert: cfg.alert,
            normalize: cfg.normalize,
            history_file: cfg.ledger.history_file,
            check_interval_hours: cfg.poll.check_interval_hours,
            http: cfg.http,
            profiles,
            once,
        })
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!(
        product = %app_cfg.product,
        sites = app_cfg.profiles.len(),
        threshold = app_cfg.alert.price_threshold,
        "starting price tracker"
    );

    if app_cfg.once {
        return run_session(&app_cfg).await;
    }
    run_polling_mode(app_cfg).await
}

async fn run_polling_mode(app_cfg: AppCfg) -> Result<()> {
    info!(
        "running in polling mode, checking every {} hours",
        app_cfg.check_interval_hours
    );

    let period = tokio::time::Duration::from_secs(app_cfg.check_interval_hours * 3600);
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        // A failed session is logged and the tracker keeps watching
        if let Err(e) = run_session(&app_cfg).await {
            error!(error = %e, "session failed");
        }
    }
}

/// One full session: COLLECT → PERSIST → EVALUATE → NOTIFY → SUMMARIZE.
///
/// Per-site and per-step faults are isolated; only orchestration failures
/// propagate. The collector owns the fetch resources and is dropped on every
/// exit path.
async fn run_session(app_cfg: &AppCfg) -> Result<()> {
    info!("starting price tracking session");
    let threshold = app_cfg.alert.price_threshold;

    let collector = ObservationCollector::new(&app_cfg.http, app_cfg.normalize.clone())?;
    let checks = collector.collect(&app_cfg.profiles).await;

    let observations: Vec<PriceObservation> = checks
        .iter()
        .filter_map(|check| check.observation().cloned())
        .collect();

    let ledger = HistoryLedger::new(&app_cfg.history_file);

    if observations.is_empty() {
        info!("no prices retrieved, skipping persist/evaluate/notify");
        let report =
            SessionReport::new(&app_cfg.product, &checks, &ledger.stats(), threshold, 0);
        report.print();
        return Ok(());
    }

    // The pre-session baseline drives deal evaluation; the ledger takes the
    // same baseline internally for its is_new_low flags
    let baseline = ledger.stats();

    if let Err(e) = ledger.append(&observations, threshold) {
        error!(error = %e, "could not persist observations");
    }

    let notifier = notify::create_notifier(&app_cfg.alert);
    let mut alerts_sent = 0;
    for obs in &observations {
        if let Some(decision) = evaluate::decide(obs, &baseline, threshold) {
            info!(
                site = %decision.site,
                price = decision.price,
                reasons = %decision.reason_line(),
                "deal detected"
            );
            match notifier.send(&decision).await {
                Ok(()) => alerts_sent += 1,
                Err(e) => {
                    // Delivery faults never roll back persisted records or
                    // block the other sites' alerts
                    error!(site = %decision.site, error = %e, "alert delivery failed");
                }
            }
        }
    }

    // Summary reflects what the store knows after this session's writes
    let report =
        SessionReport::new(&app_cfg.product, &checks, &ledger.stats(), threshold, alerts_sent);
    report.print();

    info!("price tracking session completed");
    Ok(())
}
