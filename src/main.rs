mod app;
mod collector;
mod config;
mod errors;
mod evaluate;
mod fetch;
mod ledger;
mod normalize;
mod notify;
mod report;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Single-product price tracker with deal alerts")]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// Run one session and exit instead of polling
    #[arg(long)]
    once: bool,

    /// Log alerts without delivering them
    #[arg(long)]
    dry_run: bool,

    /// Alert price threshold (overrides config)
    #[arg(long)]
    threshold: Option<f64>,

    /// Price history file (overrides config)
    #[arg(long)]
    history_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut cfg = config::Config::from_file(&args.config)?;

    // CLI args override the config file
    if args.dry_run {
        cfg.alert.dry_run = true;
    }
    if let Some(threshold) = args.threshold {
        cfg.alert.price_threshold = threshold;
    }
    if let Some(history_file) = args.history_file {
        cfg.ledger.history_file = history_file;
    }

    let app_cfg = app::AppCfg::from_config(cfg, args.once)?;
    app::run(app_cfg).await
}
