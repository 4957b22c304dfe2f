//! Meta Ads → `gastos_meta` sync job.
//!
//! Runs once per invocation (cron / scheduler) or, with `--interval-secs`, on a fixed timer.

use chrono::Local;
use clap::Parser;
use payt_meta_sync::config::Config;
use payt_meta_sync::meta_ads_client::MetaAdsClient;
use payt_meta_sync::meta_ads_models::DatePreset;
use payt_meta_sync::meta_ads_sync::{run_sync, sync_ticker};
use payt_meta_sync::storage::{self, MemoryStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "meta-ads-sync")]
#[command(about = "Sync Meta Ads campaign spend into gastos_meta", long_about = None)]
struct Cli {
    /// Reporting window: today, yesterday, last_7d or last_30d
    #[arg(short, long, default_value = "today", env = "META_DATE_PRESET")]
    date_preset: DatePreset,

    /// Repeat the sync every N seconds instead of exiting after one run
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Fetch and transform, but write to an in-memory store only
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payt_meta_sync=debug,meta_ads_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let client = MetaAdsClient::new(&config)?;
    let storage: Arc<dyn Storage> = if cli.dry_run {
        tracing::info!("Dry run: rows will not leave this process");
        Arc::new(MemoryStorage::new())
    } else {
        storage::from_config(&config).await?
    };

    let Some(every) = cli.interval_secs.filter(|s| *s > 0) else {
        let report = run_sync(&client, storage.as_ref(), cli.date_preset, Local::now().date_naive()).await;
        tracing::info!("Sync report: {:?}", report);
        return Ok(());
    };

    tracing::info!("Scheduling sync every {}s", every);
    let mut ticker = sync_ticker(Duration::from_secs(every));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = run_sync(
                    &client,
                    storage.as_ref(),
                    cli.date_preset,
                    Local::now().date_naive(),
                )
                .await;
                tracing::info!("Sync report: {:?}", report);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down scheduled sync");
                break;
            }
        }
    }

    Ok(())
}
