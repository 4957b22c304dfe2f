use crate::errors::FetchError;
use crate::meta_ads_client::MetaAdsClient;
use crate::meta_ads_models::{
    transform_insights, CampaignSpendRecord, DatePreset, PurchaseSummary,
};
use crate::storage::{self, Storage};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

/// Outcome of one sync cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncReport {
    pub date_preset: DatePreset,
    pub run_date: Option<NaiveDate>,
    pub fetched: usize,
    pub transformed: usize,
    /// Rows acknowledged by storage; `None` when the write failed.
    pub written: Option<u64>,
    /// Set when the insights request failed and the cycle wrote nothing.
    pub fetch_error: Option<String>,
    pub purchases: PurchaseSummary,
}

fn total_spend(records: &[CampaignSpendRecord]) -> BigDecimal {
    records
        .iter()
        .fold(BigDecimal::from(0), |acc, r| acc + &r.spend)
}

/// Timer for repeated syncs. A run longer than `period` delays the next tick
/// instead of queueing catch-up runs.
pub fn sync_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Fetch → transform → upsert for one reporting window.
///
/// Never fails: fetch and storage errors are logged and reflected in the report.
/// Every record is stamped with `run_date`, whatever window `preset` selects.
pub async fn run_sync(
    client: &MetaAdsClient,
    storage: &dyn Storage,
    preset: DatePreset,
    run_date: NaiveDate,
) -> SyncReport {
    tracing::info!("🚀 Starting Meta Ads sync (date_preset={}, date={})", preset, run_date);

    let fetched = client.fetch_campaign_insights(preset).await;
    sync_rows(fetched, storage, preset, run_date).await
}

/// Runs the transform and upsert steps over an already-fetched result.
pub async fn sync_rows(
    fetched: Result<Vec<Value>, FetchError>,
    storage: &dyn Storage,
    preset: DatePreset,
    run_date: NaiveDate,
) -> SyncReport {
    let mut report = SyncReport {
        date_preset: preset,
        run_date: Some(run_date),
        ..SyncReport::default()
    };

    let raw = match fetched {
        Ok(rows) => rows,
        Err(e) => {
            match e.hint() {
                Some(hint) => tracing::error!("❌ Error fetching Meta Ads data: {} ({})", e, hint),
                None => tracing::error!("❌ Error fetching Meta Ads data: {}", e),
            }
            report.fetch_error = Some(e.to_string());
            return report;
        }
    };
    report.fetched = raw.len();

    if raw.is_empty() {
        tracing::warn!("⚠️  No data fetched, exiting...");
        return report;
    }

    let records = transform_insights(&raw, run_date);
    report.transformed = records.len();
    report.purchases = raw
        .iter()
        .map(PurchaseSummary::from_insight)
        .fold(PurchaseSummary::default(), |acc, p| acc.merge(&p));

    tracing::info!(
        "📊 Transformed {} records (spend={}, purchases={}, purchase_value={})",
        records.len(),
        total_spend(&records),
        report.purchases.conversions,
        report.purchases.conversion_value
    );

    report.written = storage::upsert_spend(storage, &records).await;

    if report.written.is_some() {
        tracing::info!("✅ Sync completed!");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[tokio::test]
    async fn test_rows_written_with_run_date() {
        let store = MemoryStorage::new();
        let rows = vec![
            json!({"campaign_id": "1", "spend": "10", "actions": [{"action_type": "purchase", "value": "2"}]}),
            json!({"campaign_id": "2", "spend": "5.5"}),
        ];

        let report = sync_rows(Ok(rows), &store, DatePreset::Yesterday, today()).await;

        assert_eq!(report.fetched, 2);
        assert_eq!(report.transformed, 2);
        assert_eq!(report.written, Some(2));
        assert_eq!(report.purchases.conversions, 2);
        assert!(store.spend_rows().iter().all(|r| r.date == today()));
    }

    #[tokio::test]
    async fn test_fetch_error_writes_nothing() {
        let store = MemoryStorage::new();
        let err = FetchError::Platform {
            code: 190,
            message: "Session has expired".to_string(),
        };

        let report = sync_rows(Err(err), &store, DatePreset::Today, today()).await;

        assert!(report.fetch_error.is_some());
        assert_eq!(report.written, None);
        assert!(store.spend_rows().is_empty());
    }

    #[tokio::test]
    async fn test_empty_fetch_skips_write() {
        let store = MemoryStorage::new();
        let report = sync_rows(Ok(vec![]), &store, DatePreset::Today, today()).await;

        assert_eq!(report.fetched, 0);
        assert_eq!(report.written, None);
        assert!(report.fetch_error.is_none());
    }

    #[tokio::test]
    async fn test_sync_ticker_delays_after_slow_run() {
        let ticker = sync_ticker(Duration::from_secs(60));
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Delay);
        assert_eq!(ticker.period(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_storage_failure_reported_as_none() {
        let store = MemoryStorage::new();
        store.set_fail_writes(true);

        let report = sync_rows(
            Ok(vec![json!({"campaign_id": "1"})]),
            &store,
            DatePreset::Today,
            today(),
        )
        .await;

        assert_eq!(report.transformed, 1);
        assert_eq!(report.written, None);
    }
}
