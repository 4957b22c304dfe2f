use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use std::env;
use std::str::FromStr;

use payt_meta_sync::db::Database;
use payt_meta_sync::meta_ads_models::CampaignSpendRecord;
use payt_meta_sync::storage::{PostgresStorage, Storage};
use payt_meta_sync::webhook_models::{SaleTransactionRecord, WebhookPayload};

/// Integration smoke test for the Postgres backend.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
/// Expects `gastos_meta` (unique on campaign_id, date) and `payt_vendas` to exist.
#[tokio::test]
#[ignore]
async fn postgres_upsert_and_insert_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let storage = PostgresStorage::new(db.pool.clone());

    // Unique campaign id per run to avoid clashing with earlier runs
    let campaign_id = format!("smoke-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let mut record = CampaignSpendRecord {
        date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        campaign_id: campaign_id.clone(),
        campaign_name: "Smoke".to_string(),
        account_id: "0".to_string(),
        account_name: "DRX Intelligence".to_string(),
        spend: BigDecimal::from_str("1.00")?,
        impressions: 1,
        clicks: 1,
    };

    storage.upsert_campaign_spend(&[record.clone()]).await?;
    record.spend = BigDecimal::from_str("2.00")?;
    storage.upsert_campaign_spend(&[record]).await?;

    let (count, spend): (i64, BigDecimal) = sqlx::query_as(
        "SELECT COUNT(*), MAX(spend) FROM gastos_meta WHERE campaign_id = $1",
    )
    .bind(&campaign_id)
    .fetch_one(&db.pool)
    .await?;
    assert_eq!(count, 1);
    assert_eq!(spend, BigDecimal::from_str("2.00")?);

    let payload = WebhookPayload::parse(None, b"id=smoke&amount=1.5")?;
    let sale = SaleTransactionRecord::from_payload(&payload, Utc::now())?;
    storage.insert_sale(&sale).await?;

    Ok(())
}
