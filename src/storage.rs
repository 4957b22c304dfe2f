use crate::config::Config;
use crate::db::Database;
use crate::errors::StorageError;
use crate::meta_ads_models::CampaignSpendRecord;
use crate::rest_storage::SupabaseRestClient;
use crate::webhook_models::SaleTransactionRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Ad-spend upsert target.
pub const SPEND_TABLE: &str = "gastos_meta";
/// Sales insert target.
pub const SALES_TABLE: &str = "payt_vendas";
/// Conflict key of the spend table.
pub const SPEND_CONFLICT_KEYS: [&str; 2] = ["campaign_id", "date"];

/// Table-oriented write access to the reporting database.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert-or-replace spend rows keyed on (campaign_id, date) in one write.
    /// Returns the number of rows written.
    async fn upsert_campaign_spend(
        &self,
        rows: &[CampaignSpendRecord],
    ) -> Result<u64, StorageError>;

    /// Append one sale row.
    async fn insert_sale(&self, row: &SaleTransactionRecord) -> Result<(), StorageError>;

    fn backend_name(&self) -> &'static str;
}

/// Picks the backend from configuration: direct Postgres when `DATABASE_URL` is set,
/// the Supabase REST gateway otherwise.
pub async fn from_config(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match &config.database_url {
        Some(url) => {
            let db = Database::new(url).await?;
            tracing::info!("Database connection pool established");
            Ok(Arc::new(PostgresStorage::new(db.pool)))
        }
        None => {
            let client = SupabaseRestClient::new(
                config.supabase_url.clone(),
                config.supabase_service_key.clone(),
            )?;
            tracing::info!("✓ Supabase REST client initialized: {}", config.supabase_url);
            Ok(Arc::new(client))
        }
    }
}

/// Upserts spend rows, swallowing storage failures.
///
/// Empty input performs no write and yields `Some(0)`. A failed write is logged
/// and yields `None`. Rows repeating a (campaign_id, date) key collapse to the last
/// occurrence, since a single conflict-resolving statement cannot touch a key twice.
pub async fn upsert_spend(storage: &dyn Storage, rows: &[CampaignSpendRecord]) -> Option<u64> {
    if rows.is_empty() {
        tracing::warn!("⚠️  No data to insert");
        return Some(0);
    }

    let rows = dedupe_by_conflict_key(rows);
    match storage.upsert_campaign_spend(&rows).await {
        Ok(written) => {
            tracing::info!(
                "✅ Inserted/Updated {} records in {} ({})",
                rows.len(),
                SPEND_TABLE,
                storage.backend_name()
            );
            Some(written)
        }
        Err(e) => {
            tracing::error!("❌ Error upserting into {}: {}", SPEND_TABLE, e);
            None
        }
    }
}

fn dedupe_by_conflict_key(rows: &[CampaignSpendRecord]) -> Vec<CampaignSpendRecord> {
    let mut position: HashMap<(&str, NaiveDate), usize> = HashMap::new();
    let mut unique: Vec<CampaignSpendRecord> = Vec::with_capacity(rows.len());

    for row in rows {
        match position.get(&(row.campaign_id.as_str(), row.date)) {
            Some(&idx) => unique[idx] = row.clone(),
            None => {
                position.insert((row.campaign_id.as_str(), row.date), unique.len());
                unique.push(row.clone());
            }
        }
    }

    if unique.len() < rows.len() {
        tracing::warn!(
            "Collapsed {} duplicate (campaign_id, date) rows before upsert",
            rows.len() - unique.len()
        );
    }
    unique
}

/// Direct Postgres access through a sqlx pool.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn upsert_campaign_spend(
        &self,
        rows: &[CampaignSpendRecord],
    ) -> Result<u64, StorageError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (date, campaign_id, campaign_name, account_id, account_name, spend, impressions, clicks) ",
            SPEND_TABLE
        ));

        query.push_values(rows, |mut b, row| {
            b.push_bind(row.date)
                .push_bind(row.campaign_id.clone())
                .push_bind(row.campaign_name.clone())
                .push_bind(row.account_id.clone())
                .push_bind(row.account_name.clone())
                .push_bind(row.spend.clone())
                .push_bind(row.impressions)
                .push_bind(row.clicks);
        });

        query.push(format!(
            r#"
            ON CONFLICT ({}) DO UPDATE
            SET campaign_name = EXCLUDED.campaign_name,
                account_id = EXCLUDED.account_id,
                account_name = EXCLUDED.account_name,
                spend = EXCLUDED.spend,
                impressions = EXCLUDED.impressions,
                clicks = EXCLUDED.clicks
            "#,
            SPEND_CONFLICT_KEYS.join(", ")
        ));

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_sale(&self, row: &SaleTransactionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO payt_vendas (
                transaction_id,
                status,
                amount,
                customer_name,
                customer_email,
                utm_source,
                utm_medium,
                utm_campaign,
                utm_content,
                utm_term,
                data_venda,
                raw_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&row.transaction_id)
        .bind(&row.status)
        .bind(&row.amount)
        .bind(&row.customer_name)
        .bind(&row.customer_email)
        .bind(&row.utm_source)
        .bind(&row.utm_medium)
        .bind(&row.utm_campaign)
        .bind(&row.utm_content)
        .bind(&row.utm_term)
        .bind(row.data_venda)
        .bind(&row.raw_data)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored sale row for transaction_id={:?}", row.transaction_id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Process-local store used by tests and dry runs.
#[derive(Default)]
pub struct MemoryStorage {
    spend: Mutex<BTreeMap<(String, NaiveDate), CampaignSpendRecord>>,
    sales: Mutex<Vec<SaleTransactionRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn spend_rows(&self) -> Vec<CampaignSpendRecord> {
        self.spend
            .lock()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sales(&self) -> Vec<SaleTransactionRecord> {
        self.sales
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("memory store is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upsert_campaign_spend(
        &self,
        rows: &[CampaignSpendRecord],
    ) -> Result<u64, StorageError> {
        self.check_writable()?;
        let mut table = self
            .spend
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        for row in rows {
            table.insert((row.campaign_id.clone(), row.date), row.clone());
        }
        Ok(rows.len() as u64)
    }

    async fn insert_sale(&self, row: &SaleTransactionRecord) -> Result<(), StorageError> {
        self.check_writable()?;
        self.sales
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .push(row.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn record(campaign_id: &str, spend: &str) -> CampaignSpendRecord {
        CampaignSpendRecord {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            campaign_id: campaign_id.to_string(),
            campaign_name: format!("Campanha {}", campaign_id),
            account_id: "545837621783259".to_string(),
            account_name: "DRX Intelligence".to_string(),
            spend: BigDecimal::from_str(spend).unwrap(),
            impressions: 100,
            clicks: 10,
        }
    }

    #[tokio::test]
    async fn test_upsert_same_key_twice_keeps_second_value() {
        let store = MemoryStorage::new();

        assert_eq!(upsert_spend(&store, &[record("c1", "10.00")]).await, Some(1));
        assert_eq!(upsert_spend(&store, &[record("c1", "25.50")]).await, Some(1));

        let rows = store.spend_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].spend, BigDecimal::from_str("25.50").unwrap());
    }

    #[tokio::test]
    async fn test_upsert_empty_input_skips_write() {
        let store = MemoryStorage::new();
        store.set_fail_writes(true);

        // No write is attempted, so the failing store is never touched
        assert_eq!(upsert_spend(&store, &[]).await, Some(0));
    }

    #[tokio::test]
    async fn test_upsert_failure_is_swallowed() {
        let store = MemoryStorage::new();
        store.set_fail_writes(true);

        assert_eq!(upsert_spend(&store, &[record("c1", "1")]).await, None);
        assert!(store.spend_rows().is_empty());
    }

    #[test]
    fn test_duplicate_keys_collapse_to_last() {
        let rows = vec![record("c1", "1"), record("c2", "2"), record("c1", "3")];
        let unique = dedupe_by_conflict_key(&rows);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].campaign_id, "c1");
        assert_eq!(unique[0].spend, BigDecimal::from_str("3").unwrap());
        assert_eq!(unique[1].campaign_id, "c2");
    }
}
