use crate::errors::StorageError;
use crate::meta_ads_models::CampaignSpendRecord;
use crate::storage::{Storage, SALES_TABLE, SPEND_CONFLICT_KEYS, SPEND_TABLE};
use crate::webhook_models::SaleTransactionRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Client for the Supabase REST (PostgREST) gateway.
#[derive(Clone)]
pub struct SupabaseRestClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseRestClient {
    /// Creates a new `SupabaseRestClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The project URL, e.g. `https://<ref>.supabase.co`.
    /// * `service_key` - The service role key, sent as both `apikey` and bearer token.
    pub fn new(base_url: String, service_key: String) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// POSTs rows to a table, optionally resolving conflicts on `on_conflict`.
    async fn post_rows<T: Serialize + ?Sized>(
        &self,
        table: &str,
        rows: &T,
        on_conflict: Option<&[&str]>,
    ) -> Result<(), StorageError> {
        let mut request = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .json(rows);

        request = match on_conflict {
            Some(keys) => request
                .query(&[("on_conflict", keys.join(","))])
                .header("Prefer", "resolution=merge-duplicates,return=minimal"),
            None => request.header("Prefer", "return=minimal"),
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::Rejected {
                status,
                body: error_text,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Storage for SupabaseRestClient {
    async fn upsert_campaign_spend(
        &self,
        rows: &[CampaignSpendRecord],
    ) -> Result<u64, StorageError> {
        tracing::info!("Upserting {} rows into {} via REST", rows.len(), SPEND_TABLE);
        self.post_rows(SPEND_TABLE, rows, Some(&SPEND_CONFLICT_KEYS[..]))
            .await?;
        Ok(rows.len() as u64)
    }

    async fn insert_sale(&self, row: &SaleTransactionRecord) -> Result<(), StorageError> {
        self.post_rows(SALES_TABLE, row, None).await?;
        tracing::debug!("Stored sale row for transaction_id={:?}", row.transaction_id);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "supabase-rest"
    }
}
