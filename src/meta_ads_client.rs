use crate::config::Config;
use crate::errors::FetchError;
use crate::meta_ads_models::{DatePreset, InsightsResponse, INSIGHT_FIELDS, INSIGHT_ROW_LIMIT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Client for the Meta Ads (Graph API) insights endpoint.
#[derive(Clone)]
pub struct MetaAdsClient {
    client: Client,
    base_url: String,
    api_version: String,
    account_id: String,
    access_token: String,
}

impl MetaAdsClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: config.meta_api_base_url.clone(),
            api_version: config.meta_api_version.clone(),
            account_id: config.meta_ad_account_id.clone(),
            access_token: config.meta_access_token.clone(),
        })
    }

    /// Fetch campaign-level insights for the configured ad account.
    ///
    /// Issues a single request capped at 500 rows; further pages are not followed.
    /// A body without a `data` array yields an empty list.
    pub async fn fetch_campaign_insights(
        &self,
        preset: DatePreset,
    ) -> Result<Vec<Value>, FetchError> {
        let limit = INSIGHT_ROW_LIMIT.to_string();
        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/{}/{}/insights",
                self.base_url, self.api_version, self.account_id
            ),
            &[
                ("access_token", self.access_token.as_str()),
                ("level", "campaign"),
                ("date_preset", preset.as_str()),
                ("fields", INSIGHT_FIELDS),
                ("limit", limit.as_str()),
            ],
        )?;

        tracing::info!(
            "Fetching Meta Ads insights for {} (date_preset={})",
            self.account_id,
            preset
        );
        // Redact token from logs to prevent credential exposure
        tracing::debug!(
            "Meta Ads URL: {}/{}/{}/insights?access_token=[REDACTED]&level=campaign&date_preset={}&limit={}",
            self.base_url,
            self.api_version,
            self.account_id,
            preset,
            limit
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The Graph API reports its own failures in an error envelope, typically with a 4xx
        let parsed = serde_json::from_str::<InsightsResponse>(&body);
        if let Ok(InsightsResponse {
            error: Some(error), ..
        }) = &parsed
        {
            return Err(FetchError::Platform {
                code: error.code,
                message: error.message.clone(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        let parsed = parsed.map_err(|e| FetchError::Decode(e.to_string()))?;

        match parsed.data {
            Some(rows) => {
                tracing::info!("✅ Fetched {} campaigns from Meta Ads", rows.len());
                Ok(rows)
            }
            None => {
                tracing::warn!("⚠️  No data returned from Meta Ads API");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(MetaAdsClient::new(&config).is_ok());
    }
}
