use serde::Deserialize;

/// Fallback account name used by the ads platform integration when none is supplied.
pub const DEFAULT_ACCOUNT_NAME: &str = "DRX Intelligence";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub meta_access_token: String,
    pub meta_ad_account_id: String,
    pub meta_api_base_url: String,
    pub meta_api_version: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub database_url: Option<String>, // Direct Postgres access, bypasses the REST gateway
    pub payt_secret_key: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Every setting has a default so that a bare environment still produces a
    /// usable (if unauthenticated) configuration; values that are present are validated.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            meta_access_token: var("META_ADS_TOKEN", ""),
            meta_ad_account_id: normalize_account_id(&var("META_AD_ACCOUNT_ID", "")),
            meta_api_base_url: Some(var("META_API_BASE_URL", "https://graph.facebook.com"))
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
                .ok_or_else(|| {
                    anyhow::anyhow!("META_API_BASE_URL must start with http:// or https://")
                })?,
            meta_api_version: var("META_API_VERSION", "v18.0"),
            supabase_url: Some(var("SUPABASE_URL", "http://localhost:54321"))
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL must start with http:// or https://"))?,
            supabase_service_key: var("SUPABASE_SERVICE_KEY", ""),
            database_url: lookup("DATABASE_URL")
                .or_else(|| lookup("DB_URL"))
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })
                .transpose()?,
            payt_secret_key: var("PAYT_SECRET_KEY", ""),
            port: var("PORT", "5000")
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
        };

        // Never log credentials, only whether they are present
        tracing::debug!("Meta API: {}/{}", config.meta_api_base_url, config.meta_api_version);
        tracing::debug!("Meta ad account: {}", config.meta_ad_account_id);
        tracing::debug!("Supabase URL: {}", config.supabase_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.meta_access_token.is_empty() {
            tracing::warn!("META_ADS_TOKEN not set; ads insight requests will be rejected");
        }
        if config.database_url.is_some() {
            tracing::info!("DATABASE_URL configured, using direct Postgres storage");
        } else if config.supabase_service_key.is_empty() {
            tracing::warn!("SUPABASE_SERVICE_KEY not set; storage writes will be unauthenticated");
        }

        Ok(config)
    }
}

/// Ensures the ad account id carries the `act_` prefix the insights endpoint expects.
pub fn normalize_account_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("act_") {
        trimmed.to_string()
    } else {
        format!("act_{}", trimmed)
    }
}
