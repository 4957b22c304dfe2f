use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_ACCOUNT_NAME;

/// Fields requested from the insights endpoint at campaign level.
pub const INSIGHT_FIELDS: &str =
    "campaign_id,campaign_name,account_id,account_name,spend,impressions,clicks,ctr,cpm,cpc,actions,action_values";

/// Hard ceiling on rows per sync; there is no cursor loop.
pub const INSIGHT_ROW_LIMIT: u32 = 500;

/// Action types counted as purchases in `actions` / `action_values`.
pub const PURCHASE_ACTION_TYPES: [&str; 2] = ["purchase", "offsite_conversion.fb_pixel_purchase"];

/// Reporting window resolved server-side by the ads platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    #[default]
    Today,
    Yesterday,
    #[serde(rename = "last_7d")]
    Last7d,
    #[serde(rename = "last_30d")]
    Last30d,
}

impl DatePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::Last7d => "last_7d",
            DatePreset::Last30d => "last_30d",
        }
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "today" => Ok(DatePreset::Today),
            "yesterday" => Ok(DatePreset::Yesterday),
            "last_7d" => Ok(DatePreset::Last7d),
            "last_30d" => Ok(DatePreset::Last30d),
            other => Err(format!(
                "unknown date preset '{}' (expected today, yesterday, last_7d or last_30d)",
                other
            )),
        }
    }
}

/// Top-level body of an insights response.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<PlatformErrorBody>,
}

/// Error envelope returned by the Graph API, usually with HTTP 400.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// One row of the `gastos_meta` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpendRecord {
    /// Date of the sync run, not of the reporting window.
    pub date: NaiveDate,
    pub campaign_id: String,
    pub campaign_name: String,
    pub account_id: String,
    pub account_name: String,
    pub spend: BigDecimal,
    pub impressions: i64,
    pub clicks: i64,
}

/// Purchase conversions reported alongside a campaign row.
///
/// Not persisted: the `gastos_meta` schema has no columns for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PurchaseSummary {
    pub conversions: i64,
    pub conversion_value: BigDecimal,
}

impl PurchaseSummary {
    pub fn from_insight(item: &Value) -> Self {
        let purchases = |key: &str| {
            item.get(key)
                .and_then(|v| v.as_array())
                .into_iter()
                .flatten()
                .filter(|action| {
                    action
                        .get("action_type")
                        .and_then(|t| t.as_str())
                        .is_some_and(|t| PURCHASE_ACTION_TYPES.contains(&t))
                })
                .cloned()
                .collect::<Vec<_>>()
        };

        let conversions: i64 = purchases("actions")
            .iter()
            .map(|action| count_value(action.get("value")))
            .sum();
        let conversion_value = purchases("action_values")
            .iter()
            .map(|action| decimal_value(action.get("value")))
            .fold(BigDecimal::zero(), |acc, v| acc + v);

        Self {
            conversions,
            conversion_value,
        }
    }

    pub fn merge(mut self, other: &PurchaseSummary) -> Self {
        self.conversions += other.conversions;
        self.conversion_value += other.conversion_value.clone();
        self
    }
}

/// Maps raw insight objects to spend records, all stamped with `run_date`.
///
/// Produces exactly one record per input object.
pub fn transform_insights(raw: &[Value], run_date: NaiveDate) -> Vec<CampaignSpendRecord> {
    raw.iter()
        .map(|item| CampaignSpendRecord::from_insight(item, run_date))
        .collect()
}

impl CampaignSpendRecord {
    pub fn from_insight(item: &Value, run_date: NaiveDate) -> Self {
        let campaign_id = string_field(item, "campaign_id").unwrap_or_default();
        if campaign_id.is_empty() {
            tracing::warn!("⚠️  Insight row without campaign_id: {}", item);
        }

        Self {
            date: run_date,
            campaign_id,
            campaign_name: string_field(item, "campaign_name").unwrap_or_default(),
            account_id: string_field(item, "account_id").unwrap_or_default(),
            account_name: string_field(item, "account_name")
                .unwrap_or_else(|| DEFAULT_ACCOUNT_NAME.to_string()),
            spend: decimal_value(item.get("spend")),
            impressions: count_value(item.get("impressions")),
            clicks: count_value(item.get("clicks")),
        }
    }
}

/// Reads a string-ish field; numeric ids are rendered as strings.
fn string_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative decimal from a JSON string or number, 0 otherwise.
fn decimal_value(value: Option<&Value>) -> BigDecimal {
    let parsed = match value {
        Some(Value::String(s)) => BigDecimal::from_str(s.trim()).ok(),
        Some(Value::Number(n)) => BigDecimal::from_str(&n.to_string()).ok(),
        _ => None,
    };
    parsed
        .filter(|d| *d >= BigDecimal::zero())
        .unwrap_or_else(BigDecimal::zero)
}

/// Non-negative integer from a JSON string or number, 0 otherwise.
fn count_value(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    };
    parsed.filter(|n| *n >= 0).unwrap_or(0)
}
