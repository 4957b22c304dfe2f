use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::errors::WebhookError;

/// Decoded PayT postback body: a flat field map, kept verbatim for `raw_data`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookPayload(pub Map<String, Value>);

impl WebhookPayload {
    /// Decodes a request body as JSON when `content_type` says so, as form data when it
    /// declares a form. Without a usable content type, JSON is tried before form decoding.
    ///
    /// An empty body, a JSON `null` and an empty form all decode to an empty payload.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, WebhookError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if mime == "application/json" || mime.ends_with("+json") {
            Self::from_json(body)
        } else if mime == "application/x-www-form-urlencoded" {
            Ok(Self::from_form(body))
        } else {
            Self::from_json(body).or_else(|_| Ok(Self::from_form(body)))
        }
    }

    fn from_json(body: &[u8]) -> Result<Self, WebhookError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| WebhookError::Parse(format!("Invalid JSON body: {}", e)))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(WebhookError::Parse(format!(
                "Expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// URL-encoded form; the first value wins when a key repeats.
    fn from_form(body: &[u8]) -> Self {
        let mut map = Map::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            map.entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First alias holding a non-empty value.
    fn first_present(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find(|v| is_truthy(v))
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.first_present(aliases).map(value_to_text)
    }

    /// Value of a single key as sent, empty strings included; only a missing key or null is absent.
    fn exact_text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .filter(|v| !v.is_null())
            .map(value_to_text)
    }

    /// Transaction identifier from `transaction_id`, falling back to `id`.
    pub fn transaction_id(&self) -> Option<String> {
        self.text(&["transaction_id", "id"])
    }

    /// `status` as sent; "pending" only when the key is missing.
    pub fn status(&self) -> String {
        self.exact_text("status")
            .unwrap_or_else(|| "pending".to_string())
    }

    /// Amount from `amount`, falling back to `value`; 0 when neither is present.
    ///
    /// A present but non-numeric amount is rejected rather than coerced.
    pub fn amount(&self) -> Result<BigDecimal, WebhookError> {
        let Some(raw) = self.first_present(&["amount", "value"]) else {
            return Ok(BigDecimal::zero());
        };

        let parsed = match raw {
            Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
            Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
            _ => None,
        };

        parsed.ok_or_else(|| {
            WebhookError::Validation(format!(
                "could not convert amount to a number: {}",
                value_to_text(raw)
            ))
        })
    }

    pub fn customer_name(&self) -> String {
        self.text(&["customer_name", "name"]).unwrap_or_default()
    }

    pub fn customer_email(&self) -> String {
        self.text(&["customer_email", "email"]).unwrap_or_default()
    }

    pub fn utm(&self, key: &str) -> String {
        self.exact_text(key).unwrap_or_default()
    }
}

/// One row of the `payt_vendas` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleTransactionRecord {
    pub transaction_id: Option<String>,
    pub status: String,
    pub amount: BigDecimal,
    pub customer_name: String,
    pub customer_email: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_content: String,
    pub utm_term: String,
    /// Receipt time on our clock; the provider's own timestamps stay in `raw_data`.
    pub data_venda: DateTime<Utc>,
    pub raw_data: Value,
}

impl SaleTransactionRecord {
    /// Extracts the canonical fields from a non-empty payload.
    pub fn from_payload(
        payload: &WebhookPayload,
        received_at: DateTime<Utc>,
    ) -> Result<Self, WebhookError> {
        Ok(Self {
            transaction_id: payload.transaction_id(),
            status: payload.status(),
            amount: payload.amount()?,
            customer_name: payload.customer_name(),
            customer_email: payload.customer_email(),
            utm_source: payload.utm("utm_source"),
            utm_medium: payload.utm("utm_medium"),
            utm_campaign: payload.utm("utm_campaign"),
            utm_content: payload.utm("utm_content"),
            utm_term: payload.utm("utm_term"),
            data_venda: received_at,
            raw_data: Value::Object(payload.0.clone()),
        })
    }
}

/// Body returned to PayT for accepted or ignored deliveries.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookResponse {
    Success {
        message: String,
        transaction_id: Option<String>,
    },
    Ignored {
        message: String,
    },
}

impl WebhookResponse {
    pub fn success(transaction_id: Option<String>) -> Self {
        WebhookResponse::Success {
            message: "Transaction recorded".to_string(),
            transaction_id,
        }
    }

    pub fn ignored() -> Self {
        WebhookResponse::Ignored {
            message: "Empty data".to_string(),
        }
    }
}

/// Null, empty strings, `false` and zero count as absent for alias fallback.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
