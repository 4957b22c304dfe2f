use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures raised while handling an inbound PayT webhook.
///
/// Every variant maps to an HTTP 500 with `{"status": "error", "message": ...}`,
/// which is what the provider expects for a delivery it should retry.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The body could not be decoded as JSON or form data.
    #[error("{0}")]
    Parse(String),
    /// The body decoded but a field has an unusable value.
    #[error("{0}")]
    Validation(String),
    /// The storage backend rejected the insert.
    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Parse(_) | WebhookError::Validation(_) | WebhookError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WebhookError::Parse(_) => "parse",
            WebhookError::Validation(_) => "validation",
            WebhookError::Storage(_) => "storage",
        }
    }
}

impl IntoResponse for WebhookError {
    /// Converts the error into an HTTP response.
    ///
    /// Logs the failure with its kind so that provider retries can be traced.
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            WebhookError::Storage(e) => {
                tracing::error!("❌ Error processing PayT webhook (storage): {}", e);
            }
            other => {
                tracing::error!(
                    "❌ Error processing PayT webhook ({}): {}",
                    other.kind(),
                    other
                );
            }
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Failures reaching or decoding the ads platform insights endpoint.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Meta Ads request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Meta Ads returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The platform answered with its own `{"error": {...}}` envelope.
    #[error("Meta Ads API error {code}: {message}")]
    Platform { code: i64, message: String },
    #[error("Failed to parse Meta Ads response: {0}")]
    Decode(String),
    #[error("Failed to build Meta Ads URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    /// Short operator hint for well-known platform error codes.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FetchError::Platform { code: 190, .. } => Some("access token expired or invalid"),
            FetchError::Platform {
                code: 10 | 100, ..
            } => Some("missing permission for this ad account"),
            FetchError::Platform { code: 4 | 17, .. } => Some("rate limited by the platform"),
            FetchError::Platform { code: 1 | 2, .. } => Some("transient platform error"),
            _ => None,
        }
    }
}

/// Failures writing to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Storage backend error: {0}")]
    Backend(String),
}
