pub mod http;

use serde::Serialize;

/// One successful prompt/response exchange, kept for offline review.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRecord {
    pub prompt: String,
    pub financial_data_json: String,
    pub response: String,
}

/// A failed model call, with the prompt that triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub error: String,
    pub failed_prompt: String,
}

/// Write-only experiment log. Appends are fire-and-forget from the caller's
/// point of view; implementations report failures but must not retry.
#[async_trait::async_trait]
pub trait TrackingSink: Send + Sync {
    async fn log_interaction(&self, record: InteractionRecord) -> anyhow::Result<()>;

    async fn log_failure(&self, record: FailureRecord) -> anyhow::Result<()>;
}
