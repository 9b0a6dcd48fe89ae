use crate::domain::portfolio::PortfolioData;
use crate::llm::LlmClient;
use crate::tracking::{FailureRecord, InteractionRecord, TrackingSink};
use std::sync::Arc;

/// Runs one model call and records the interaction to the tracking sink.
///
/// `analyze` never fails: model errors come back to the caller as an
/// `"Error: ..."` analysis string, with the failure logged to the sink
/// instead of the success record. Exactly one model call and exactly one
/// sink append per invocation, whatever the outcome.
pub struct LlmAnalyst {
    llm: Arc<dyn LlmClient>,
    tracking: Arc<dyn TrackingSink>,
}

impl LlmAnalyst {
    pub fn new(llm: Arc<dyn LlmClient>, tracking: Arc<dyn TrackingSink>) -> Self {
        Self { llm, tracking }
    }

    pub async fn analyze(&self, prompt: &str, financial_data: &PortfolioData) -> String {
        match self.llm.generate(prompt).await {
            Ok(response) => {
                let record = InteractionRecord {
                    prompt: prompt.to_string(),
                    financial_data_json: serde_json::to_string_pretty(financial_data)
                        .unwrap_or_else(|_| "{}".to_string()),
                    response: response.clone(),
                };
                if let Err(err) = self.tracking.log_interaction(record).await {
                    tracing::warn!(error = %err, "failed to log LLM interaction to tracking sink");
                }
                response
            }
            Err(err) => {
                tracing::error!(provider = ?self.llm.provider(), error = %err, "LLM call failed");
                let record = FailureRecord {
                    error: format!("{err:#}"),
                    failed_prompt: prompt.to_string(),
                };
                if let Err(log_err) = self.tracking.log_failure(record).await {
                    tracing::warn!(error = %log_err, "failed to log LLM failure to tracking sink");
                }
                format!("Error: Could not get analysis from LLM. {err:#}")
            }
        }
    }
}
