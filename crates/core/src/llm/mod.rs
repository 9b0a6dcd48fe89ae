pub mod analyst;
pub mod gemini;

#[derive(Debug, Clone, Copy)]
pub enum Provider {
    Gemini,
}

/// Text-generation boundary. One call per `generate`; no retries.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
