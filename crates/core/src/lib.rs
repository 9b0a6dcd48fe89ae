pub mod analysis;
pub mod domain;
pub mod llm;
pub mod market;
pub mod tracking;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub alpha_vantage_api_key: Option<String>,
        pub gemini_api_key: Option<String>,
        pub tracking_api_key: Option<String>,
        pub tracking_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                alpha_vantage_api_key: std::env::var("ALPHA_VANTAGE_API_KEY").ok(),
                gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
                tracking_api_key: std::env::var("TRACKING_API_KEY").ok(),
                tracking_base_url: std::env::var("TRACKING_BASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_alpha_vantage_api_key(&self) -> anyhow::Result<&str> {
            self.alpha_vantage_api_key
                .as_deref()
                .context("ALPHA_VANTAGE_API_KEY is required")
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn require_tracking_api_key(&self) -> anyhow::Result<&str> {
            self.tracking_api_key
                .as_deref()
                .context("TRACKING_API_KEY is required")
        }

        pub fn require_tracking_base_url(&self) -> anyhow::Result<&str> {
            self.tracking_base_url
                .as_deref()
                .context("TRACKING_BASE_URL is required")
        }
    }
}
