pub mod prompt;

use crate::domain::portfolio::{PortfolioAnalysisResult, TickerResult};
use crate::llm::analyst::LlmAnalyst;
use crate::market::MarketDataClient;
use std::sync::Arc;

/// Analysis returned without calling the model when no ticker produced data.
pub const ALL_TICKERS_FAILED_MESSAGE: &str =
    "Could not perform analysis. All tickers returned errors.";

/// Runs the fetch -> classify -> prompt -> analyze pipeline for one
/// portfolio. Each state is terminal once reached; nothing is retried.
pub struct PortfolioAnalyzer {
    market: Arc<dyn MarketDataClient>,
    analyst: LlmAnalyst,
}

impl PortfolioAnalyzer {
    pub fn new(market: Arc<dyn MarketDataClient>, analyst: LlmAnalyst) -> Self {
        Self { market, analyst }
    }

    pub async fn analyze_portfolio(&self, tickers: &[String]) -> PortfolioAnalysisResult {
        tracing::info!(?tickers, "starting portfolio analysis");

        let raw_data = match self.market.fetch_daily(tickers).await {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(
                    provider = self.market.provider_name(),
                    error = %err,
                    "market data client failed"
                );
                return PortfolioAnalysisResult::Error {
                    error: format!("Failed to fetch data from Alpha Vantage: {err:#}"),
                };
            }
        };

        if raw_data.values().all(TickerResult::is_failure) {
            tracing::warn!("all tickers returned errors; skipping LLM call");
            return PortfolioAnalysisResult::Report {
                analysis: ALL_TICKERS_FAILED_MESSAGE.to_string(),
                raw_data,
            };
        }

        let prompt = match prompt::render_portfolio_prompt(tickers, &raw_data) {
            Ok(prompt) => prompt,
            Err(err) => {
                tracing::error!(error = %err, "prompt rendering failed");
                return PortfolioAnalysisResult::Error {
                    error: format!("Failed to format prompt: {err:#}"),
                };
            }
        };

        let analysis = self.analyst.analyze(&prompt, &raw_data).await;

        tracing::info!("portfolio analysis complete");
        PortfolioAnalysisResult::Report { analysis, raw_data }
    }
}
