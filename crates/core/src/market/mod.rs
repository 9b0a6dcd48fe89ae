pub mod alpha_vantage;

use crate::domain::portfolio::PortfolioData;
use anyhow::Result;

/// Daily price source for a portfolio of tickers.
///
/// Implementations return one entry per requested ticker, in request order.
/// Per-ticker problems are reported as `TickerResult::Failure` entries, not
/// as `Err`; `Err` is reserved for the client itself being unusable.
#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_daily(&self, tickers: &[String]) -> Result<PortfolioData>;
}
