use crate::config::Settings;
use crate::domain::portfolio::{DailyRecord, PortfolioData, TickerResult};
use crate::market::MarketDataClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const TIME_SERIES_FIELD: &str = "Time Series (Daily)";

/// Number of most-recent trading days kept per ticker.
const RECENT_DAYS: usize = 5;

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_alpha_vantage_api_key()?.to_string();
        let base_url = std::env::var("ALPHA_VANTAGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("ALPHA_VANTAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build Alpha Vantage http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_one(&self, ticker: &str) -> TickerResult {
        let params = [
            ("function", "TIME_SERIES_DAILY"),
            ("symbol", ticker),
            ("outputsize", "compact"),
            ("apikey", self.api_key.as_str()),
        ];

        let res = match self.http.get(self.url()).query(&params).send().await {
            Ok(res) => res,
            Err(err) => return TickerResult::failure(format!("Network Error: {err}")),
        };

        let status = res.status();
        if !status.is_success() {
            return TickerResult::failure(format!("HTTP Error: {status}"));
        }

        let text = match res.text().await {
            Ok(text) => text,
            Err(err) => return TickerResult::failure(format!("An unexpected error: {err}")),
        };

        classify_body(&text)
    }
}

#[async_trait::async_trait]
impl MarketDataClient for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_daily(&self, tickers: &[String]) -> Result<PortfolioData> {
        let mut portfolio = PortfolioData::with_capacity(tickers.len());

        // Strictly sequential; a failed ticker never aborts the batch.
        for ticker in tickers {
            let result = self.fetch_one(ticker).await;
            if let TickerResult::Failure { error } = &result {
                tracing::warn!(%ticker, error = %error, "daily fetch failed; continuing with next ticker");
            }
            portfolio.insert(ticker.clone(), result);
        }

        Ok(portfolio)
    }
}

/// Maps one provider response body onto the per-ticker result.
///
/// Classification order: provider-reported error, rate-limit note, missing
/// time series, then success. Anything unparseable falls into the
/// unexpected-error bucket.
fn classify_body(text: &str) -> TickerResult {
    let body = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(err) => return TickerResult::failure(format!("An unexpected error: {err}")),
    };

    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return TickerResult::failure(message);
    }

    if let Some(note) = body.get("Note").and_then(Value::as_str) {
        return TickerResult::failure(note);
    }

    // An empty series object counts as missing.
    let Some(series) = body
        .get(TIME_SERIES_FIELD)
        .and_then(Value::as_object)
        .filter(|series| !series.is_empty())
    else {
        return TickerResult::failure("No time series data found.");
    };

    // Keep provider order (most-recent-first); no re-sorting.
    let records = series
        .iter()
        .take(RECENT_DAYS)
        .map(|(date, bar)| DailyRecord {
            date: date.clone(),
            open: field(bar, "1. open"),
            high: field(bar, "2. high"),
            low: field(bar, "3. low"),
            close: field(bar, "4. close"),
            volume: field(bar, "5. volume"),
        })
        .collect();

    TickerResult::data(records)
}

fn field(bar: &Value, label: &str) -> Option<String> {
    bar.get(label).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bar(open: &str, close: &str) -> Value {
        json!({
            "1. open": open,
            "2. high": "153.10",
            "3. low": "149.20",
            "4. close": close,
            "5. volume": "48201300",
        })
    }

    #[test]
    fn classifies_provider_error_message() {
        let body = json!({
            "Error Message": "Invalid API call. Please retry or visit the documentation."
        });

        let result = classify_body(&body.to_string());
        assert_eq!(
            result,
            TickerResult::failure("Invalid API call. Please retry or visit the documentation.")
        );
    }

    #[test]
    fn classifies_rate_limit_note() {
        let body = json!({
            "Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
        });

        let result = classify_body(&body.to_string());
        assert!(matches!(result, TickerResult::Failure { ref error } if error.starts_with("Thank you")));
    }

    #[test]
    fn classifies_missing_time_series() {
        let body = json!({"Meta Data": {"2. Symbol": "MSFT"}});

        let result = classify_body(&body.to_string());
        assert_eq!(result, TickerResult::failure("No time series data found."));
    }

    #[test]
    fn empty_series_object_is_classified_as_no_data() {
        let body = json!({"Time Series (Daily)": {}});

        let result = classify_body(&body.to_string());
        assert_eq!(result, TickerResult::failure("No time series data found."));
    }

    #[test]
    fn classifies_non_json_body_as_unexpected() {
        let result = classify_body("<html>upstream proxy error</html>");
        assert!(matches!(result, TickerResult::Failure { ref error } if error.starts_with("An unexpected error: ")));
    }

    #[test]
    fn keeps_at_most_five_records_in_provider_order() {
        // Seven days, most-recent-first, deliberately not in key-sorted order
        // after truncation would reorder them.
        let body = format!(
            r#"{{"Time Series (Daily)": {{
                "2025-10-28": {b},
                "2025-10-27": {b},
                "2025-10-24": {b},
                "2025-10-23": {b},
                "2025-10-22": {b},
                "2025-10-21": {b},
                "2025-10-20": {b}
            }}}}"#,
            b = bar("150.00", "152.00")
        );

        let TickerResult::Data { data } = classify_body(&body) else {
            panic!("expected data result");
        };

        assert_eq!(data.len(), 5);
        assert_eq!(data[0].date, "2025-10-28");
        assert_eq!(data[4].date, "2025-10-22");
    }

    #[test]
    fn tolerates_missing_subfields() {
        let body = json!({
            "Time Series (Daily)": {
                "2025-10-28": {"4. close": "152.00"}
            }
        });

        let TickerResult::Data { data } = classify_body(&body.to_string()) else {
            panic!("expected data result");
        };

        assert_eq!(data[0].date, "2025-10-28");
        assert_eq!(data[0].open, None);
        assert_eq!(data[0].close.as_deref(), Some("152.00"));
        assert_eq!(data[0].volume, None);
    }

    #[tokio::test]
    async fn connection_refused_becomes_network_error_entry() {
        let settings = Settings {
            alpha_vantage_api_key: Some("demo".to_string()),
            ..Settings::default()
        };
        let client = AlphaVantageClient::from_settings(&settings)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let tickers = vec!["MSFT".to_string()];
        let portfolio = client.fetch_daily(&tickers).await.unwrap();

        assert_eq!(portfolio.len(), 1);
        let TickerResult::Failure { error } = &portfolio["MSFT"] else {
            panic!("expected failure entry");
        };
        assert!(error.starts_with("Network Error: "), "got: {error}");
    }
}
