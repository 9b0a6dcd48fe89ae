use crate::domain::portfolio::PortfolioData;
use anyhow::{Context, Result};

/// Fixed instructional template for the portfolio analysis call.
/// `{tickers_str}` and `{json_data}` are the only substitution points.
const PORTFOLIO_ANALYSIS_PROMPT: &str = "\
You are a concise financial analyst. Your job is to provide a brief, professional analysis
of a user's stock portfolio based on the last 5 days of data.

Do not use conversational language (e.g., \"Hello,\" \"Here is your analysis\").
Do not use markdown formatting.

Provide a short, one-paragraph summary for the overall portfolio, and then
a single-line bullet point for each of the tickers provided: {tickers_str}.

Here is the 5-day data for the portfolio:
{json_data}
";

/// Pure template substitution; performs no validation of the inputs.
pub fn render_portfolio_prompt(tickers: &[String], data: &PortfolioData) -> Result<String> {
    let tickers_str = tickers.join(", ");
    let json_data = serde_json::to_string_pretty(data)
        .context("failed to serialize portfolio data for the prompt")?;

    Ok(PORTFOLIO_ANALYSIS_PROMPT
        .replace("{tickers_str}", &tickers_str)
        .replace("{json_data}", &json_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::{DailyRecord, TickerResult};

    fn sample_data() -> PortfolioData {
        let mut data = PortfolioData::new();
        data.insert(
            "MSFT".to_string(),
            TickerResult::data(vec![DailyRecord {
                date: "2025-10-28".to_string(),
                open: Some("150.00".to_string()),
                high: Some("153.10".to_string()),
                low: Some("149.20".to_string()),
                close: Some("152.00".to_string()),
                volume: Some("10000".to_string()),
            }]),
        );
        data.insert(
            "TESTTICKER".to_string(),
            TickerResult::failure("No time series data found."),
        );
        data
    }

    #[test]
    fn prompt_contains_every_ticker_and_the_serialized_data() {
        let tickers = vec!["MSFT".to_string(), "TESTTICKER".to_string()];
        let prompt = render_portfolio_prompt(&tickers, &sample_data()).unwrap();

        assert!(prompt.contains("MSFT, TESTTICKER"));
        assert!(prompt.contains("\"2025-10-28\""));
        assert!(prompt.contains("No time series data found."));
        assert!(prompt.contains("concise financial analyst"));
        assert!(prompt.contains("Do not use markdown formatting."));
    }

    #[test]
    fn rendering_is_deterministic() {
        let tickers = vec!["MSFT".to_string(), "TESTTICKER".to_string()];
        let a = render_portfolio_prompt(&tickers, &sample_data()).unwrap();
        let b = render_portfolio_prompt(&tickers, &sample_data()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn garbage_in_still_renders_a_prompt() {
        let tickers: Vec<String> = vec![];
        let prompt = render_portfolio_prompt(&tickers, &PortfolioData::new()).unwrap();
        assert!(prompt.contains("tickers provided: ."));
    }
}
