use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One trading day's prices for a ticker, with canonical field names.
///
/// The upstream payload labels these fields `1. open` .. `5. volume`; the
/// market client renames them on ingest. Every field except `date` may be
/// absent upstream and is kept as `None` rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: String,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<String>,
}

/// Outcome of the daily-data fetch for a single ticker.
///
/// Serializes to exactly one of `{"data": [...]}` or `{"error": "..."}`,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickerResult {
    Data { data: Vec<DailyRecord> },
    Failure { error: String },
}

impl TickerResult {
    pub fn data(records: Vec<DailyRecord>) -> Self {
        Self::Data { data: records }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Per-ticker results keyed by symbol, in request order. One entry per
/// requested ticker, no duplicates, no omissions.
pub type PortfolioData = IndexMap<String, TickerResult>;

/// Final result of one portfolio analysis.
///
/// `Report` covers both the normal shape and the all-tickers-failed shape
/// (the latter carries a fixed explanatory `analysis` string); `Error` is
/// the pipeline-level failure shape with no `raw_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortfolioAnalysisResult {
    Report {
        analysis: String,
        raw_data: PortfolioData,
    },
    Error {
        error: String,
    },
}
