use crate::config::Settings;
use crate::tracking::{FailureRecord, InteractionRecord, TrackingSink};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_PROJECT: &str = "llm_portfolio_analyzer";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP-backed tracking sink. One authenticated run per process lifetime:
/// `open` at startup (fatal on failure), `finish` at shutdown, table-style
/// appends in between.
#[derive(Debug)]
pub struct HttpTrackingSink {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    run_id: String,
}

impl HttpTrackingSink {
    /// Opens the process-wide tracking run. Call once at startup.
    pub async fn open(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_tracking_api_key()?.to_string();
        let base_url = settings.require_tracking_base_url()?.to_string();
        let project =
            std::env::var("TRACKING_PROJECT").unwrap_or_else(|_| DEFAULT_PROJECT.to_string());

        let timeout_secs = std::env::var("TRACKING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build tracking http client")?;

        let url = format!("{}/api/v1/runs", base_url.trim_end_matches('/'));
        let req = OpenRunRequest {
            project: &project,
            job_type: "llm_analysis",
        };

        let res = http
            .post(url)
            .headers(auth_headers(&api_key)?)
            .json(&req)
            .send()
            .await
            .context("tracking run open request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read tracking run response")?;
        if !status.is_success() {
            anyhow::bail!("tracking run open HTTP {status}: {text}");
        }

        let opened = serde_json::from_str::<OpenRunResponse>(&text)
            .context("failed to parse tracking run response")?;

        tracing::info!(run_id = %opened.run_id, %project, "tracking run opened");

        Ok(Self {
            http,
            base_url,
            api_key,
            run_id: opened.run_id,
        })
    }

    /// Shutdown hook; closes the run after the server drains.
    pub async fn finish(&self) -> Result<()> {
        let url = format!(
            "{}/api/v1/runs/{}/finish",
            self.base_url.trim_end_matches('/'),
            self.run_id
        );

        let res = self
            .http
            .post(url)
            .headers(auth_headers(&self.api_key)?)
            .send()
            .await
            .context("tracking run finish request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("tracking run finish HTTP {status}");
        }

        tracing::info!(run_id = %self.run_id, "tracking run finished");
        Ok(())
    }

    async fn append(&self, kind: &'static str, payload: serde_json::Value) -> Result<()> {
        let url = format!(
            "{}/api/v1/runs/{}/records",
            self.base_url.trim_end_matches('/'),
            self.run_id
        );

        let record = AppendRecord {
            kind,
            logged_at: Utc::now(),
            payload,
        };

        let res = self
            .http
            .post(url)
            .headers(auth_headers(&self.api_key)?)
            .json(&record)
            .send()
            .await
            .context("tracking append request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("tracking append HTTP {status}");
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl TrackingSink for HttpTrackingSink {
    async fn log_interaction(&self, record: InteractionRecord) -> Result<()> {
        let payload =
            serde_json::to_value(&record).context("failed to serialize interaction record")?;
        self.append("llm_trace", payload).await
    }

    async fn log_failure(&self, record: FailureRecord) -> Result<()> {
        let payload =
            serde_json::to_value(&record).context("failed to serialize failure record")?;
        self.append("error", payload).await
    }
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {api_key}"))?,
    );
    Ok(headers)
}

#[derive(Debug, Serialize)]
struct OpenRunRequest<'a> {
    project: &'a str,
    job_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenRunResponse {
    run_id: String,
}

#[derive(Debug, Serialize)]
struct AppendRecord {
    kind: &'static str,
    logged_at: DateTime<Utc>,
    payload: serde_json::Value,
}
