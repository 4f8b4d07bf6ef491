use std::time::Duration;

use isahc::error::ErrorKind;
use isahc::{config::Configurable, prelude::*, HttpClient, Request};
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::{debug, error};

use crate::models::StockRecord;

/// How long the `/health` pre-check may take before the endpoint is treated
/// as unavailable.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const TEMPERATURE: f64 = 0.7;

/// Every way an advise call can fail. None of these crash the caller; all are
/// reported as "no advice available".
#[derive(ThisError, Debug)]
pub enum AdvisorError {
    #[error("inference endpoint is not ready")]
    ServiceUnavailable,

    #[error("could not connect to inference endpoint: {0}")]
    ConnectionFailed(String),

    #[error("inference request timed out")]
    Timeout,

    #[error("inference endpoint returned HTTP {0}")]
    BadStatus(u16),

    #[error("inference response had no choices array")]
    MalformedResponse,

    #[error("inference response contained no completions")]
    EmptyChoices,
}

/// Inputs the advice prompt is built from.
#[derive(Debug, Clone)]
pub struct AdviceInputs {
    pub code: String,
    pub name: String,
    pub open_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

/// Derive advice inputs from a queried row set: open price from the first
/// row, close price and volume from the last.
///
/// Returns None when the row set cannot supply all three values, in which
/// case the advisor must not be invoked.
pub fn advice_inputs(rows: &[StockRecord]) -> Option<AdviceInputs> {
    let first = rows.first()?;
    let last = rows.last()?;
    if !first.price.is_finite() || !last.price.is_finite() || !last.volume.is_finite() {
        return None;
    }
    Some(AdviceInputs {
        code: last.code.clone(),
        name: last.name.clone(),
        open_price: first.price,
        close_price: last.price,
        volume: last.volume,
    })
}

/// Client for a locally hosted completions-style inference endpoint.
///
/// One advisor serves both the CLI and the dashboard, with one timeout and one
/// health-check policy.
pub struct Advisor {
    client: HttpClient,
    endpoint: String,
    max_tokens: u32,
}

impl Advisor {
    pub fn new(endpoint: &str, timeout: Duration, max_tokens: u32) -> crate::error::Result<Self> {
        let client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_tokens,
        })
    }

    /// Ask the local model for a buy/sell/hold suggestion.
    pub async fn advise(&self, inputs: &AdviceInputs) -> Result<String, AdvisorError> {
        self.check_health().await?;

        let prompt = build_prompt(inputs);
        debug!(code = %inputs.code, "requesting advice");

        let payload = serde_json::json!({
            "prompt": prompt,
            "temperature": TEMPERATURE,
            "max_tokens": self.max_tokens,
        });
        let request = Request::builder()
            .uri(format!("{}/v1/completions", self.endpoint))
            .method("POST")
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .map_err(|e| AdvisorError::ConnectionFailed(e.to_string()))?;

        let mut response = self
            .client
            .send_async(request)
            .await
            .map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "completions call failed");
            return Err(AdvisorError::BadStatus(status.as_u16()));
        }
        let text = response
            .text()
            .await
            .map_err(|e| AdvisorError::ConnectionFailed(e.to_string()))?;

        let json: Value =
            serde_json::from_str(&text).map_err(|_| AdvisorError::MalformedResponse)?;
        extract_completion(&json)
    }

    /// Abort early when the inference server is not up yet.
    async fn check_health(&self) -> Result<(), AdvisorError> {
        let request = Request::builder()
            .uri(format!("{}/health", self.endpoint))
            .method("GET")
            .timeout(HEALTH_TIMEOUT)
            .body(())
            .map_err(|e| AdvisorError::ConnectionFailed(e.to_string()))?;

        let response = self
            .client
            .send_async(request)
            .await
            .map_err(classify_transport)?;
        if response.status() != 200 {
            return Err(AdvisorError::ServiceUnavailable);
        }
        Ok(())
    }
}

/// Map transport-level failures onto the advisor taxonomy.
fn classify_transport(err: isahc::Error) -> AdvisorError {
    match err.kind() {
        ErrorKind::Timeout => AdvisorError::Timeout,
        _ => AdvisorError::ConnectionFailed(err.to_string()),
    }
}

/// Pull the first completion's text out of a completions-style response.
fn extract_completion(json: &Value) -> Result<String, AdvisorError> {
    let choices = json
        .get("choices")
        .and_then(Value::as_array)
        .ok_or(AdvisorError::MalformedResponse)?;
    let first = choices.first().ok_or(AdvisorError::EmptyChoices)?;
    let text = first.get("text").and_then(Value::as_str).unwrap_or("");
    Ok(text.trim().to_string())
}

/// Fixed prompt template embedding the five advice inputs.
fn build_prompt(inputs: &AdviceInputs) -> String {
    format!(
        "Analyze the stock {name} ({code}):\n\
         - Open price: {open:.2} CNY\n\
         - Close price: {close:.2} CNY\n\
         - Volume: {volume}\n\
         Provide investment suggestions (e.g., buy, sell, hold) and reasoning.",
        name = inputs.name,
        code = inputs.code,
        open = inputs.open_price,
        close = inputs.close_price,
        volume = format_thousands(inputs.volume),
    )
}

/// Thousands-separated integer rendering for the prompt (320000 -> "320,000").
fn format_thousands(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if whole < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
