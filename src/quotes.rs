//! # quotes — Quote Provider
//!
//! The ledger needs exactly one thing from the market: a per-share price.
//!
//! - ordinary tickers trade at their **current** price
//! - the benchmark trades at its **opening** price, so every ticker in a run
//!   mirrors into the same reference level
//!
//! ## Providers
//! 1. `HttpQuotes` — Yahoo-style chart API (`QUOTE_URL`)
//! 2. `MockQuotes` — fixed prices for dev/test (`QUOTE_URL=mock`)

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LedgerError;

pub const DEFAULT_QUOTE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:99.0) Gecko/20100101 Firefox/99.0";

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Live tradable price.
    async fn current_price(&self, symbol: &str) -> Result<f64, LedgerError>;

    /// Price at the session open.
    async fn opening_price(&self, symbol: &str) -> Result<f64, LedgerError>;
}

/// Reject prices the ledger must never divide by or multiply into a position.
fn usable(symbol: &str, price: Option<f64>, field: &str) -> Result<f64, LedgerError> {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        Some(p) => Err(LedgerError::quote(symbol, format!("unusable {field}: {p}"))),
        None => Err(LedgerError::quote(symbol, format!("missing {field}"))),
    }
}

// ─── HTTP Provider ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta:       ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_open:  Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
}

impl ChartResult {
    fn first_open(&self) -> Option<f64> {
        self.indicators
            .as_ref()?
            .quote
            .first()?
            .open
            .iter()
            .flatten()
            .copied()
            .next()
    }
}

pub struct HttpQuotes {
    client:   reqwest::Client,
    base_url: String,
}

impl HttpQuotes {
    pub fn new(base_url: &str) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LedgerError::quote("*", format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chart(&self, symbol: &str) -> Result<ChartResult, LedgerError> {
        let url = format!("{}/v8/finance/chart/{symbol}?range=1d&interval=1d", self.base_url);
        debug!(%url, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::quote(symbol, format!("quote API unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(symbol, http_status = %status, "Quote API returned HTTP error");
            return Err(LedgerError::quote(symbol, format!("HTTP {status}")));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::quote(symbol, format!("quote parse error: {e}")))?;

        body.chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .ok_or_else(|| LedgerError::quote(symbol, "empty chart result"))
    }
}

#[async_trait]
impl QuoteProvider for HttpQuotes {
    async fn current_price(&self, symbol: &str) -> Result<f64, LedgerError> {
        let chart = self.chart(symbol).await?;
        usable(symbol, chart.meta.regular_market_price, "regularMarketPrice")
    }

    async fn opening_price(&self, symbol: &str) -> Result<f64, LedgerError> {
        let chart = self.chart(symbol).await?;
        let open = chart.meta.regular_market_open.or_else(|| chart.first_open());
        usable(symbol, open, "regularMarketOpen")
    }
}

// ─── Mock Provider ────────────────────────────────────────────────────────────

/// Fixed prices. Symbols without an entry fall back to `fallback`, or fail
/// when there is none.
#[derive(Debug, Clone, Default)]
pub struct MockQuotes {
    current:  HashMap<String, f64>,
    opening:  HashMap<String, f64>,
    fallback: Option<f64>,
}

impl MockQuotes {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(price: f64) -> Self {
        Self { fallback: Some(price), ..Self::default() }
    }

    /// Same price for current and opening lookups.
    #[cfg(test)]
    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.current.insert(symbol.to_string(), price);
        self.opening.insert(symbol.to_string(), price);
        self
    }

    #[cfg(test)]
    pub fn with_opening(mut self, symbol: &str, price: f64) -> Self {
        self.opening.insert(symbol.to_string(), price);
        self
    }
}

#[async_trait]
impl QuoteProvider for MockQuotes {
    async fn current_price(&self, symbol: &str) -> Result<f64, LedgerError> {
        usable(symbol, self.current.get(symbol).copied().or(self.fallback), "mock price")
    }

    async fn opening_price(&self, symbol: &str) -> Result<f64, LedgerError> {
        usable(symbol, self.opening.get(symbol).copied().or(self.fallback), "mock open")
    }
}
