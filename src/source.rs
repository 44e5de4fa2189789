//! # source — Scored Signal Input
//!
//! Reads `<SIGNALS_DIR>/<source>.json`: a JSON array of scored posts
//!
//! ```json
//! [{ "ticker": "TSLA", "sentiment": 0.62, "upvotes": 148, "link": "reddit.com/r/..." }]
//! ```
//!
//! Every element is checked on its own. A malformed element is logged and
//! dropped; the rest of the file still aggregates.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::models::SignalEvent;

#[derive(Debug, Deserialize)]
struct RawEvent {
    ticker:    Option<String>,
    sentiment: Option<f64>,
    upvotes:   Option<i64>,
    link:      Option<String>,
}

/// Validate one JSON element into a [`SignalEvent`].
pub fn parse_event(value: serde_json::Value) -> Result<SignalEvent, LedgerError> {
    let raw: RawEvent = serde_json::from_value(value)
        .map_err(|e| LedgerError::MalformedSignal(format!("not an event object: {e}")))?;

    let ticker = raw
        .ticker
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| LedgerError::MalformedSignal("missing ticker".into()))?;

    let sentiment = raw
        .sentiment
        .ok_or_else(|| LedgerError::MalformedSignal(format!("{ticker}: missing sentiment")))?;
    if !sentiment.is_finite() || !(-1.0..=1.0).contains(&sentiment) {
        return Err(LedgerError::MalformedSignal(format!(
            "{ticker}: sentiment {sentiment} outside [-1, 1]"
        )));
    }

    let upvotes = raw
        .upvotes
        .ok_or_else(|| LedgerError::MalformedSignal(format!("{ticker}: missing upvotes")))?;
    if upvotes < 1 {
        return Err(LedgerError::MalformedSignal(format!("{ticker}: upvotes {upvotes} < 1")));
    }

    let link = raw
        .link
        .ok_or_else(|| LedgerError::MalformedSignal(format!("{ticker}: missing link")))?;

    Ok(SignalEvent::new(&ticker, sentiment, upvotes as u64, &link))
}

/// Parse a batch, dropping malformed elements.
pub fn parse_events(values: Vec<serde_json::Value>) -> Vec<SignalEvent> {
    let total = values.len();
    let events: Vec<SignalEvent> = values
        .into_iter()
        .filter_map(|value| match parse_event(value) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Dropping signal event");
                None
            }
        })
        .collect();

    if events.len() < total {
        info!(kept = events.len(), dropped = total - events.len(), "Signal events parsed");
    }
    events
}

pub fn source_path(dir: &Path, source: &str) -> PathBuf {
    dir.join(format!("{source}.json"))
}

/// Load and parse the scored events for `source`.
pub async fn load_events(dir: &Path, source: &str) -> anyhow::Result<Vec<SignalEvent>> {
    let path = source_path(dir, source);

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read signals file {}", path.display()))?;

    let values: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("Signals file {} is not a JSON array", path.display()))?;

    Ok(parse_events(values))
}
