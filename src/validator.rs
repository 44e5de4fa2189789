//! # validator — Ticker Validation
//!
//! A ticker is tradable when the quote provider can price it. Symbols that
//! fail once are remembered in an explicit invalid-ticker cache owned by the
//! validator, so one process run never asks twice about the same junk.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::models::SignalEvent;
use crate::quotes::QuoteProvider;

pub struct TickerValidator {
    quotes:  Arc<dyn QuoteProvider>,
    invalid: HashSet<String>,
}

impl TickerValidator {
    pub fn new<I, S>(quotes: Arc<dyn QuoteProvider>, known_invalid: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            quotes,
            invalid: known_invalid.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_known_invalid(&self, ticker: &str) -> bool {
        self.invalid.contains(ticker)
    }

    /// `true` if `ticker` has a live price. Failures are cached.
    pub async fn validate(&mut self, ticker: &str) -> bool {
        if self.is_known_invalid(ticker) {
            return false;
        }

        match self.quotes.current_price(ticker).await {
            Ok(_) => true,
            Err(e) => {
                debug!(ticker, error = %e, "Ticker rejected — caching as invalid");
                self.invalid.insert(ticker.to_string());
                false
            }
        }
    }

    /// Keep only events whose ticker validates, preserving order.
    pub async fn retain_valid(&mut self, events: Vec<SignalEvent>) -> Vec<SignalEvent> {
        let mut valid = Vec::with_capacity(events.len());
        for event in events {
            if self.validate(&event.ticker).await {
                valid.push(event);
            }
        }
        valid
    }
}
