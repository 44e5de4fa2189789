//! # pipeline — one batch step per signal source
//!
//! ```text
//! ensure benchmark  → store reachable? (else abort scope)
//! load events       → <SIGNALS_DIR>/<source>.json, malformed dropped
//! validate tickers  → invalid-ticker cache
//! aggregate         → one weighted signal per ticker
//! apply             → positions + audit trail + benchmark
//! ```

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::info;

use crate::engine::aggregator::aggregate;
use crate::engine::ledger::{Ledger, RunReport};
use crate::error::LedgerError;
use crate::models::{AggregatedSignal, SignalEvent};
use crate::source::load_events;
use crate::store::Scope;
use crate::validator::TickerValidator;

pub struct Pipeline {
    ledger:      Ledger,
    validator:   TickerValidator,
    signals_dir: PathBuf,
    top_posts:   u32,
    reset:       bool,
}

impl Pipeline {
    pub fn new(ledger: Ledger, validator: TickerValidator, signals_dir: PathBuf, top_posts: u32) -> Self {
        Self { ledger, validator, signals_dir, top_posts, reset: false }
    }

    /// Clear each scope before its run.
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Run one source end to end.
    pub async fn run_source(&mut self, source: &str, today: NaiveDate) -> anyhow::Result<RunReport> {
        let scope = Scope::new(source, self.top_posts);

        if self.reset {
            self.ledger
                .reset(&scope)
                .await
                .with_context(|| format!("Store unavailable for scope {scope}"))?;
        }

        self.ledger
            .ensure_benchmark(&scope)
            .await
            .with_context(|| format!("Store unavailable for scope {scope}"))?;

        let events = load_events(&self.signals_dir, source).await?;

        let report = self
            .run_events(&scope, events, today)
            .await
            .with_context(|| format!("Scope {scope} aborted"))?;

        Ok(report)
    }

    /// Validate, aggregate and apply an already-loaded batch.
    pub async fn run_events(
        &mut self,
        scope:  &Scope,
        events: Vec<SignalEvent>,
        today:  NaiveDate,
    ) -> Result<RunReport, LedgerError> {
        let received = events.len();
        let events = self.validator.retain_valid(events).await;
        info!(scope = %scope, received, valid = events.len(), "Signals validated");

        let book = aggregate(&events);
        log_book(scope, &book);

        self.ledger.apply_all(scope, &book, today).await
    }
}

fn log_book(scope: &Scope, book: &[AggregatedSignal]) {
    info!(scope = %scope, tickers = book.len(), "📊 Aggregated signals");
    for signal in book {
        info!(
            ticker    = %signal.ticker,
            sentiment = signal.sentiment,
            upvotes   = signal.upvotes,
            action    = %signal.action,
            links     = signal.links.len(),
            "signal"
        );
    }
}
