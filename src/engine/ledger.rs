//! # engine::ledger
//!
//! **Position Ledger** — applies one aggregated signal per ticker to the
//! durable paper portfolio.
//!
//! ## Per-ticker state machine
//! ```text
//! absent + buy   → held     open: shares = upvotes, cost = money_spent
//! absent + short → absent   no write, no audit entry
//! held   + buy   → held     weighted-average cost recomputed
//! held   + short → held     shares floored at 0, cost basis unchanged
//! *      + hold  → skipped  no read, no write
//! ```
//!
//! `money_spent = round(upvotes · price, 2)` drives both the ticker and the
//! benchmark mirror. Both prices are looked up before anything is written,
//! and the position, audit entry and benchmark go to the store in one
//! `record_update` call.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::engine::benchmark::BenchmarkTracker;
use crate::error::LedgerError;
use crate::models::position::round_cents;
use crate::models::{Action, ActionRecord, AggregatedSignal, Position};
use crate::quotes::QuoteProvider;
use crate::store::{LedgerStore, Scope};

// ─── Outcome ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    /// Neutral sentiment — nothing read or written.
    Held,
    /// Short on a ticker that was never opened — nothing written.
    ShortIgnored,
    /// Position written, audit entry appended, benchmark mirrored.
    Applied {
        position:  Position,
        benchmark: Position,
    },
}

// ─── Run Report ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub bought:         u32,
    pub shorted:        u32,
    pub held:           u32,
    pub short_ignored:  u32,
    /// (ticker, reason) for every update aborted by a missing quote.
    pub quote_failures: Vec<(String, String)>,
}

impl RunReport {
    pub fn applied(&self) -> u32 {
        self.bought + self.shorted
    }
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub positions: Vec<Position>,
    pub benchmark: Option<Position>,
    /// Number of audit entries recorded so far.
    pub actions:   usize,
}

impl LedgerSnapshot {
    /// Cost basis of every open ticker position.
    pub fn invested(&self) -> f64 {
        self.positions.iter().map(|p| p.total_position).sum()
    }

    pub fn benchmark_invested(&self) -> f64 {
        self.benchmark.as_ref().map(|b| b.total_position).unwrap_or(0.0)
    }
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

pub struct Ledger {
    store:     Arc<dyn LedgerStore>,
    quotes:    Arc<dyn QuoteProvider>,
    benchmark: BenchmarkTracker,
}

impl Ledger {
    pub fn new(
        store:     Arc<dyn LedgerStore>,
        quotes:    Arc<dyn QuoteProvider>,
        benchmark: BenchmarkTracker,
    ) -> Self {
        Self { store, quotes, benchmark }
    }

    pub fn benchmark_symbol(&self) -> &str {
        self.benchmark.symbol()
    }

    /// Seed the scope's benchmark record. Doubles as the store health check
    /// at the start of a run.
    pub async fn ensure_benchmark(&self, scope: &Scope) -> Result<Position, LedgerError> {
        self.store.ensure_benchmark(scope, self.benchmark.symbol()).await
    }

    /// Drop every record of the scope.
    pub async fn reset(&self, scope: &Scope) -> Result<(), LedgerError> {
        warn!(scope = %scope, "🧹 Resetting ledger scope");
        self.store.clear_scope(scope).await
    }

    /// Current holdings and benchmark of a scope.
    pub async fn snapshot(&self, scope: &Scope) -> Result<LedgerSnapshot, LedgerError> {
        let positions = self.store.list_positions(scope).await?;
        let benchmark = self.store.get_benchmark(scope).await?;
        let actions = self.store.list_actions(scope).await?.len();
        Ok(LedgerSnapshot { positions, benchmark, actions })
    }

    /// Apply a single signal.
    ///
    /// `QuoteUnavailable` means nothing was written for this ticker;
    /// `StoreUnavailable` means the scope should be abandoned.
    pub async fn apply_signal(
        &self,
        scope:  &Scope,
        signal: &AggregatedSignal,
        today:  NaiveDate,
    ) -> Result<LedgerOutcome, LedgerError> {
        if signal.action == Action::Hold {
            debug!(ticker = %signal.ticker, "Hold — skipped");
            return Ok(LedgerOutcome::Held);
        }

        let existing = self.store.get_position(scope, &signal.ticker).await?;

        if existing.is_none() && signal.action == Action::Short {
            info!(ticker = %signal.ticker, "Short on unopened position — ignored");
            return Ok(LedgerOutcome::ShortIgnored);
        }

        // ── Prices first: a missing quote must not leave half an update ──────
        let price = self.quotes.current_price(&signal.ticker).await?;
        let benchmark_price = self.quotes.opening_price(self.benchmark.symbol()).await?;

        let upvotes = signal.upvotes as f64;
        let money_spent = round_cents(upvotes * price);

        let position = match (existing, signal.action) {
            (None, _) => Position::opened(&signal.ticker, upvotes, money_spent),
            (Some(mut held), Action::Buy) => {
                held.increase(upvotes, money_spent);
                held
            }
            (Some(mut held), _) => {
                held.decrease(upvotes);
                held
            }
        };

        let mut benchmark = match self.store.get_benchmark(scope).await? {
            Some(b) => b,
            None => Position::empty(self.benchmark.symbol()),
        };
        let delta = self.benchmark.mirror(&mut benchmark, signal.action, money_spent, benchmark_price);

        let record = ActionRecord::from_signal(signal, price, today);
        self.store.record_update(scope, &position, &record, &benchmark).await?;

        info!(
            scope       = %scope,
            ticker      = %signal.ticker,
            action      = %signal.action,
            price,
            money_spent,
            shares      = position.shares,
            avg_price   = position.average_price,
            bench_delta = delta,
            "📒 Position updated"
        );

        Ok(LedgerOutcome::Applied { position, benchmark })
    }

    /// Apply a whole aggregated book in order.
    ///
    /// Quote failures are isolated per ticker and reported; the first store
    /// failure aborts the scope.
    pub async fn apply_all(
        &self,
        scope:   &Scope,
        signals: &[AggregatedSignal],
        today:   NaiveDate,
    ) -> Result<RunReport, LedgerError> {
        let mut report = RunReport::default();

        for signal in signals {
            match self.apply_signal(scope, signal, today).await {
                Ok(LedgerOutcome::Held) => report.held += 1,
                Ok(LedgerOutcome::ShortIgnored) => report.short_ignored += 1,
                Ok(LedgerOutcome::Applied { .. }) => match signal.action {
                    Action::Buy => report.bought += 1,
                    _ => report.shorted += 1,
                },
                Err(e) if e.is_scope_fatal() => {
                    error!(scope = %scope, ticker = %signal.ticker, error = %e, "❌ Store failure — aborting scope");
                    return Err(e);
                }
                Err(e) => {
                    warn!(scope = %scope, ticker = %signal.ticker, error = %e, "⚠️ Update skipped");
                    report.quote_failures.push((signal.ticker.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotes::MockQuotes;
    use crate::store::MemoryStore;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn scope() -> Scope {
        Scope::new("stocks", 25)
    }

    fn signal(ticker: &str, sentiment: f64, upvotes: u64) -> AggregatedSignal {
        AggregatedSignal {
            ticker:    ticker.to_string(),
            links:     vec![format!("reddit.com/r/stocks/{ticker}")],
            sentiment,
            upvotes,
            action:    Action::from_sentiment(sentiment),
        }
    }

    fn ledger(store: Arc<MemoryStore>, quotes: MockQuotes) -> Ledger {
        Ledger::new(store, Arc::new(quotes), BenchmarkTracker::new("VOO"))
    }

    fn quotes(price: f64) -> MockQuotes {
        MockQuotes::new().with_price("TSLA", price).with_price("VOO", 400.0)
    }

    #[tokio::test]
    async fn test_buy_into_absent_position() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), quotes(10.0));

        let outcome = ledger.apply_signal(&scope(), &signal("TSLA", 0.5, 5), day()).await.unwrap();

        let LedgerOutcome::Applied { position, benchmark } = outcome else {
            panic!("expected an applied update");
        };
        assert_eq!(position.shares, 5.0);
        assert!(approx(position.average_price, 10.0));
        assert!(approx(position.total_position, 50.0));
        // 50 / 400
        assert!(approx(benchmark.shares, 0.125));

        let actions = store.list_actions(&scope()).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].shares, 5);
        assert_eq!(actions[0].price, 10.0);
        assert_eq!(actions[0].timestamp, day());
    }

    #[tokio::test]
    async fn test_second_buy_recomputes_average() {
        let store = Arc::new(MemoryStore::new());
        ledger(store.clone(), quotes(10.0))
            .apply_signal(&scope(), &signal("TSLA", 0.5, 5), day())
            .await
            .unwrap();

        ledger(store.clone(), quotes(20.0))
            .apply_signal(&scope(), &signal("TSLA", 0.2, 5), day())
            .await
            .unwrap();

        let pos = store.get_position(&scope(), "TSLA").await.unwrap().unwrap();
        assert_eq!(pos.shares, 10.0);
        assert!(approx(pos.average_price, 15.0));
        assert!(approx(pos.total_position, 150.0));

        let voo = store.get_benchmark(&scope()).await.unwrap().unwrap();
        // (50 + 100) / 400
        assert!(approx(voo.shares, 0.375));
        assert!(approx(voo.total_position, 150.0));
    }

    #[tokio::test]
    async fn test_benchmark_uses_opening_price() {
        let store = Arc::new(MemoryStore::new());
        let quotes = MockQuotes::new()
            .with_price("TSLA", 10.0)
            .with_price("VOO", 500.0)
            .with_opening("VOO", 400.0);
        let ledger = ledger(store.clone(), quotes);

        let outcome = ledger.apply_signal(&scope(), &signal("TSLA", 0.5, 5), day()).await.unwrap();

        let LedgerOutcome::Applied { position, benchmark } = outcome else {
            panic!("expected an applied update");
        };
        // ticker at current price, benchmark at its open: 50 / 400, not 50 / 500
        assert!(approx(position.average_price, 10.0));
        assert!(approx(benchmark.shares, 0.125));
        assert!(approx(benchmark.average_price, 400.0));
    }

    #[tokio::test]
    async fn test_oversized_short_liquidates() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), quotes(10.0));
        ledger.apply_signal(&scope(), &signal("TSLA", 0.5, 5), day()).await.unwrap();

        ledger.apply_signal(&scope(), &signal("TSLA", -0.7, 10), day()).await.unwrap();

        let pos = store.get_position(&scope(), "TSLA").await.unwrap().unwrap();
        assert_eq!(pos.shares, 0.0);
        assert!(approx(pos.average_price, 10.0));
        assert_eq!(pos.total_position, 0.0);

        let voo = store.get_benchmark(&scope()).await.unwrap().unwrap();
        assert_eq!(voo.shares, 0.0);
    }

    #[tokio::test]
    async fn test_short_on_absent_position_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), quotes(10.0));

        let outcome = ledger.apply_signal(&scope(), &signal("TSLA", -0.4, 8), day()).await.unwrap();

        assert_eq!(outcome, LedgerOutcome::ShortIgnored);
        assert!(store.get_position(&scope(), "TSLA").await.unwrap().is_none());
        assert!(store.list_actions(&scope()).await.unwrap().is_empty());
        assert!(store.get_benchmark(&scope()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hold_never_touches_store() {
        let store = Arc::new(MemoryStore::new());
        // offline store: any read or write would fail
        store.set_offline(true);
        let ledger = ledger(store.clone(), quotes(10.0));

        let outcome = ledger.apply_signal(&scope(), &signal("TSLA", 0.0, 8), day()).await.unwrap();
        assert_eq!(outcome, LedgerOutcome::Held);
    }

    #[tokio::test]
    async fn test_buy_then_equal_short_restores_shares() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), quotes(12.34));
        ledger.apply_signal(&scope(), &signal("TSLA", 0.5, 6), day()).await.unwrap();
        let before = store.get_position(&scope(), "TSLA").await.unwrap().unwrap();

        ledger.apply_signal(&scope(), &signal("TSLA", 0.5, 4), day()).await.unwrap();
        ledger.apply_signal(&scope(), &signal("TSLA", -0.5, 4), day()).await.unwrap();

        let after = store.get_position(&scope(), "TSLA").await.unwrap().unwrap();
        assert_eq!(after.shares, before.shares);
        assert!(approx(after.total_position, after.shares * after.average_price));
    }

    #[tokio::test]
    async fn test_missing_quote_aborts_only_that_ticker() {
        let store = Arc::new(MemoryStore::new());
        let quotes = MockQuotes::new().with_price("AMD", 100.0).with_price("VOO", 400.0);
        let ledger = ledger(store.clone(), quotes);

        let book = vec![signal("DELISTED", 0.9, 50), signal("AMD", 0.3, 2)];
        let report = ledger.apply_all(&scope(), &book, day()).await.unwrap();

        assert_eq!(report.bought, 1);
        assert_eq!(report.quote_failures.len(), 1);
        assert_eq!(report.quote_failures[0].0, "DELISTED");
        assert!(store.get_position(&scope(), "DELISTED").await.unwrap().is_none());
        assert!(store.get_position(&scope(), "AMD").await.unwrap().is_some());
        assert_eq!(store.list_actions(&scope()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_benchmark_quote_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), MockQuotes::new().with_price("TSLA", 10.0));

        let err = ledger.apply_signal(&scope(), &signal("TSLA", 0.5, 5), day()).await.unwrap_err();

        assert!(matches!(err, LedgerError::QuoteUnavailable { ref symbol, .. } if symbol == "VOO"));
        assert!(store.get_position(&scope(), "TSLA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_run() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let ledger = ledger(store.clone(), quotes(10.0));

        let book = vec![signal("TSLA", 0.5, 5)];
        let err = ledger.apply_all(&scope(), &book, day()).await.unwrap_err();
        assert!(err.is_scope_fatal());
    }

    #[tokio::test]
    async fn test_snapshot_and_reset() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), MockQuotes::with_fallback(10.0));
        ledger.apply_signal(&scope(), &signal("AAA", 0.4, 3), day()).await.unwrap();
        ledger.apply_signal(&scope(), &signal("BBB", 0.4, 2), day()).await.unwrap();

        let snap = ledger.snapshot(&scope()).await.unwrap();
        assert_eq!(snap.positions.len(), 2);
        assert!(approx(snap.invested(), 50.0));
        assert!(approx(snap.benchmark_invested(), 50.0));
        assert_eq!(snap.actions, 2);

        ledger.reset(&scope()).await.unwrap();
        let snap = ledger.snapshot(&scope()).await.unwrap();
        assert!(snap.positions.is_empty());
        assert!(snap.benchmark.is_none());
        assert_eq!(snap.actions, 0);
    }

    #[tokio::test]
    async fn test_report_counts() {
        let store = Arc::new(MemoryStore::new());
        let quotes = MockQuotes::with_fallback(50.0);
        let ledger = ledger(store.clone(), quotes);

        let book = vec![
            signal("AAA", 0.4, 9),
            signal("BBB", 0.0, 7),
            signal("CCC", -0.2, 5),
            signal("AAA", -0.1, 3),
        ];
        let report = ledger.apply_all(&scope(), &book, day()).await.unwrap();

        assert_eq!(report.bought, 1);
        assert_eq!(report.held, 1);
        assert_eq!(report.short_ignored, 1);
        assert_eq!(report.shorted, 1);
        assert_eq!(report.applied(), 2);
        assert!(report.quote_failures.is_empty());
    }
}
