//! # store — Durable Ledger Store
//!
//! Thin abstraction over the keyed document store so the ledger engine can
//! run against SQLite in production and an in-process map in tests.
//!
//! Every call is scoped: one [`Scope`] per (source, top-N) configuration,
//! holding a positions collection keyed by ticker, an append-only actions
//! collection, and exactly one benchmark record.

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::models::{ActionRecord, Position};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// ─── Scope ────────────────────────────────────────────────────────────────────

/// Keyspace for one (signal source, top-N) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub source: String,
    pub top:    u32,
}

impl Scope {
    pub fn new(source: &str, top: u32) -> Self {
        Self { source: source.to_string(), top }
    }

    /// e.g. `wallstreetbets_top25`
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_top{}", self.source, self.top)
    }
}

// ─── LedgerStore ──────────────────────────────────────────────────────────────

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Position for `ticker`, `None` if never opened.
    async fn get_position(&self, scope: &Scope, ticker: &str) -> Result<Option<Position>, LedgerError>;

    /// Insert or replace the position keyed by `position.ticker`.
    async fn upsert_position(&self, scope: &Scope, position: &Position) -> Result<(), LedgerError>;

    /// All positions of a scope, ordered by ticker.
    async fn list_positions(&self, scope: &Scope) -> Result<Vec<Position>, LedgerError>;

    /// Append one audit entry.
    async fn append_action(&self, scope: &Scope, record: &ActionRecord) -> Result<(), LedgerError>;

    /// Audit entries of a scope in insertion order.
    async fn list_actions(&self, scope: &Scope) -> Result<Vec<ActionRecord>, LedgerError>;

    async fn get_benchmark(&self, scope: &Scope) -> Result<Option<Position>, LedgerError>;

    async fn upsert_benchmark(&self, scope: &Scope, benchmark: &Position) -> Result<(), LedgerError>;

    /// Persist one applied decision: the ticker position, its audit entry and
    /// the mirrored benchmark. Backends with transactions write all three or
    /// none.
    async fn record_update(
        &self,
        scope:     &Scope,
        position:  &Position,
        record:    &ActionRecord,
        benchmark: &Position,
    ) -> Result<(), LedgerError> {
        self.upsert_position(scope, position).await?;
        self.append_action(scope, record).await?;
        self.upsert_benchmark(scope, benchmark).await
    }

    /// Remove every position, action and benchmark record of a scope.
    async fn clear_scope(&self, scope: &Scope) -> Result<(), LedgerError>;

    /// Seed an all-zero benchmark record for `symbol` unless one exists.
    async fn ensure_benchmark(&self, scope: &Scope, symbol: &str) -> Result<Position, LedgerError> {
        if let Some(existing) = self.get_benchmark(scope).await? {
            return Ok(existing);
        }
        let seed = Position::empty(symbol);
        self.upsert_benchmark(scope, &seed).await?;
        tracing::info!(scope = %scope, symbol, "Benchmark seeded");
        Ok(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_name_matches_display() {
        let scope = Scope::new("wallstreetbets", 25);
        assert_eq!(scope.name(), "wallstreetbets_top25");
        assert_eq!(scope.name(), format!("{scope}"));
    }
}
