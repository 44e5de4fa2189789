//! # store::memory
//!
//! In-process [`LedgerStore`] backed by `RwLock<HashMap>`s. Used by tests and
//! by `DATABASE_URL=memory` dry runs; nothing survives the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{ActionRecord, Position};
use crate::store::{LedgerStore, Scope};

#[derive(Default)]
pub struct MemoryStore {
    positions:  RwLock<HashMap<Scope, HashMap<String, Position>>>,
    actions:    RwLock<HashMap<Scope, Vec<ActionRecord>>>,
    benchmarks: RwLock<HashMap<Scope, Position>>,
    /// Simulates an unreachable backend when set.
    offline:    AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(LedgerError::StoreUnavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_position(&self, scope: &Scope, ticker: &str) -> Result<Option<Position>, LedgerError> {
        self.check()?;
        let guard = self.positions.read().await;
        Ok(guard.get(scope).and_then(|m| m.get(ticker)).cloned())
    }

    async fn upsert_position(&self, scope: &Scope, position: &Position) -> Result<(), LedgerError> {
        self.check()?;
        let mut guard = self.positions.write().await;
        guard
            .entry(scope.clone())
            .or_default()
            .insert(position.ticker.clone(), position.clone());
        Ok(())
    }

    async fn list_positions(&self, scope: &Scope) -> Result<Vec<Position>, LedgerError> {
        self.check()?;
        let guard = self.positions.read().await;
        let mut out: Vec<Position> = guard
            .get(scope)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(out)
    }

    async fn append_action(&self, scope: &Scope, record: &ActionRecord) -> Result<(), LedgerError> {
        self.check()?;
        let mut guard = self.actions.write().await;
        guard.entry(scope.clone()).or_default().push(record.clone());
        Ok(())
    }

    async fn list_actions(&self, scope: &Scope) -> Result<Vec<ActionRecord>, LedgerError> {
        self.check()?;
        let guard = self.actions.read().await;
        Ok(guard.get(scope).cloned().unwrap_or_default())
    }

    async fn get_benchmark(&self, scope: &Scope) -> Result<Option<Position>, LedgerError> {
        self.check()?;
        let guard = self.benchmarks.read().await;
        Ok(guard.get(scope).cloned())
    }

    async fn upsert_benchmark(&self, scope: &Scope, benchmark: &Position) -> Result<(), LedgerError> {
        self.check()?;
        let mut guard = self.benchmarks.write().await;
        guard.insert(scope.clone(), benchmark.clone());
        Ok(())
    }

    async fn record_update(
        &self,
        scope:     &Scope,
        position:  &Position,
        record:    &ActionRecord,
        benchmark: &Position,
    ) -> Result<(), LedgerError> {
        self.check()?;
        let mut positions = self.positions.write().await;
        let mut actions = self.actions.write().await;
        let mut benchmarks = self.benchmarks.write().await;

        positions
            .entry(scope.clone())
            .or_default()
            .insert(position.ticker.clone(), position.clone());
        actions.entry(scope.clone()).or_default().push(record.clone());
        benchmarks.insert(scope.clone(), benchmark.clone());
        Ok(())
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<(), LedgerError> {
        self.check()?;
        self.positions.write().await.remove(scope);
        self.actions.write().await.remove(scope);
        self.benchmarks.write().await.remove(scope);
        Ok(())
    }
}
