//! # models::position
//!
//! Defines structs for tracking **paper positions** and the **audit trail**.
//!
//! `Position`     = durable holdings and cost basis for one ticker (or the benchmark)
//! `ActionRecord` = append-only log entry for every applied buy/short

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::signal::{Action, AggregatedSignal};

/// Calendar-date format used for persisted action timestamps.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Round a cash amount to cents.
#[inline]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// ─── Position ─────────────────────────────────────────────────────────────────

/// Simulated holdings for one instrument.
///
/// Invariant after every mutation: `total_position == shares * average_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker:         String,
    pub shares:         f64,
    pub average_price:  f64,
    pub total_position: f64,
}

impl Position {
    /// All-zero record, used to seed the benchmark.
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker:         ticker.to_string(),
            shares:         0.0,
            average_price:  0.0,
            total_position: 0.0,
        }
    }

    /// First buy into a ticker: the whole `money_spent` becomes the cost basis.
    pub fn opened(ticker: &str, shares: f64, money_spent: f64) -> Self {
        Self {
            ticker:         ticker.to_string(),
            shares,
            average_price:  money_spent / shares,
            total_position: money_spent,
        }
    }

    /// Buy more: weighted-average cost-basis recomputation.
    pub fn increase(&mut self, shares: f64, money_spent: f64) {
        let new_shares = self.shares + shares;
        if new_shares <= 0.0 {
            return;
        }
        self.average_price  = (self.average_price * self.shares + money_spent) / new_shares;
        self.shares         = new_shares;
        self.total_position = self.shares * self.average_price;
    }

    /// Sell down, floored at zero. The cost basis of the remainder is unchanged.
    pub fn decrease(&mut self, shares: f64) {
        self.shares         = (self.shares - shares).max(0.0);
        self.total_position = self.shares * self.average_price;
    }
}

// ─── ActionRecord ─────────────────────────────────────────────────────────────

/// Audit entry for one applied decision. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_id: Uuid,
    pub ticker:    String,
    pub action:    Action,
    pub links:     Vec<String>,
    pub timestamp: NaiveDate,
    pub sentiment: f64,
    /// Per-share price used for the update.
    pub price:     f64,
    /// Upvote count that drove the action, not the resulting holding.
    pub shares:    u64,
}

impl ActionRecord {
    pub fn from_signal(signal: &AggregatedSignal, price: f64, timestamp: NaiveDate) -> Self {
        Self {
            action_id: Uuid::new_v4(),
            ticker:    signal.ticker.clone(),
            action:    signal.action,
            links:     signal.links.clone(),
            timestamp,
            sentiment: signal.sentiment,
            price,
            shares:    signal.upvotes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(12.345_6), 12.35);
        assert_eq!(round_cents(3.0 * 33.333), 100.0);
    }

    #[test]
    fn test_opened_position() {
        let p = Position::opened("NVDA", 5.0, 50.0);
        assert_eq!(p.shares, 5.0);
        assert!(approx(p.average_price, 10.0));
        assert!(approx(p.total_position, 50.0));
    }

    #[test]
    fn test_increase_recomputes_average_cost() {
        let mut p = Position::opened("NVDA", 5.0, 50.0);
        p.increase(5.0, 100.0);
        assert_eq!(p.shares, 10.0);
        assert!(approx(p.average_price, 15.0));
        assert!(approx(p.total_position, 150.0));
    }

    #[test]
    fn test_decrease_clamps_at_zero_and_keeps_basis() {
        let mut p = Position::opened("NVDA", 5.0, 50.0);
        p.decrease(10.0);
        assert_eq!(p.shares, 0.0);
        assert!(approx(p.average_price, 10.0));
        assert_eq!(p.total_position, 0.0);
    }

    #[test]
    fn test_increase_on_empty_seed() {
        let mut p = Position::empty("VOO");
        p.increase(0.25, 100.0);
        assert!(approx(p.shares, 0.25));
        assert!(approx(p.average_price, 400.0));
        assert!(approx(p.total_position, 100.0));
    }

    #[test]
    fn test_increase_by_zero_on_empty_is_noop() {
        let mut p = Position::empty("VOO");
        p.increase(0.0, 0.0);
        assert_eq!(p, Position::empty("VOO"));
    }

    #[test]
    fn test_buy_then_equal_sell_restores_shares() {
        let mut p = Position::opened("AMD", 7.0, 700.0);
        p.increase(3.0, 450.0);
        p.decrease(3.0);
        assert_eq!(p.shares, 7.0);
        assert!(approx(p.total_position, p.shares * p.average_price));
    }
}
