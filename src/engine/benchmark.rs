//! # engine::benchmark
//!
//! Shadow position in one reference instrument: "what if the money that
//! moved in or out of individual tickers had moved the benchmark instead".
//!
//! ```text
//! delta = money_spent / benchmark_open
//! buy   → shares += delta, weighted-average cost recomputed
//! short → shares -= delta, floored at zero, cost basis unchanged
//! ```

use crate::models::{Action, Position};

pub const DEFAULT_BENCHMARK: &str = "VOO";

#[derive(Debug, Clone)]
pub struct BenchmarkTracker {
    symbol: String,
}

impl BenchmarkTracker {
    pub fn new(symbol: &str) -> Self {
        Self { symbol: symbol.to_string() }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Benchmark shares equivalent to `money_spent` at `benchmark_price`.
    pub fn shares_for(money_spent: f64, benchmark_price: f64) -> f64 {
        money_spent / benchmark_price
    }

    /// Mirror one ticker's capital flow into `benchmark`. Returns the share
    /// delta applied (before any zero floor). `Hold` leaves it untouched.
    pub fn mirror(
        &self,
        benchmark:       &mut Position,
        action:          Action,
        money_spent:     f64,
        benchmark_price: f64,
    ) -> f64 {
        let delta = Self::shares_for(money_spent, benchmark_price);
        match action {
            Action::Buy   => benchmark.increase(delta, money_spent),
            Action::Short => benchmark.decrease(delta),
            Action::Hold  => return 0.0,
        }
        delta
    }
}

impl Default for BenchmarkTracker {
    fn default() -> Self {
        Self::new(DEFAULT_BENCHMARK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_buy_from_seed() {
        let tracker = BenchmarkTracker::default();
        let mut voo = Position::empty(tracker.symbol());

        let delta = tracker.mirror(&mut voo, Action::Buy, 100.0, 400.0);

        assert!(approx(delta, 0.25));
        assert!(approx(voo.shares, 0.25));
        assert!(approx(voo.average_price, 400.0));
        assert!(approx(voo.total_position, 100.0));
    }

    #[test]
    fn test_buys_at_different_opens_average_out() {
        let tracker = BenchmarkTracker::default();
        let mut voo = Position::empty("VOO");

        tracker.mirror(&mut voo, Action::Buy, 400.0, 400.0); // 1 share
        tracker.mirror(&mut voo, Action::Buy, 500.0, 500.0); // 1 share

        assert!(approx(voo.shares, 2.0));
        assert!(approx(voo.average_price, 450.0));
        assert!(approx(voo.total_position, 900.0));
    }

    #[test]
    fn test_short_keeps_basis_and_floors_at_zero() {
        let tracker = BenchmarkTracker::default();
        let mut voo = Position::opened("VOO", 1.0, 400.0);

        tracker.mirror(&mut voo, Action::Short, 200.0, 400.0);
        assert!(approx(voo.shares, 0.5));
        assert!(approx(voo.average_price, 400.0));
        assert!(approx(voo.total_position, 200.0));

        tracker.mirror(&mut voo, Action::Short, 4_000.0, 400.0);
        assert_eq!(voo.shares, 0.0);
        assert_eq!(voo.total_position, 0.0);
    }

    #[test]
    fn test_hold_is_ignored() {
        let tracker = BenchmarkTracker::default();
        let mut voo = Position::opened("VOO", 1.0, 400.0);
        assert_eq!(tracker.mirror(&mut voo, Action::Hold, 100.0, 400.0), 0.0);
        assert_eq!(voo, Position::opened("VOO", 1.0, 400.0));
    }
}
