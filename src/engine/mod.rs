//! Signal aggregation and the paper position ledger.

pub mod aggregator;
pub mod benchmark;
pub mod ledger;
