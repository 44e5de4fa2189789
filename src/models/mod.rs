//! Domain models shared across the ledger.

pub mod position;
pub mod signal;

pub use position::{ActionRecord, Position};
pub use signal::{Action, AggregatedSignal, SignalEvent};
