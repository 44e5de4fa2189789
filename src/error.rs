//! # error
//!
//! Centralised ledger error type.
//!
//! Failures are split by blast radius: a missing quote only spoils one
//! ticker, a dead store spoils the whole scope, a malformed event spoils
//! nothing but itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The quote provider could not price `symbol`.
    #[error("Quote unavailable for {symbol}: {reason}")]
    QuoteUnavailable { symbol: String, reason: String },

    /// The durable store could not be read or written.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A signal event is missing a field or carries an out-of-range value.
    #[error("Malformed signal: {0}")]
    MalformedSignal(String),
}

impl LedgerError {
    pub fn quote(symbol: &str, reason: impl Into<String>) -> Self {
        LedgerError::QuoteUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// `true` when the error invalidates every remaining update in the scope.
    pub fn is_scope_fatal(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}
