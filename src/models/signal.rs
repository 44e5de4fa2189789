//! # models::signal
//!
//! Defines [`SignalEvent`], one scored opinion about a ticker, and
//! [`AggregatedSignal`], the single decision collapsed from all events for
//! that ticker in one run.

use serde::{Deserialize, Serialize};

// ─── Action ───────────────────────────────────────────────────────────────────

/// Discrete decision derived from the sign of the aggregated sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Short,
    /// Exactly neutral sentiment. The ledger never touches the store for it.
    Hold,
}

impl Action {
    /// `> 0` buys, `< 0` shorts, exact zero holds.
    pub fn from_sentiment(sentiment: f64) -> Self {
        if sentiment > 0.0 {
            Action::Buy
        } else if sentiment < 0.0 {
            Action::Short
        } else {
            Action::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy   => "buy",
            Action::Short => "short",
            Action::Hold  => "hold",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy"   => Ok(Action::Buy),
            "short" => Ok(Action::Short),
            "hold"  => Ok(Action::Hold),
            other   => Err(format!("unknown action '{other}'")),
        }
    }
}

// ─── SignalEvent ──────────────────────────────────────────────────────────────

/// A single qualifying social post, already ticker-tagged and scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// Ticker symbol as supplied upstream (case-sensitive).
    pub ticker: String,
    /// Compound polarity score in `[-1, 1]`.
    pub sentiment: f64,
    /// Upvote count, always `>= 1`.
    pub upvotes: u64,
    /// Permalink of the post.
    pub link: String,
}

impl SignalEvent {
    pub fn new(ticker: &str, sentiment: f64, upvotes: u64, link: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            sentiment,
            upvotes,
            link: link.to_string(),
        }
    }
}

// ─── AggregatedSignal ─────────────────────────────────────────────────────────

/// The upvote-weighted decision for one ticker in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSignal {
    pub ticker:    String,
    /// Contributing links in first-seen order.
    pub links:     Vec<String>,
    /// `Σ(sentiment · upvotes) / Σ(upvotes)`
    pub sentiment: f64,
    /// `Σ(upvotes)`
    pub upvotes:   u64,
    pub action:    Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_sentiment() {
        assert_eq!(Action::from_sentiment(0.42), Action::Buy);
        assert_eq!(Action::from_sentiment(-0.01), Action::Short);
        assert_eq!(Action::from_sentiment(0.0), Action::Hold);
        assert_eq!(Action::from_sentiment(-0.0), Action::Hold);
    }

    #[test]
    fn test_action_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Short).unwrap(), r#""short""#);
        assert_eq!(Action::Buy.to_string(), "buy");
    }
}
