//! # engine::aggregator
//!
//! Collapses the scored events of one run into one [`AggregatedSignal`] per
//! ticker.
//!
//! ```text
//! sentiment = Σ(e.sentiment · e.upvotes) / Σ(e.upvotes)
//! action    = buy (> 0) | short (< 0) | hold (== 0)
//! ```
//!
//! The returned book is ordered by descending total upvotes; tickers with
//! equal upvotes keep first-seen order.

use std::collections::HashMap;

use crate::models::{Action, AggregatedSignal, SignalEvent};

/// Running sums for one ticker while folding over the events.
#[derive(Debug)]
struct Accumulator {
    ticker:          String,
    links:           Vec<String>,
    weighted_sum:    f64,
    upvotes:         u64,
}

impl Accumulator {
    fn finish(self) -> AggregatedSignal {
        let sentiment = self.weighted_sum / self.upvotes as f64;
        AggregatedSignal {
            ticker:    self.ticker,
            links:     self.links,
            sentiment,
            upvotes:   self.upvotes,
            action:    Action::from_sentiment(sentiment),
        }
    }
}

/// Group events by exact ticker and compute the weighted decision for each.
///
/// An empty input yields an empty book.
pub fn aggregate(events: &[SignalEvent]) -> Vec<AggregatedSignal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Accumulator> = Vec::new();

    for event in events {
        // Zero-upvote events carry no weight and would leave a 0/0 group.
        if event.upvotes == 0 {
            continue;
        }

        let slot = *index.entry(event.ticker.as_str()).or_insert_with(|| {
            groups.push(Accumulator {
                ticker:       event.ticker.clone(),
                links:        Vec::new(),
                weighted_sum: 0.0,
                upvotes:      0,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.links.push(event.link.clone());
        group.weighted_sum += event.sentiment * event.upvotes as f64;
        group.upvotes += event.upvotes;
    }

    let mut book: Vec<AggregatedSignal> = groups.into_iter().map(Accumulator::finish).collect();
    // sort_by is stable → ties stay in first-seen order
    book.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
    book
}

// ─── Tests ────────────────────────────────────────────────────────────────────
