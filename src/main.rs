//! # Sentiment Ledger — Paper Trading from Social Sentiment
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  <source>.json   ┌──────────────┐   ┌──────────────┐
//!  │ Scored posts │ ───────────────▶ │  Validator   │──▶│  Aggregator  │
//!  │ (per source) │                  │ ticker cache │   │ (upvote-wtd) │
//!  └──────────────┘                  └──────────────┘   └──────┬───────┘
//!                                                             │ one signal / ticker
//!  ┌──────────────┐   price_of()     ┌──────────────┐          ▼
//!  │ Quote API    │ ◀─────────────── │    Ledger    │ ◀────────┘
//!  └──────────────┘                  │ + Benchmark  │──▶ positions / actions / benchmark
//!                                    └──────────────┘        (SQLite, per scope)
//! ```
//!
//! ## Environment Variables
//!
//! | Variable           | Default                           | Description                    |
//! |--------------------|-----------------------------------|--------------------------------|
//! | `SOURCES`          | `investing,stocks,wallstreetbets` | Sources, processed in order    |
//! | `TOP_POSTS`        | `25`                              | Top-N part of the scope name   |
//! | `SIGNALS_DIR`      | `signals`                         | Holds `<source>.json`          |
//! | `DATABASE_URL`     | `sqlite://ledger.db`              | `memory` for a dry run         |
//! | `QUOTE_URL`        | Yahoo chart API                   | `mock` for fixed prices        |
//! | `MOCK_PRICE`       | `100.0`                           | Price used by `mock`           |
//! | `BENCHMARK_SYMBOL` | `VOO`                             | Reference instrument           |
//! | `INVALID_TICKERS`  | `AI`                              | Known-bad tickers              |
//! | `RESET_LEDGER`     | `false`                           | Wipe scopes before the run     |
//! | `RUST_LOG`         | `sentiment_ledger=debug`          | Tracing filter                 |

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod models;
mod pipeline;
mod quotes;
mod source;
mod store;
mod validator;

use config::{Config, QuoteBackend, StoreBackend};
use engine::{benchmark::BenchmarkTracker, ledger::Ledger};
use pipeline::Pipeline;
use quotes::{HttpQuotes, MockQuotes, QuoteProvider};
use store::{LedgerStore, MemoryStore, Scope, SqliteStore};
use validator::TickerValidator;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — CI/prod can use real env vars) ──────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("sentiment_ledger=debug".parse()?)
                .add_directive("reqwest=warn".parse()?)
                .add_directive("sqlx=warn".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║           SENTIMENT LEDGER — Paper Trading            ║
  ║  Aggregate · Ledger · Benchmark · Audit               ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Config ─────────────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load config")?;
    info!(
        sources   = ?config.sources,
        top       = config.top_posts,
        benchmark = %config.benchmark_symbol,
        store     = ?config.store,
        "Config loaded"
    );

    // ── 4. Collaborators ──────────────────────────────────────────────────────
    let quotes: Arc<dyn QuoteProvider> = match &config.quotes {
        QuoteBackend::Mock(price) => {
            tracing::warn!(price, "QUOTE_URL=mock — every symbol priced at MOCK_PRICE");
            Arc::new(MockQuotes::with_fallback(*price))
        }
        QuoteBackend::Http(url) => Arc::new(HttpQuotes::new(url)?),
    };

    let store: Arc<dyn LedgerStore> = match &config.store {
        StoreBackend::Memory => {
            tracing::warn!("DATABASE_URL=memory — ledger will not survive this run");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite(url) => Arc::new(
            SqliteStore::connect(url)
                .await
                .context("Failed to open ledger database")?,
        ),
    };

    let ledger = Ledger::new(store, quotes.clone(), BenchmarkTracker::new(&config.benchmark_symbol));
    let validator = TickerValidator::new(quotes, config.invalid_tickers.clone());
    let mut pipeline = Pipeline::new(ledger, validator, config.signals_dir.clone(), config.top_posts)
        .with_reset(config.reset_ledger);

    // ── 5. One batch step per source, strictly sequential ─────────────────────
    let today = Local::now().date_naive();

    for source in &config.sources {
        info!(source = %source, "🚀 Processing source");

        match pipeline.run_source(source, today).await {
            Ok(report) => {
                info!(
                    source         = %source,
                    applied        = report.applied(),
                    bought         = report.bought,
                    shorted        = report.shorted,
                    held           = report.held,
                    short_ignored  = report.short_ignored,
                    quote_failures = report.quote_failures.len(),
                    "✅ Source applied"
                );
                log_snapshot(&pipeline, &Scope::new(source, config.top_posts)).await;
            }
            Err(e) => {
                error!(source = %source, error = %format!("{e:#}"), "❌ Source failed — continuing with next");
            }
        }
    }

    Ok(())
}

async fn log_snapshot(pipeline: &Pipeline, scope: &Scope) {
    match pipeline.ledger().snapshot(scope).await {
        Ok(snap) => info!(
            scope              = %scope,
            open_positions     = snap.positions.iter().filter(|p| p.shares > 0.0).count(),
            invested           = snap.invested(),
            benchmark          = %pipeline.ledger().benchmark_symbol(),
            benchmark_invested = snap.benchmark_invested(),
            audit_entries      = snap.actions,
            "Ledger snapshot"
        ),
        Err(e) => error!(scope = %scope, error = %e, "Snapshot unavailable"),
    }
}
