//! # config — read run configuration from Environment Variables

use std::path::PathBuf;

use anyhow::{bail, Context};

use crate::engine::benchmark::DEFAULT_BENCHMARK;
use crate::quotes::DEFAULT_QUOTE_URL;

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// In-process map, gone at exit (dry runs).
    Memory,
    /// `sqlx` SQLite URL, e.g. `sqlite://ledger.db`
    Sqlite(String),
}

/// Where prices come from.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteBackend {
    /// Every symbol priced at `MOCK_PRICE`.
    Mock(f64),
    /// Base URL of the chart API.
    Http(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Signal sources, processed one after another.
    pub sources:          Vec<String>,
    /// Top-N configuration; together with the source it names the scope.
    pub top_posts:        u32,
    /// Directory with one `<source>.json` per source.
    pub signals_dir:      PathBuf,
    pub store:            StoreBackend,
    pub quotes:           QuoteBackend,
    pub benchmark_symbol: String,
    /// Seed of the invalid-ticker cache.
    pub invalid_tickers:  Vec<String>,
    /// Wipe every configured scope before applying new signals.
    pub reset_ledger:     bool,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let sources = split_list(&var_or("SOURCES", "investing,stocks,wallstreetbets"));
        if sources.is_empty() {
            bail!("SOURCES must name at least one signal source");
        }

        let top_posts: u32 = var_or("TOP_POSTS", "25")
            .parse()
            .context("TOP_POSTS must be a positive integer")?;

        let store = match var_or("DATABASE_URL", "sqlite://ledger.db").as_str() {
            "memory" => StoreBackend::Memory,
            url if url.starts_with("sqlite:") => StoreBackend::Sqlite(url.to_string()),
            other => bail!("Unsupported DATABASE_URL: '{other}'. Use 'memory' or a sqlite: URL"),
        };

        let quotes = match var_or("QUOTE_URL", DEFAULT_QUOTE_URL).as_str() {
            "mock" => {
                let price: f64 = var_or("MOCK_PRICE", "100.0")
                    .parse()
                    .context("MOCK_PRICE must be a number")?;
                QuoteBackend::Mock(price)
            }
            url => QuoteBackend::Http(url.to_string()),
        };

        Ok(Self {
            sources,
            top_posts,
            signals_dir:      PathBuf::from(var_or("SIGNALS_DIR", "signals")),
            store,
            quotes,
            benchmark_symbol: var_or("BENCHMARK_SYMBOL", DEFAULT_BENCHMARK),
            invalid_tickers:  split_list(&var_or("INVALID_TICKERS", "AI")),
            reset_ledger:     matches!(var_or("RESET_LEDGER", "false").to_lowercase().as_str(), "1" | "true" | "yes"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_skips_empty() {
        assert_eq!(
            split_list(" investing, stocks ,,wallstreetbets "),
            vec!["investing", "stocks", "wallstreetbets"]
        );
        assert!(split_list(" , ").is_empty());
    }
}
