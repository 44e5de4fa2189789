//! # store::sqlite — SQLite Ledger Store
//!
//! `sqlx` SQLite pool. The schema is embedded from `migrations/001_init.sql`
//! and applied on connect, so a fresh file is ready to use.
//!
//! ## Setup
//! 1. Set `DATABASE_URL` in `.env`, e.g. `sqlite://ledger.db`
//! 2. The file is created on first run

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::position::DATE_FORMAT;
use crate::models::{Action, ActionRecord, Position};
use crate::store::{LedgerStore, Scope};

// ─── Pool Init ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
        info!(url = %database_url, "Connecting to SQLite...");

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Single connection: the ledger is a single-writer batch job, and an
        // in-memory database only exists on the connection that created it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        info!("✅ SQLite connected and migrations applied");
        Ok(Self { pool })
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), LedgerError> {
    sqlx::query(include_str!("../../migrations/001_init.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct PositionRow {
    ticker:         String,
    shares:         f64,
    average_price:  f64,
    total_position: f64,
}

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Position {
            ticker:         row.ticker,
            shares:         row.shares,
            average_price:  row.average_price,
            total_position: row.total_position,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ActionRow {
    action_id: String,
    ticker:    String,
    action:    String,
    links:     String,
    timestamp: String,
    sentiment: f64,
    price:     f64,
    shares:    i64,
}

impl TryFrom<ActionRow> for ActionRecord {
    type Error = LedgerError;

    fn try_from(row: ActionRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, detail: String| {
            LedgerError::StoreUnavailable(format!("corrupt action row {}: {what}: {detail}", row.action_id))
        };

        Ok(ActionRecord {
            action_id: Uuid::parse_str(&row.action_id).map_err(|e| corrupt("action_id", e.to_string()))?,
            ticker:    row.ticker.clone(),
            action:    Action::from_str(&row.action).map_err(|e| corrupt("action", e))?,
            links:     serde_json::from_str(&row.links).map_err(|e| corrupt("links", e.to_string()))?,
            timestamp: NaiveDate::parse_from_str(&row.timestamp, DATE_FORMAT)
                .map_err(|e| corrupt("timestamp", e.to_string()))?,
            sentiment: row.sentiment,
            price:     row.price,
            shares:    u64::try_from(row.shares).map_err(|e| corrupt("shares", e.to_string()))?,
        })
    }
}

// ─── Writes ───────────────────────────────────────────────────────────────────
//
// Shared by the single-statement trait methods and `record_update`, which runs
// all three inside one transaction.

async fn write_position(conn: &mut SqliteConnection, scope: &Scope, position: &Position) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO positions (scope, ticker, shares, average_price, total_position)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (scope, ticker) DO UPDATE SET
          shares         = excluded.shares,
          average_price  = excluded.average_price,
          total_position = excluded.total_position
        "#,
    )
    .bind(scope.name())
    .bind(&position.ticker)
    .bind(position.shares)
    .bind(position.average_price)
    .bind(position.total_position)
    .execute(conn)
    .await?;

    Ok(())
}

async fn write_action(conn: &mut SqliteConnection, scope: &Scope, record: &ActionRecord) -> Result<(), LedgerError> {
    let links = serde_json::to_string(&record.links)
        .map_err(|e| LedgerError::StoreUnavailable(format!("links encode failed: {e}")))?;
    let shares = i64::try_from(record.shares).map_err(|e| {
        LedgerError::StoreUnavailable(format!("action {}: shares {} out of range: {e}", record.action_id, record.shares))
    })?;

    sqlx::query(
        r#"
        INSERT INTO actions
          (action_id, scope, ticker, action, links, timestamp, sentiment, price, shares)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(record.action_id.to_string())
    .bind(scope.name())
    .bind(&record.ticker)
    .bind(record.action.as_str())
    .bind(links)
    .bind(record.timestamp.format(DATE_FORMAT).to_string())
    .bind(record.sentiment)
    .bind(record.price)
    .bind(shares)
    .execute(conn)
    .await?;

    Ok(())
}

async fn write_benchmark(conn: &mut SqliteConnection, scope: &Scope, benchmark: &Position) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
        INSERT INTO benchmarks (scope, symbol, shares, average_price, total_position)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (scope) DO UPDATE SET
          symbol         = excluded.symbol,
          shares         = excluded.shares,
          average_price  = excluded.average_price,
          total_position = excluded.total_position
        "#,
    )
    .bind(scope.name())
    .bind(&benchmark.ticker)
    .bind(benchmark.shares)
    .bind(benchmark.average_price)
    .bind(benchmark.total_position)
    .execute(conn)
    .await?;

    Ok(())
}

// ─── LedgerStore ──────────────────────────────────────────────────────────────

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn get_position(&self, scope: &Scope, ticker: &str) -> Result<Option<Position>, LedgerError> {
        let row = sqlx::query_as::<_, PositionRow>(
            r#"
            SELECT ticker, shares, average_price, total_position
            FROM positions
            WHERE scope = ?1 AND ticker = ?2
            "#,
        )
        .bind(scope.name())
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Position::from))
    }

    async fn upsert_position(&self, scope: &Scope, position: &Position) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        write_position(&mut conn, scope, position).await
    }

    async fn list_positions(&self, scope: &Scope) -> Result<Vec<Position>, LedgerError> {
        let rows = sqlx::query_as::<_, PositionRow>(
            r#"
            SELECT ticker, shares, average_price, total_position
            FROM positions
            WHERE scope = ?1
            ORDER BY ticker
            "#,
        )
        .bind(scope.name())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Position::from).collect())
    }

    async fn append_action(&self, scope: &Scope, record: &ActionRecord) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        write_action(&mut conn, scope, record).await
    }

    async fn list_actions(&self, scope: &Scope) -> Result<Vec<ActionRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT action_id, ticker, action, links, timestamp, sentiment, price, shares
            FROM actions
            WHERE scope = ?1
            ORDER BY seq
            "#,
        )
        .bind(scope.name())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ActionRecord::try_from).collect()
    }

    async fn get_benchmark(&self, scope: &Scope) -> Result<Option<Position>, LedgerError> {
        let row = sqlx::query_as::<_, PositionRow>(
            r#"
            SELECT symbol AS ticker, shares, average_price, total_position
            FROM benchmarks
            WHERE scope = ?1
            "#,
        )
        .bind(scope.name())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Position::from))
    }

    async fn upsert_benchmark(&self, scope: &Scope, benchmark: &Position) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        write_benchmark(&mut conn, scope, benchmark).await
    }

    async fn record_update(
        &self,
        scope:     &Scope,
        position:  &Position,
        record:    &ActionRecord,
        benchmark: &Position,
    ) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;
        write_position(&mut tx, scope, position).await?;
        write_action(&mut tx, scope, record).await?;
        write_benchmark(&mut tx, scope, benchmark).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<(), LedgerError> {
        let name = scope.name();
        let mut tx = self.pool.begin().await?;
        for table in ["positions", "actions", "benchmarks"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE scope = ?1"))
                .bind(&name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!(scope = %name, "Scope cleared");
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
