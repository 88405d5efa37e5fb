use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, sqlite::SqlitePool};
use taxlator_core::{CalculationKind, HistoryRecord, HistoryRepository, NewHistoryRecord, RepositoryError};
use tracing::debug;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn database_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_json(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<serde_json::Value, RepositoryError> {
    let text: String = row.try_get(column).map_err(database_error)?;
    serde_json::from_str(&text)
        .map_err(|e| RepositoryError::Database(format!("Failed to parse {column} JSON: {e}")))
}

fn row_to_history_record(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRecord, RepositoryError> {
    let kind: String = row.try_get("kind").map_err(database_error)?;

    Ok(HistoryRecord {
        id: row.try_get("id").map_err(database_error)?,
        kind: CalculationKind::from_str(&kind).map_err(database_error)?,
        input: get_json(row, "input")?,
        result: get_json(row, "result")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

#[async_trait]
impl HistoryRepository for SqliteRepository {
    async fn create_record(
        &self,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO calculation_history (kind, input, result, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(record.kind.as_str())
        .bind(record.input.to_string())
        .bind(record.result.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        let id = result.last_insert_rowid();
        debug!(id, kind = %record.kind, "stored calculation history");
        self.get_record(id).await
    }

    async fn get_record(
        &self,
        id: i64,
    ) -> Result<HistoryRecord, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, kind, input, result, created_at
             FROM calculation_history WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_history_record(&row)
    }

    async fn list_records(
        &self,
        kind: Option<CalculationKind>,
    ) -> Result<Vec<HistoryRecord>, RepositoryError> {
        const BASE_QUERY: &str = "SELECT id, kind, input, result, created_at FROM calculation_history";

        let rows = match kind {
            Some(kind) => {
                sqlx::query(&format!(
                    "{} WHERE kind = ? ORDER BY created_at DESC, id DESC",
                    BASE_QUERY
                ))
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{} ORDER BY created_at DESC, id DESC", BASE_QUERY))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(database_error)?;

        rows.iter().map(row_to_history_record).collect()
    }

    async fn delete_record(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM calculation_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn purge_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM calculation_history WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        debug!(%cutoff, purged = result.rows_affected(), "purged calculation history");
        Ok(result.rows_affected())
    }
}
