use crate::domain::error::{AppError, Result};
use crate::domain::report::{ReportSummary, SalesAnalysis, SalesReport, SeriesPoint};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// SQLite-backed store for analyzed reports.
///
/// The store owns every report after insertion: identifiers are assigned
/// here and rows are only ever inserted whole or deleted whole.
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let db_path_str = db_path
            .to_str()
            .ok_or_else(|| AppError::DatabaseError("DB path is not valid UTF-8".to_string()))?;

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path_str))
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse DB URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        let repository = Self { pool };
        repository.init_schema().await?;
        Ok(repository)
    }

    /// In-memory database for tests. A single connection keeps every
    /// query on the same memory store.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse DB URL: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        let repository = Self { pool };
        repository.init_schema().await?;
        Ok(repository)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                value_column TEXT NOT NULL,
                date_column TEXT,
                total REAL NOT NULL,
                average REAL NOT NULL,
                series_json TEXT NOT NULL,
                chart_png BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create reports table: {e}")))?;

        Ok(())
    }

    /// Insert a finished analysis and return the assigned identifier.
    pub async fn insert_report(
        &self,
        filename: &str,
        uploaded_at: DateTime<Utc>,
        analysis: &SalesAnalysis,
        chart_png: &[u8],
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let series_json = serde_json::to_string(&analysis.series)
            .map_err(|e| AppError::DatabaseError(format!("Failed to serialize series: {e}")))?;

        sqlx::query(
            "INSERT INTO reports (id, filename, uploaded_at, value_column, date_column, total, average, series_json, chart_png)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(filename)
        .bind(uploaded_at)
        .bind(&analysis.value_column)
        .bind(analysis.date_column.as_deref())
        .bind(analysis.total)
        .bind(analysis.average)
        .bind(&series_json)
        .bind(chart_png)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert report: {e}")))?;

        Ok(id)
    }

    /// The most recent uploads, newest first, without the heavy columns.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<ReportSummary>> {
        let summaries = sqlx::query_as::<_, SummaryEntity>(
            "SELECT id, filename, uploaded_at, value_column, date_column, total, average
             FROM reports ORDER BY uploaded_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {e}")))?;

        Ok(summaries.into_iter().map(|e| e.into()).collect())
    }

    /// One full report, chart included.
    pub async fn get_report(&self, id: &str) -> Result<SalesReport> {
        let report = sqlx::query_as::<_, ReportEntity>(
            "SELECT id, filename, uploaded_at, value_column, date_column, total, average, series_json, chart_png
             FROM reports WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch report: {e}")))?;

        match report {
            Some(report) => report.try_into(),
            None => Err(AppError::NotFound(format!("Report not found: {}", id))),
        }
    }

    pub async fn delete_report(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete report: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report not found: {}", id)));
        }
        Ok(())
    }
}

// Internal entities for database mapping

#[derive(sqlx::FromRow)]
struct SummaryEntity {
    id: String,
    filename: String,
    uploaded_at: DateTime<Utc>,
    value_column: String,
    date_column: Option<String>,
    total: f64,
    average: f64,
}

impl From<SummaryEntity> for ReportSummary {
    fn from(e: SummaryEntity) -> Self {
        Self {
            id: e.id,
            filename: e.filename,
            uploaded_at: e.uploaded_at,
            value_column: e.value_column,
            date_column: e.date_column,
            total: e.total,
            average: e.average,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReportEntity {
    id: String,
    filename: String,
    uploaded_at: DateTime<Utc>,
    value_column: String,
    date_column: Option<String>,
    total: f64,
    average: f64,
    series_json: String,
    chart_png: Vec<u8>,
}

impl TryFrom<ReportEntity> for SalesReport {
    type Error = AppError;

    fn try_from(e: ReportEntity) -> Result<Self> {
        let series: Vec<SeriesPoint> = serde_json::from_str(&e.series_json)
            .map_err(|err| AppError::DatabaseError(format!("Corrupt series column: {err}")))?;

        Ok(Self {
            id: e.id,
            filename: e.filename,
            uploaded_at: e.uploaded_at,
            value_column: e.value_column,
            date_column: e.date_column,
            total: e.total,
            average: e.average,
            series,
            chart_png: e.chart_png,
        })
    }
}
