//! # Report Repository
//!
//! Saved report snapshots. A report id is derived from its period and date
//! (`report_20240115`, `weekly_report_20240114`, `monthly_report_202401`),
//! so regenerating a report for the same period overwrites the previous
//! snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use kasir_core::{Money, Report, ReportPeriod, TopProduct};

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: String,
    period: ReportPeriod,
    date: NaiveDate,
    total_sales_sen: i64,
    total_transactions: i64,
    top_products: String,
}

impl TryFrom<ReportRow> for Report {
    type Error = DbError;

    fn try_from(row: ReportRow) -> DbResult<Self> {
        let top_products: Vec<TopProduct> = serde_json::from_str(&row.top_products)?;
        Ok(Report {
            id: row.id,
            period: row.period,
            date: row.date,
            total_sales: Money::from_sen(row.total_sales_sen),
            total_transactions: row.total_transactions,
            top_products,
        })
    }
}

const SELECT_REPORT: &str =
    "SELECT id, period, date, total_sales_sen, total_transactions, top_products FROM reports";

/// Repository for saved reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Saves a report, replacing any snapshot with the same id.
    pub async fn save(&self, report: &Report, generated_at: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %report.id, period = %report.period, "Saving report");

        let top_products = serde_json::to_string(&report.top_products)?;

        sqlx::query(
            r#"
            INSERT INTO reports (
                id, period, date, total_sales_sen, total_transactions, top_products, generated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                period = excluded.period,
                date = excluded.date,
                total_sales_sen = excluded.total_sales_sen,
                total_transactions = excluded.total_transactions,
                top_products = excluded.top_products,
                generated_at = excluded.generated_at
            "#,
        )
        .bind(&report.id)
        .bind(report.period)
        .bind(report.date)
        .bind(report.total_sales.sen())
        .bind(report.total_transactions)
        .bind(&top_products)
        .bind(generated_at)
        .execute(&self.pool)
        .await?;

        info!(
            id = %report.id,
            total_sales = %report.total_sales,
            transactions = report.total_transactions,
            "Report saved"
        );
        Ok(())
    }

    /// Gets a saved report by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Report>> {
        let row: Option<ReportRow> = sqlx::query_as(&format!("{SELECT_REPORT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Report::try_from).transpose()
    }

    /// The `limit` most recently generated reports.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Report>> {
        let rows: Vec<ReportRow> = sqlx::query_as(&format!(
            "{SELECT_REPORT} ORDER BY generated_at DESC, id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Report::try_from).collect()
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Report", id));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
