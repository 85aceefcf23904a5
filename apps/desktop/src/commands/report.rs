//! # Report Commands
//!
//! Daily, weekly and monthly sales reports.
//!
//! ## Generation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ("weekly", "14/10/2026")                                              │
//! │       │  parse period + DD/MM/YYYY                                      │
//! │       ▼                                                                 │
//! │  start_of ──► Sunday 11/10/2026                                        │
//! │  bounds   ──► [11/10 00:00, 18/10 00:00) shop-local, as UTC            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  transactions().list_between(start, end)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  report::generate_report ──► reports().save (upsert "report_w_...")    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Regenerating the same period overwrites the stored report.

use chrono::{NaiveDate, Utc};
use kasir_core::format::{format_currency, format_date, format_percentage, parse_date_short};
use kasir_core::report::{self, Report, ReportPeriod, TopProduct};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState};

const DEFAULT_RECENT: u32 = 30;

/// A best seller with display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductView {
    #[serde(flatten)]
    pub product: TopProduct,
    pub revenue_display: String,
    /// Share of the period's sales, `12.5%`
    pub share_display: String,
}

/// A report as the report screen shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report: Report,
    pub date_display: String,
    pub total_sales_display: String,
    pub average_display: String,
    pub top_products: Vec<TopProductView>,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        let top_products = report
            .top_products
            .iter()
            .map(|p| TopProductView {
                product: p.clone(),
                revenue_display: format_currency(p.total_revenue),
                share_display: format_percentage(p.revenue_share(report.total_sales)),
            })
            .collect();

        ReportResponse {
            date_display: format_date(&report.date),
            total_sales_display: format_currency(report.total_sales),
            average_display: format_currency(report.average_transaction()),
            top_products,
            report,
        }
    }
}

/// Builds and stores the report for the period containing `date`.
async fn build_and_save(
    db: &DbState,
    config: &ConfigState,
    period: ReportPeriod,
    date: NaiveDate,
) -> ApiResult<ReportResponse> {
    let (start, end) = period.bounds(date, config.offset());
    let transactions = db.inner().transactions().list_between(start, end).await?;

    let report = report::generate_report(period, period.start_of(date), &transactions);
    db.inner().reports().save(&report, Utc::now()).await?;

    info!(
        id = %report.id,
        transactions = report.total_transactions,
        total = %report.total_sales,
        "Report generated"
    );
    Ok(ReportResponse::from(report))
}

/// Generates the report for `period` (`daily`, `weekly`, `monthly`) around
/// `date` (`DD/MM/YYYY`).
///
/// ## Errors
/// `ValidationError` for an unknown period or malformed date.
pub async fn generate_report(
    db: &DbState,
    config: &ConfigState,
    period: String,
    date: String,
) -> ApiResult<ReportResponse> {
    debug!(period = %period, date = %date, "generate_report command");

    let period: ReportPeriod = period.parse()?;
    let date = parse_date_short(&date)?;
    build_and_save(db, config, period, date).await
}

/// Today's daily report, in the shop's time zone.
pub async fn today_report(db: &DbState, config: &ConfigState) -> ApiResult<ReportResponse> {
    let today = config.local_date(Utc::now());
    debug!(date = %today, "today_report command");

    build_and_save(db, config, ReportPeriod::Daily, today).await
}

/// A previously generated report.
pub async fn get_report(db: &DbState, id: String) -> ApiResult<ReportResponse> {
    debug!(id = %id, "get_report command");

    db.inner()
        .reports()
        .get_by_id(&id)
        .await?
        .map(ReportResponse::from)
        .ok_or_else(|| ApiError::not_found("Report", &id))
}

/// Latest generated reports, newest first.
pub async fn recent_reports(db: &DbState, limit: Option<u32>) -> ApiResult<Vec<ReportResponse>> {
    let limit = limit.unwrap_or(DEFAULT_RECENT);
    debug!(limit = %limit, "recent_reports command");

    let reports = db.inner().reports().list_recent(limit).await?;
    Ok(reports.into_iter().map(ReportResponse::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::testing;
    use chrono::TimeZone;
    use kasir_core::{Money, Transaction};

    #[tokio::test]
    async fn test_generate_daily_report() {
        let (state, _dir) = testing::app().await;
        let a = testing::stock_product(&state, "a", 15000, 10).await;
        let b = testing::stock_product(&state, "b", 20000, 10).await;

        // 03:00 UTC on 14 Oct is 10:00 WIB the same day
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 3, 0, 0).unwrap();
        let mut first = Transaction::new("u-1");
        first.add_item(&a, 1).unwrap();
        first.add_item(&b, 1).unwrap();
        let mut second = Transaction::new("u-1");
        second.add_item(&a, 1).unwrap();
        for mut sale in [first, second] {
            let sale = sale.checkout_at(at).unwrap();
            state.db.inner().transactions().record_checkout(&sale).await.unwrap();
        }

        let response = generate_report(&state.db, &state.config, "daily".into(), "14/10/2026".into())
            .await
            .unwrap();

        let report = &response.report;
        assert_eq!(report.id, "report_20261014");
        assert_eq!(report.total_sales, Money::from_rupiah(50000));
        assert_eq!(report.total_transactions, 2);
        assert_eq!(report.top_products.len(), 2);
        assert_eq!(report.top_products[0].product_id, "a");
        assert_eq!(report.top_products[0].total_sold, 2);
        assert_eq!(response.top_products[0].share_display, "60.0%");
        assert_eq!(response.total_sales_display, "Rp 50.000");
        assert_eq!(response.date_display, "14 Oktober 2026");

        let stored = get_report(&state.db, report.id.clone()).await.unwrap();
        assert_eq!(&stored.report, report);
    }

    #[tokio::test]
    async fn test_weekly_report_is_dated_sunday() {
        let (state, _dir) = testing::app().await;

        let response = generate_report(&state.db, &state.config, "Weekly".into(), "14/10/2026".into())
            .await
            .unwrap();

        assert_eq!(response.report.date, NaiveDate::from_ymd_opt(2026, 10, 11).unwrap());
        assert!(response.report.is_empty());
        assert!(response.top_products.is_empty());
        assert_eq!(response.average_display, "Rp 0");
    }

    #[tokio::test]
    async fn test_generate_report_rejects_bad_input() {
        let (state, _dir) = testing::app().await;

        let err = generate_report(&state.db, &state.config, "yearly".into(), "14/10/2026".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = generate_report(&state.db, &state.config, "daily".into(), "31/02/2026".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = get_report(&state.db, "report_19990101".into()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_today_report_is_listed() {
        let (state, _dir) = testing::app().await;

        let today = today_report(&state.db, &state.config).await.unwrap();
        assert_eq!(today.report.period, ReportPeriod::Daily);

        let recent = recent_reports(&state.db, None).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].report.id, today.report.id);
    }
}
