//! # Dashboard Commands
//!
//! Counters for the home screen. The queries only read, so they run
//! concurrently on the pool.

use chrono::Utc;
use kasir_core::format::format_currency;
use kasir_core::{Money, ReportPeriod};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{ConfigState, DbState};

/// Stock at or below this is flagged on the dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub product_count: i64,
    pub transaction_count: i64,
    /// Sales since local midnight.
    pub today_sales: Money,
    pub today_sales_display: String,
    pub low_stock_count: i64,
}

pub async fn dashboard_stats(db: &DbState, config: &ConfigState) -> ApiResult<DashboardStats> {
    debug!("dashboard_stats command");

    let today = config.local_date(Utc::now());
    let (start, end) = ReportPeriod::Daily.bounds(today, config.offset());

    let products = db.inner().products();
    let transactions = db.inner().transactions();

    let (product_count, transaction_count, today_sales, low_stock_count) = tokio::join!(
        products.count(),
        transactions.count(),
        transactions.sales_total_between(start, end),
        products.count_low_stock(LOW_STOCK_THRESHOLD),
    );
    let today_sales = today_sales?;

    Ok(DashboardStats {
        product_count: product_count?,
        transaction_count: transaction_count?,
        today_sales,
        today_sales_display: format_currency(today_sales),
        low_stock_count: low_stock_count?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing;
    use kasir_core::Transaction;

    #[tokio::test]
    async fn test_empty_dashboard() {
        let (state, _dir) = testing::app().await;

        let stats = dashboard_stats(&state.db, &state.config).await.unwrap();
        assert_eq!(stats.product_count, 0);
        assert_eq!(stats.transaction_count, 0);
        assert_eq!(stats.today_sales, Money::zero());
        assert_eq!(stats.today_sales_display, "Rp 0");
        assert_eq!(stats.low_stock_count, 0);
    }

    #[tokio::test]
    async fn test_dashboard_counts_today() {
        let (state, _dir) = testing::app().await;
        let kopi = testing::stock_product(&state, "kopi", 15000, 10).await;
        testing::stock_product(&state, "teh", 5000, 2).await;

        let mut sale = Transaction::new("u-1");
        sale.add_item(&kopi, 2).unwrap();
        let sale = sale.checkout().unwrap();
        state
            .db
            .inner()
            .transactions()
            .record_checkout(&sale)
            .await
            .unwrap();

        let stats = dashboard_stats(&state.db, &state.config).await.unwrap();
        assert_eq!(stats.product_count, 2);
        assert_eq!(stats.transaction_count, 1);
        assert_eq!(stats.today_sales, Money::from_rupiah(30000));
        // teh at 2, kopi at 8 after the sale
        assert_eq!(stats.low_stock_count, 1);
    }
}
