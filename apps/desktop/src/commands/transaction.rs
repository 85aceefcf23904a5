//! # Transaction Commands
//!
//! Sales history. Dates come from the screen as `DD/MM/YYYY` and are read as
//! shop-local calendar days.

use kasir_core::format::parse_date_short;
use kasir_core::{ReportPeriod, Transaction};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState};

const DEFAULT_RECENT: u32 = 20;
const MAX_RECENT: u32 = 500;

/// Sales from the start of `from` to the end of `to`, both inclusive,
/// oldest first.
///
/// ## Errors
/// `ValidationError` for a malformed date or when `from` is after `to`.
pub async fn list_transactions(
    db: &DbState,
    config: &ConfigState,
    from: String,
    to: String,
) -> ApiResult<Vec<Transaction>> {
    debug!(from = %from, to = %to, "list_transactions command");

    let from = parse_date_short(&from)?;
    let to = parse_date_short(&to)?;
    if from > to {
        return Err(ApiError::validation("Start date must not be after end date"));
    }

    let offset = config.offset();
    let (start, _) = ReportPeriod::Daily.bounds(from, offset);
    let (_, end) = ReportPeriod::Daily.bounds(to, offset);

    Ok(db.inner().transactions().list_between(start, end).await?)
}

/// The latest sales, newest first.
pub async fn recent_transactions(db: &DbState, limit: Option<u32>) -> ApiResult<Vec<Transaction>> {
    let limit = limit.unwrap_or(DEFAULT_RECENT).clamp(1, MAX_RECENT);
    debug!(limit = %limit, "recent_transactions command");

    Ok(db.inner().transactions().list_recent(limit).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::testing;
    use chrono::{TimeZone, Utc};
    use kasir_core::{Category, Money, Product};

    async fn sell_at(state: &crate::state::AppState, product: &Product, at: chrono::DateTime<Utc>) {
        let mut sale = Transaction::new("u-1");
        sale.add_item(product, 1).unwrap();
        let sale = sale.checkout_at(at).unwrap();
        state
            .db
            .inner()
            .transactions()
            .record_checkout(&sale)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_transactions_uses_local_days() {
        let (state, _dir) = testing::app().await;
        let kopi = Product::new("kopi", "Kopi", Money::from_rupiah(15000), 10, Category::Food);
        state.db.inner().products().insert(&kopi).await.unwrap();

        // 16:59 UTC is 23:59 on the 15th in WIB, 17:00 UTC is already the 16th
        sell_at(&state, &kopi, Utc.with_ymd_and_hms(2024, 1, 15, 16, 59, 0).unwrap()).await;
        sell_at(&state, &kopi, Utc.with_ymd_and_hms(2024, 1, 15, 17, 0, 0).unwrap()).await;
        sell_at(&state, &kopi, Utc.with_ymd_and_hms(2024, 1, 17, 3, 0, 0).unwrap()).await;

        let day = list_transactions(&state.db, &state.config, "15/01/2024".into(), "15/01/2024".into())
            .await
            .unwrap();
        assert_eq!(day.len(), 1);

        let range = list_transactions(&state.db, &state.config, "16/01/2024".into(), "17/01/2024".into())
            .await
            .unwrap();
        assert_eq!(range.len(), 2);
        assert!(range[0].date < range[1].date);
    }

    #[tokio::test]
    async fn test_list_transactions_rejects_bad_dates() {
        let (state, _dir) = testing::app().await;

        let err = list_transactions(&state.db, &state.config, "2024-01-15".into(), "15/01/2024".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = list_transactions(&state.db, &state.config, "16/01/2024".into(), "15/01/2024".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_recent_transactions() {
        let (state, _dir) = testing::app().await;
        let kopi = Product::new("kopi", "Kopi", Money::from_rupiah(15000), 10, Category::Food);
        state.db.inner().products().insert(&kopi).await.unwrap();
        for day in 1..=3 {
            sell_at(&state, &kopi, Utc.with_ymd_and_hms(2024, 1, day, 5, 0, 0).unwrap()).await;
        }

        let recent = recent_transactions(&state.db, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].date > recent[1].date);
    }
}
