//! # Report Generator
//!
//! Aggregates finalized transactions into a daily, weekly or monthly sales
//! report.
//!
//! ## Aggregation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    generate_report(period, date, txs)                   │
//! │                                                                         │
//! │  transactions ──┬──► total_sales        = Σ tx.total                    │
//! │                 ├──► total_transactions = txs.len()                     │
//! │                 │                                                       │
//! │                 └──► per product id, in input order:                    │
//! │                        first seen  → seed (name, qty, subtotal)         │
//! │                        seen again  → qty += , revenue +=                │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                      stable sort by revenue (desc)                      │
//! │                      ties keep first-seen order                         │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                      truncate to MAX_TOP_PRODUCTS (10)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The generator is a pure function. Selecting which transactions fall into
//! the period is the caller's job; [`ReportPeriod::bounds`] gives the window.

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::cart::Transaction;
use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TOP_PRODUCTS;

// =============================================================================
// Report Period
// =============================================================================

/// Length of the window a report covers.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
        }
    }

    /// First calendar day of the period containing `date`.
    ///
    /// Weeks start on Sunday; months on the 1st.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            ReportPeriod::Daily => date,
            ReportPeriod::Weekly => {
                date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
            }
            ReportPeriod::Monthly => date - Days::new(u64::from(date.day0())),
        }
    }

    /// Half-open calendar window `[start, end)` containing `date`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use kasir_core::ReportPeriod;
    ///
    /// // 2026-10-14 is a Wednesday
    /// let d = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
    /// let (start, end) = ReportPeriod::Weekly.date_range(d);
    /// assert_eq!(start, NaiveDate::from_ymd_opt(2026, 10, 11).unwrap());
    /// assert_eq!(end, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    /// ```
    pub fn date_range(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = self.start_of(date);
        let end = match self {
            ReportPeriod::Daily => start.checked_add_days(Days::new(1)),
            ReportPeriod::Weekly => start.checked_add_days(Days::new(7)),
            ReportPeriod::Monthly => start.checked_add_months(Months::new(1)),
        };
        (start, end.unwrap_or(NaiveDate::MAX))
    }

    /// The calendar window as UTC instants, for a shop at UTC `offset`.
    pub fn bounds(&self, date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let (start, end) = self.date_range(date);
        (local_midnight(start, offset), local_midnight(end, offset))
    }

    /// Report id for a report dated `date`.
    pub fn report_id(&self, date: NaiveDate) -> String {
        match self {
            ReportPeriod::Daily => format!("report_{}", date.format("%Y%m%d")),
            ReportPeriod::Weekly => format!("weekly_report_{}", date.format("%Y%m%d")),
            ReportPeriod::Monthly => format!("monthly_report_{}", date.format("%Y%m")),
        }
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

impl Default for ReportPeriod {
    fn default() -> Self {
        ReportPeriod::Daily
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ReportPeriod::Daily),
            "weekly" => Ok(ReportPeriod::Weekly),
            "monthly" => Ok(ReportPeriod::Monthly),
            _ => Err(ValidationError::NotAllowed {
                field: "period".to_string(),
                allowed: vec![
                    "daily".to_string(),
                    "weekly".to_string(),
                    "monthly".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// A product's cumulative sales inside one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    /// Name from the first line seen for this product.
    pub name: String,
    pub total_sold: i64,
    pub total_revenue: Money,
}

impl TopProduct {
    /// Percentage of `total_sales` this product earned, 0 when there were no
    /// sales.
    pub fn revenue_share(&self, total_sales: Money) -> f64 {
        self.total_revenue.percentage_of(total_sales)
    }
}

/// A sales summary for one period. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Report {
    pub id: String,
    pub period: ReportPeriod,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales: Money,
    pub total_transactions: i64,
    /// At most [`MAX_TOP_PRODUCTS`] entries, revenue descending.
    pub top_products: Vec<TopProduct>,
}

impl Report {
    /// Mean transaction value, zero for an empty report.
    pub fn average_transaction(&self) -> Money {
        if self.total_transactions == 0 {
            return Money::zero();
        }
        Money::from_sen(self.total_sales.sen() / self.total_transactions)
    }

    pub fn is_empty(&self) -> bool {
        self.total_transactions == 0
    }
}

/// Builds a report over `transactions`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::report::{generate_report, ReportPeriod};
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// let report = generate_report(ReportPeriod::Daily, date, &[]);
///
/// assert_eq!(report.id, "report_20261018");
/// assert_eq!(report.total_transactions, 0);
/// assert!(report.top_products.is_empty());
/// ```
pub fn generate_report(
    period: ReportPeriod,
    date: NaiveDate,
    transactions: &[Transaction],
) -> Report {
    let total_sales: Money = transactions.iter().map(|t| t.total).sum();

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut top_products: Vec<TopProduct> = Vec::new();

    for item in transactions.iter().flat_map(|t| t.items.iter()) {
        match index.get(item.product_id.as_str()) {
            Some(&i) => {
                let entry = &mut top_products[i];
                entry.total_sold += item.quantity;
                entry.total_revenue += item.subtotal;
            }
            None => {
                index.insert(item.product_id.as_str(), top_products.len());
                top_products.push(TopProduct {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    total_sold: item.quantity,
                    total_revenue: item.subtotal,
                });
            }
        }
    }

    // sort_by is stable: equal revenue keeps first-seen order
    top_products.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    top_products.truncate(MAX_TOP_PRODUCTS);

    Report {
        id: period.report_id(date),
        period,
        date,
        total_sales,
        total_transactions: transactions.len() as i64,
        top_products,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
