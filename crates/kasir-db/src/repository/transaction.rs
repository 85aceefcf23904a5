//! # Transaction Repository
//!
//! Persistence for finalized sales.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_checkout(tx)                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for each line:                                                       │
//! │      UPDATE products SET stock = stock - qty                            │
//! │      WHERE id = ? AND stock >= qty        ── 0 rows? ──► ROLLBACK       │
//! │                                                          (InsufficientStock
//! │    INSERT INTO transactions                               or NotFound)  │
//! │    INSERT INTO transaction_items (one per line, with position)          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check in the cart is advisory; this guarded UPDATE is what keeps
//! stock from going negative when two tills sell the last unit.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use kasir_core::{Money, PaymentMethod, Transaction, TransactionItem};

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    user_id: String,
    date: DateTime<Utc>,
    payment_method: PaymentMethod,
    total_sen: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    transaction_id: String,
    product_id: String,
    name: String,
    price_sen: i64,
    quantity: i64,
    subtotal_sen: i64,
}

impl From<ItemRow> for TransactionItem {
    fn from(row: ItemRow) -> Self {
        TransactionItem {
            product_id: row.product_id,
            name: row.name,
            price: Money::from_sen(row.price_sen),
            quantity: row.quantity,
            subtotal: Money::from_sen(row.subtotal_sen),
        }
    }
}

impl TransactionRow {
    fn into_transaction(self, items: Vec<TransactionItem>) -> Transaction {
        Transaction {
            id: self.id,
            user_id: self.user_id,
            date: self.date,
            items,
            payment_method: self.payment_method,
            total: Money::from_sen(self.total_sen),
        }
    }
}

/// Repository for finalized transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Persists a finalized transaction and decrements stock, atomically.
    ///
    /// ## Errors
    /// - `InsufficientStock` if any line exceeds current stock
    /// - `NotFound` if a line's product no longer exists
    /// - `UniqueViolation` if the transaction id was already recorded
    ///
    /// On any error nothing is written.
    pub async fn record_checkout(&self, tx: &Transaction) -> DbResult<()> {
        debug!(
            id = %tx.id,
            items = tx.items.len(),
            total = %tx.total,
            "Recording checkout"
        );

        let mut dbtx = self.pool.begin().await?;

        for item in &tx.items {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(tx.date)
            .execute(&mut *dbtx)
            .await?;

            if updated.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                        .bind(&item.product_id)
                        .fetch_optional(&mut *dbtx)
                        .await?;

                warn!(
                    id = %tx.id,
                    product_id = %item.product_id,
                    requested = item.quantity,
                    available = ?available,
                    "Checkout rejected"
                );

                return Err(match available {
                    Some(available) => DbError::InsufficientStock {
                        product_id: item.product_id.clone(),
                        available,
                        requested: item.quantity,
                    },
                    None => DbError::not_found("Product", &item.product_id),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, date, payment_method, total_sen)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.user_id)
        .bind(tx.date)
        .bind(tx.payment_method)
        .bind(tx.total.sen())
        .execute(&mut *dbtx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("transaction", &tx.id),
            other => other,
        })?;

        for (position, item) in tx.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    transaction_id, position, product_id, name, price_sen, quantity, subtotal_sen
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&tx.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price.sen())
            .bind(item.quantity)
            .bind(item.subtotal.sen())
            .execute(&mut *dbtx)
            .await?;
        }

        dbtx.commit().await?;

        info!(id = %tx.id, total = %tx.total, "Transaction recorded");
        Ok(())
    }

    /// Gets a transaction with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        debug!(id = %id, "Getting transaction by ID");

        let row: Option<TransactionRow> = sqlx::query_as(
            "SELECT id, user_id, date, payment_method, total_sen FROM transactions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT transaction_id, product_id, name, price_sen, quantity, subtotal_sen
            FROM transaction_items
            WHERE transaction_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(row.into_transaction(
            items.into_iter().map(TransactionItem::from).collect(),
        )))
    }

    /// Transactions with `start <= date < end`, oldest first.
    ///
    /// This is the report generator's input.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Transaction>> {
        debug!(start = %start, end = %end, "Listing transactions in range");

        let headers: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, date, payment_method, total_sen
            FROM transactions
            WHERE date >= ?1 AND date < ?2
            ORDER BY date, id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT i.transaction_id, i.product_id, i.name, i.price_sen, i.quantity, i.subtotal_sen
            FROM transaction_items i
            JOIN transactions t ON t.id = i.transaction_id
            WHERE t.date >= ?1 AND t.date < ?2
            ORDER BY i.transaction_id, i.position
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble(headers, items))
    }

    /// The most recent `limit` transactions, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Transaction>> {
        debug!(limit = %limit, "Listing recent transactions");

        let headers: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, date, payment_method, total_sen
            FROM transactions
            ORDER BY date DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT i.transaction_id, i.product_id, i.name, i.price_sen, i.quantity, i.subtotal_sen
            FROM transaction_items i
            WHERE i.transaction_id IN (
                SELECT id FROM transactions ORDER BY date DESC, id DESC LIMIT ?1
            )
            ORDER BY i.transaction_id, i.position
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble(headers, items))
    }

    /// Counts all transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts transactions with `start <= date < end`.
    pub async fn count_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE date >= ?1 AND date < ?2")
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Sum of totals for transactions with `start <= date < end`.
    pub async fn sales_total_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Money> {
        let sen: i64 = sqlx::query_scalar::<Sqlite, i64>(
            "SELECT COALESCE(SUM(total_sen), 0) FROM transactions WHERE date >= ?1 AND date < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_sen(sen))
    }
}

/// Joins item rows onto their headers, keeping header order and line order.
fn assemble(headers: Vec<TransactionRow>, items: Vec<ItemRow>) -> Vec<Transaction> {
    let mut by_tx: HashMap<String, Vec<TransactionItem>> = HashMap::new();
    for row in items {
        by_tx
            .entry(row.transaction_id.clone())
            .or_default()
            .push(TransactionItem::from(row));
    }

    headers
        .into_iter()
        .map(|h| {
            let items = by_tx.remove(&h.id).unwrap_or_default();
            h.into_transaction(items)
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Duration;
    use kasir_core::{Category, Product};

    async fn setup() -> (Database, Product, Product) {
        let db = Database::in_memory().await.unwrap();
        let kopi = Product::new("kopi", "Kopi", Money::from_rupiah(15000), 5, Category::Food);
        let roti = Product::new("roti", "Roti", Money::from_rupiah(20000), 1, Category::Food);
        db.products().insert(&kopi).await.unwrap();
        db.products().insert(&roti).await.unwrap();
        (db, kopi, roti)
    }

    fn sale(items: &[(&Product, i64)]) -> Transaction {
        let mut tx = Transaction::new("kasir-1");
        for (p, qty) in items {
            tx.add_item(p, *qty).unwrap();
        }
        tx.checkout().unwrap()
    }

    #[tokio::test]
    async fn test_record_checkout_persists_and_decrements() {
        let (db, kopi, roti) = setup().await;
        let tx = sale(&[(&kopi, 2), (&roti, 1)]);

        db.transactions().record_checkout(&tx).await.unwrap();

        let stored = db.transactions().get_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.items, tx.items);
        assert_eq!(stored.total, Money::from_rupiah(50000));
        assert_eq!(stored.payment_method, PaymentMethod::Cash);

        let kopi_now = db.products().get_by_id("kopi").await.unwrap().unwrap();
        assert_eq!(kopi_now.stock, 3);
        let roti_now = db.products().get_by_id("roti").await.unwrap().unwrap();
        assert_eq!(roti_now.stock, 0);
    }

    #[tokio::test]
    async fn test_record_checkout_rolls_back_on_short_stock() {
        let (db, kopi, roti) = setup().await;
        db.transactions()
            .record_checkout(&sale(&[(&roti, 1)]))
            .await
            .unwrap();

        // roti is now sold out; this cart was filled before that happened
        let late = sale(&[(&kopi, 2), (&roti, 1)]);
        let err = db.transactions().record_checkout(&late).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock { ref product_id, available: 0, requested: 1 }
                if product_id == "roti"
        ));
        let kopi_now = db.products().get_by_id("kopi").await.unwrap().unwrap();
        assert_eq!(kopi_now.stock, 5);
        assert!(db.transactions().get_by_id(&late.id).await.unwrap().is_none());
        assert_eq!(db.transactions().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_between_and_totals() {
        let (db, kopi, _) = setup().await;
        let repo = db.transactions();

        let mut early = sale(&[(&kopi, 1)]);
        early.date = Utc::now() - Duration::days(2);
        let today = sale(&[(&kopi, 2)]);

        repo.record_checkout(&early).await.unwrap();
        repo.record_checkout(&today).await.unwrap();

        let start = Utc::now() - Duration::hours(1);
        let end = Utc::now() + Duration::hours(1);

        let listed = repo.list_between(start, end).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, today.id);
        assert_eq!(listed[0].items.len(), 1);

        assert_eq!(repo.count_between(start, end).await.unwrap(), 1);
        assert_eq!(
            repo.sales_total_between(start, end).await.unwrap(),
            Money::from_rupiah(30000)
        );
        assert_eq!(
            repo.sales_total_between(end, end + Duration::hours(1))
                .await
                .unwrap(),
            Money::zero()
        );

        let recent = repo.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, today.id);
        assert_eq!(recent[1].items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_double_record_is_rejected() {
        let (db, kopi, _) = setup().await;
        let tx = sale(&[(&kopi, 1)]);
        db.transactions().record_checkout(&tx).await.unwrap();

        let err = db.transactions().record_checkout(&tx).await.unwrap_err();
        assert!(err.is_unique_violation());
        let kopi_now = db.products().get_by_id("kopi").await.unwrap().unwrap();
        assert_eq!(kopi_now.stock, 4);
    }
}
