//! # Cart / Transaction Aggregator
//!
//! The in-progress sale. A [`Transaction`] starts empty when the cashier opens
//! a sale, is mutated by add/remove/update, and is finalized at checkout.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transaction Lifecycle                                │
//! │                                                                         │
//! │   Transaction::new(user)                                                │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐  add_item / remove_item / update_item_quantity / clear    │
//! │   │  Open   │◄─────────────────────────────────────────────┐            │
//! │   └────┬────┘──────────────────────────────────────────────┘            │
//! │        │ checkout()                                                     │
//! │        ▼                                                                │
//! │   ┌─────────┐   persisted by kasir-db, never mutated again              │
//! │   │Finalized│                                                           │
//! │   └─────────┘   a fresh Open transaction takes its place                │
//! │                                                                         │
//! │  INVARIANT: after every mutation, total == Σ items[i].subtotal          │
//! │             (recomputed from scratch, never patched)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Products
//! Adding a product that is already in the cart merges into the existing
//! line: its quantity grows and the stock check applies to the merged
//! quantity. A product id appears in at most one line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Product};

// =============================================================================
// Transaction Item
// =============================================================================

/// A line in a transaction.
///
/// Name and price are frozen when the product is first added; later edits to
/// the catalog do not change an open or finalized sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price at time of sale (frozen).
    pub price: Money,
    pub quantity: i64,
    /// Always `price * quantity`.
    pub subtotal: Money,
}

impl TransactionItem {
    /// Snapshots a product at the given quantity.
    ///
    /// ## Errors
    /// `AmountTooLarge` when the subtotal does not fit.
    pub fn from_product(product: &Product, quantity: i64) -> CoreResult<Self> {
        Ok(TransactionItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            subtotal: product
                .subtotal(quantity)
                .ok_or(CoreError::AmountTooLarge)?,
        })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A sale, open or finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Cashier who rang up the sale.
    pub user_id: String,
    /// Creation time while open; checkout time once finalized.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Lines in insertion order.
    pub items: Vec<TransactionItem>,
    pub payment_method: PaymentMethod,
    /// Always the sum of item subtotals.
    pub total: Money,
}

impl Transaction {
    /// Starts an empty sale for `user_id`, paid in cash by default.
    pub fn new(user_id: impl Into<String>) -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            date: Utc::now(),
            items: Vec::new(),
            payment_method: PaymentMethod::default(),
            total: Money::zero(),
        }
    }

    /// Adds `quantity` units of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: its line quantity grows, priced at the
    ///   line's frozen unit price
    /// - Otherwise a new line is appended
    ///
    /// ## Errors
    /// `InsufficientStock` when `quantity <= 0` or the resulting line quantity
    /// exceeds `product.stock`, `AmountTooLarge` when the line or the total
    /// would not fit in [`Money`]. The transaction is left unchanged. Product
    /// stock is never touched here; it is decremented when the finalized
    /// transaction is persisted.
    ///
    /// ```rust
    /// use kasir_core::{Category, CoreError, Money, Product, Transaction};
    ///
    /// let p = Product::new("p1", "Kopi", Money::from_rupiah(15000), 2, Category::Food);
    /// let mut sale = Transaction::new("u1");
    ///
    /// sale.add_item(&p, 2).unwrap();
    /// assert!(matches!(sale.add_item(&p, 1), Err(CoreError::InsufficientStock { .. })));
    /// assert_eq!(sale.total, Money::from_rupiah(30000));
    /// ```
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        let in_cart = self.quantity_of(&product.id);

        let merged = match in_cart.checked_add(quantity) {
            Some(merged) if quantity > 0 && product.can_sell(merged) => merged,
            _ => {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    available: product.stock,
                    requested: in_cart.saturating_add(quantity),
                });
            }
        };

        match self.items.iter().position(|i| i.product_id == product.id) {
            Some(pos) => self.set_line_quantity(pos, merged)?,
            None => {
                let item = TransactionItem::from_product(product, quantity)?;
                self.total = self.total_with(None, item.subtotal)?;
                self.items.push(item);
            }
        }
        Ok(())
    }

    /// Removes the line for `product_id`. No-op if absent.
    pub fn remove_item(&mut self, product_id: &str) {
        if let Some(pos) = self.items.iter().position(|i| i.product_id == product_id) {
            self.items.remove(pos);
        }
        self.recalculate_total();
    }

    /// Sets the quantity of the line for `product_id`.
    ///
    /// A quantity of zero or less removes the line. No-op if absent. The
    /// subtotal is recomputed from the frozen unit price, and stock is not
    /// re-checked.
    ///
    /// ## Errors
    /// `AmountTooLarge` when the new subtotal or total does not fit; the
    /// transaction is left unchanged.
    pub fn update_item_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_item(product_id);
            return Ok(());
        }

        match self.items.iter().position(|i| i.product_id == product_id) {
            Some(pos) => self.set_line_quantity(pos, quantity),
            None => Ok(()),
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate_total();
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities over all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of `product_id` currently in the cart (0 if absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Takes out of this sale what `sold` already contains, line by line.
    ///
    /// Lines that end at zero or less are dropped; lines `sold` does not have
    /// are kept whole.
    pub fn deduct(&mut self, sold: &Transaction) {
        self.items.retain_mut(|item| {
            let left = item.quantity - sold.quantity_of(&item.product_id);
            if left <= 0 {
                return false;
            }
            item.quantity = left;
            item.subtotal = item.price * left;
            true
        });
        self.recalculate_total();
    }

    /// Finalizes the sale at the current time.
    ///
    /// See [`Transaction::checkout_at`].
    pub fn checkout(&mut self) -> CoreResult<Transaction> {
        self.checkout_at(Utc::now())
    }

    /// Finalizes the sale, stamping it with `now`.
    ///
    /// Returns the finalized transaction and leaves `self` as a fresh, empty
    /// sale for the same user.
    ///
    /// ## Errors
    /// `EmptyCart` when there are no lines; `self` is unchanged.
    pub fn checkout_at(&mut self, now: DateTime<Utc>) -> CoreResult<Transaction> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let next = Transaction::new(self.user_id.clone());
        let mut finalized = std::mem::replace(self, next);
        finalized.date = now;
        finalized.recalculate_total();
        Ok(finalized)
    }

    /// Reprices line `pos` at `quantity`, committing only if the line and
    /// the total both fit.
    fn set_line_quantity(&mut self, pos: usize, quantity: i64) -> CoreResult<()> {
        let subtotal = self.items[pos]
            .price
            .multiply_quantity(quantity)
            .ok_or(CoreError::AmountTooLarge)?;
        let total = self.total_with(Some(pos), subtotal)?;

        let item = &mut self.items[pos];
        item.quantity = quantity;
        item.subtotal = subtotal;
        self.total = total;
        Ok(())
    }

    /// Sum of every subtotal, with line `replaced` (if any) counted as
    /// `subtotal` and a new line of `subtotal` otherwise.
    fn total_with(&self, replaced: Option<usize>, subtotal: Money) -> CoreResult<Money> {
        self.items
            .iter()
            .enumerate()
            .filter(|(pos, _)| Some(*pos) != replaced)
            .map(|(_, i)| i.subtotal)
            .try_fold(subtotal, Money::checked_add)
            .ok_or(CoreError::AmountTooLarge)
    }

    // Removing lines only shrinks a total that already fit.
    fn recalculate_total(&mut self) {
        self.total = self.items.iter().map(|i| i.subtotal).sum();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn product(id: &str, rupiah: i64, stock: i64) -> Product {
        Product::new(
            id,
            format!("Product {}", id),
            Money::from_rupiah(rupiah),
            stock,
            Category::Food,
        )
    }

    fn assert_total_consistent(tx: &Transaction) {
        let sum: Money = tx.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(tx.total, sum);
        for item in &tx.items {
            assert_eq!(item.subtotal, item.price * item.quantity);
        }
    }

    #[test]
    fn test_add_items_totals() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("x", 15000, 10), 2).unwrap();
        tx.add_item(&product("y", 20000, 10), 1).unwrap();

        assert_eq!(tx.total, Money::from_rupiah(50000));
        assert_eq!(tx.item_count(), 2);
        assert_eq!(tx.total_quantity(), 3);
        assert_total_consistent(&tx);
    }

    #[test]
    fn test_add_same_product_merges_line() {
        let mut tx = Transaction::new("u1");
        let x = product("x", 15000, 10);

        tx.add_item(&x, 2).unwrap();
        tx.add_item(&x, 1).unwrap();

        assert_eq!(tx.item_count(), 1);
        assert_eq!(tx.items[0].quantity, 3);
        assert_eq!(tx.items[0].subtotal, Money::from_rupiah(45000));
        assert_total_consistent(&tx);
    }

    #[test]
    fn test_merge_respects_stock() {
        let mut tx = Transaction::new("u1");
        let x = product("x", 1000, 3);

        tx.add_item(&x, 2).unwrap();
        let err = tx.add_item(&x, 2).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(tx.quantity_of("x"), 2);
    }

    #[test]
    fn test_add_failure_leaves_cart_unchanged() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 5), 1).unwrap();
        let before = tx.clone();

        assert!(tx.add_item(&product("b", 5000, 1), 2).is_err());
        assert!(tx.add_item(&product("b", 5000, 1), 0).is_err());
        assert!(tx.add_item(&product("b", 5000, 1), -3).is_err());

        assert_eq!(tx, before);
    }

    #[test]
    fn test_add_does_not_touch_product_stock() {
        let mut tx = Transaction::new("u1");
        let p = product("a", 10000, 5);
        tx.add_item(&p, 5).unwrap();
        assert_eq!(p.stock, 5);
    }

    #[test]
    fn test_update_quantity_recomputes_subtotal() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 10), 2).unwrap();

        tx.update_item_quantity("a", 5).unwrap();

        assert_eq!(tx.items[0].subtotal, Money::from_rupiah(50000));
        assert_eq!(tx.items[0].price, Money::from_rupiah(10000));
        assert_eq!(tx.total, Money::from_rupiah(50000));
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let mut updated = Transaction::new("u1");
        updated.add_item(&product("a", 10000, 10), 2).unwrap();
        updated.add_item(&product("b", 2500, 10), 4).unwrap();
        let mut removed = updated.clone();

        updated.update_item_quantity("a", 0).unwrap();
        removed.remove_item("a");

        assert_eq!(updated.items, removed.items);
        assert_eq!(updated.total, removed.total);
        assert_eq!(updated.total, Money::from_rupiah(10000));
    }

    #[test]
    fn test_update_negative_removes() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 10), 2).unwrap();
        tx.update_item_quantity("a", -1).unwrap();
        assert!(tx.is_empty());
        assert!(tx.total.is_zero());
    }

    #[test]
    fn test_missing_product_is_noop() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 10), 2).unwrap();
        let before = tx.clone();

        tx.remove_item("missing");
        tx.update_item_quantity("missing", 7).unwrap();

        assert_eq!(tx, before);
    }

    #[test]
    fn test_huge_add_is_insufficient_stock() {
        let mut tx = Transaction::new("u1");
        let a = product("a", 10000, 10);
        tx.add_item(&a, 1).unwrap();
        let before = tx.clone();

        let err = tx.add_item(&a, i64::MAX).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 10, requested: i64::MAX, .. }
        ));
        assert_eq!(tx, before);
    }

    #[test]
    fn test_huge_update_leaves_cart_unchanged() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 10), 1).unwrap();
        tx.add_item(&product("b", 5000, 10), 2).unwrap();
        let before = tx.clone();

        let err = tx.update_item_quantity("a", i64::MAX / 2).unwrap_err();

        assert!(matches!(err, CoreError::AmountTooLarge));
        assert_eq!(tx, before);
        assert_total_consistent(&tx);
    }

    #[test]
    fn test_total_overflow_rejected() {
        let half = Money::from_sen(i64::MAX / 2);
        let emas = Product::new("emas", "Emas Batangan", half, 5, Category::Other);
        let perak = Product::new("perak", "Perak Batangan", half, 5, Category::Other);
        let mut tx = Transaction::new("u1");
        tx.add_item(&emas, 1).unwrap();

        // line subtotal does not fit
        assert!(matches!(tx.add_item(&emas, 2), Err(CoreError::AmountTooLarge)));

        // line fits, then the total is full
        tx.add_item(&perak, 1).unwrap();
        let before = tx.clone();
        assert!(matches!(
            tx.add_item(&product("x", 1, 5), 1),
            Err(CoreError::AmountTooLarge)
        ));

        assert_eq!(tx, before);
        assert_eq!(tx.quantity_of("emas"), 1);
        assert_total_consistent(&tx);
    }

    #[test]
    fn test_deduct_keeps_unsold_lines() {
        let mut sold = Transaction::new("u1");
        sold.add_item(&product("a", 10000, 10), 2).unwrap();
        sold.add_item(&product("b", 5000, 10), 1).unwrap();

        let mut tx = sold.clone();
        tx.add_item(&product("a", 10000, 10), 1).unwrap();
        tx.add_item(&product("c", 2000, 10), 4).unwrap();
        tx.deduct(&sold);

        let left: Vec<_> = tx
            .items
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity))
            .collect();
        assert_eq!(left, vec![("a", 1), ("c", 4)]);
        assert_eq!(tx.total, Money::from_rupiah(18000));
        assert_total_consistent(&tx);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut tx = Transaction::new("u1");
        for id in ["c", "a", "b"] {
            tx.add_item(&product(id, 1000, 10), 1).unwrap();
        }
        tx.remove_item("a");
        let ids: Vec<_> = tx.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_snapshot_price_survives_catalog_change() {
        let mut tx = Transaction::new("u1");
        let mut p = product("a", 10000, 10);
        tx.add_item(&p, 1).unwrap();

        p.price = Money::from_rupiah(12000);
        tx.add_item(&p, 1).unwrap();

        assert_eq!(tx.items[0].price, Money::from_rupiah(10000));
        assert_eq!(tx.total, Money::from_rupiah(20000));
    }

    #[test]
    fn test_clear() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 10), 2).unwrap();
        tx.clear();
        assert!(tx.is_empty());
        assert_eq!(tx.total, Money::zero());
    }

    #[test]
    fn test_checkout_empty_fails() {
        let mut tx = Transaction::new("u1");
        let id = tx.id.clone();
        assert!(matches!(tx.checkout(), Err(CoreError::EmptyCart)));
        assert_eq!(tx.id, id);
    }

    #[test]
    fn test_checkout_replaces_with_fresh_sale() {
        let mut tx = Transaction::new("u1");
        tx.set_payment_method(PaymentMethod::Digital);
        tx.add_item(&product("a", 10000, 10), 3).unwrap();
        let open_id = tx.id.clone();

        let now = Utc::now();
        let done = tx.checkout_at(now).unwrap();

        assert_eq!(done.id, open_id);
        assert_eq!(done.date, now);
        assert_eq!(done.payment_method, PaymentMethod::Digital);
        assert_eq!(done.total, Money::from_rupiah(30000));

        assert_ne!(tx.id, open_id);
        assert_eq!(tx.user_id, "u1");
        assert!(tx.is_empty());
        assert_eq!(tx.payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_serde_shape() {
        let mut tx = Transaction::new("u1");
        tx.add_item(&product("a", 10000, 10), 1).unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["payment_method"], "cash");
        assert_eq!(json["items"][0]["quantity"], 1);
        assert_eq!(json["total"], 1_000_000);
    }
}
