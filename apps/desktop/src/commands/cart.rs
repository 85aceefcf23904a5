//! # Cart Commands
//!
//! Cart manipulation and checkout.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  login ──► empty cart (owned by the cashier)                           │
//! │               │                                                         │
//! │               ▼                                                         │
//! │  add_to_cart / update_cart_item / remove_from_cart / clear_cart        │
//! │               │       (every call returns a CartResponse snapshot)     │
//! │               ▼                                                         │
//! │  set_payment_method (cash | card | digital)                            │
//! │               │                                                         │
//! │               ▼                                                         │
//! │  checkout ──► record_checkout (insert + stock decrement, atomic)       │
//! │               │                                                         │
//! │        ┌──────┴──────┐                                                  │
//! │        ▼             ▼                                                  │
//! │     success        failure                                             │
//! │     Receipt,       ApiError,                                           │
//! │     fresh cart     cart kept as it was                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use kasir_core::format::{format_currency, format_date_time};
use kasir_core::validation::validate_quantity;
use kasir_core::{Money, PaymentMethod, Transaction, TransactionItem};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, CartTotals, ConfigState, DbState, SessionState};

/// Cart response including items and totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<TransactionItem>,
    pub payment_method: PaymentMethod,
    pub totals: CartTotals,
}

impl From<&Transaction> for CartResponse {
    fn from(cart: &Transaction) -> Self {
        CartResponse {
            items: cart.items.clone(),
            payment_method: cart.payment_method,
            totals: CartTotals::from(cart),
        }
    }
}

/// One printed receipt line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub price_display: String,
    pub subtotal_display: String,
}

/// What the checkout screen prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub store_name: String,
    pub cashier: String,
    /// Shop-local time, `18 Oktober 2026 14:05`
    pub date_display: String,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub total_display: String,
    pub transaction: Transaction,
}

impl Receipt {
    fn new(transaction: Transaction, cashier: &str, config: &ConfigState) -> Self {
        let lines = transaction
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.name.clone(),
                quantity: item.quantity,
                price_display: format_currency(item.price),
                subtotal_display: format_currency(item.subtotal),
            })
            .collect();

        Receipt {
            store_name: config.store_name().to_string(),
            cashier: cashier.to_string(),
            date_display: format_date_time(&transaction.date.with_timezone(&config.offset())),
            lines,
            total: transaction.total,
            total_display: format_currency(transaction.total),
            transaction,
        }
    }
}

/// Gets the current cart contents.
pub fn get_cart(cart: &CartState) -> CartResponse {
    debug!("get_cart command");
    cart.with_cart(|t| CartResponse::from(t))
}

/// Adds a product to the cart.
///
/// ## Behavior
/// - If product already in cart: quantity increases
/// - If product not in cart: added as new item
/// - Price is "frozen" at time of adding (won't change if product price updates)
///
/// ## Arguments
/// * `product_id` - Product to add
/// * `quantity` - Quantity to add (default: 1)
///
/// ## Errors
/// `ValidationError` for a quantity below one, `NotFound` for an unknown
/// product, `InsufficientStock` when the line would exceed what is on hand.
/// The cart is unchanged on error.
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    product_id: String,
    quantity: Option<i64>,
) -> ApiResult<CartResponse> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = %product_id, quantity = %quantity, "add_to_cart command");
    validate_quantity(quantity)?;

    let product = db
        .inner()
        .products()
        .get_by_id(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product_id))?;

    cart.with_cart_mut(|c| {
        c.add_item(&product, quantity)?;
        Ok::<_, ApiError>(CartResponse::from(&*c))
    })
}

/// Sets the quantity of a line. Zero or less removes it; unknown products are
/// ignored.
///
/// ## Errors
/// `CartError` when the amount gets too large; the cart is unchanged.
pub fn update_cart_item(
    cart: &CartState,
    product_id: String,
    quantity: i64,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, quantity = %quantity, "update_cart_item command");

    cart.with_cart_mut(|c| {
        c.update_item_quantity(&product_id, quantity)?;
        Ok::<_, ApiError>(CartResponse::from(&*c))
    })
}

/// Removes an item from the cart. Unknown products are ignored.
pub fn remove_from_cart(cart: &CartState, product_id: String) -> CartResponse {
    debug!(product_id = %product_id, "remove_from_cart command");

    cart.with_cart_mut(|c| {
        c.remove_item(&product_id);
        CartResponse::from(&*c)
    })
}

/// Clears all items from the cart.
pub fn clear_cart(cart: &CartState) -> CartResponse {
    debug!("clear_cart command");

    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::from(&*c)
    })
}

/// Chooses how the customer pays: `cash`, `card` or `digital`.
pub fn set_payment_method(cart: &CartState, method: String) -> ApiResult<CartResponse> {
    debug!(method = %method, "set_payment_method command");

    let method: PaymentMethod = method.parse()?;
    Ok(cart.with_cart_mut(|c| {
        c.set_payment_method(method);
        CartResponse::from(&*c)
    }))
}

/// Finalizes the sale and records it.
///
/// The sale is stamped with the current time and saved together with the
/// stock decrements. Only after that succeeds does the screen get a fresh
/// cart; on any error the cart stays as it was so the cashier can fix it.
/// Cart edits made while the sale was being saved carry over to the next
/// sale.
///
/// ## Errors
/// - `SessionExpired` when no one is logged in
/// - `CartError` when the cart is empty
/// - `InsufficientStock` when another sale took the stock meanwhile
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    session: &SessionState,
    config: &ConfigState,
) -> ApiResult<Receipt> {
    let now = Utc::now();
    let cashier = session.require(now).await?;

    let snapshot = cart.with_cart(Transaction::clone);
    let mut open = snapshot.clone();
    open.user_id = cashier.user_id.clone();
    let finalized = open.checkout_at(now)?;

    debug!(id = %finalized.id, items = finalized.items.len(), "checkout command");
    db.inner().transactions().record_checkout(&finalized).await?;

    // `open` is now the empty follow-up sale
    cart.with_cart_mut(|c| settle_cart(c, &snapshot, &finalized, open));

    info!(
        id = %finalized.id,
        user_id = %finalized.user_id,
        total = %finalized.total,
        payment = %finalized.payment_method,
        "Sale completed"
    );
    Ok(Receipt::new(finalized, &cashier.name, config))
}

/// Moves the cart on to `next` once `sold` is recorded.
///
/// An untouched cart is replaced outright. A cart edited during the save
/// keeps whatever `sold` did not include. A cart reset in the meantime
/// (logout, another login) belongs to someone else and is left alone.
fn settle_cart(
    cart: &mut Transaction,
    snapshot: &Transaction,
    sold: &Transaction,
    next: Transaction,
) {
    if *cart == *snapshot {
        *cart = next;
    } else if cart.id == snapshot.id {
        cart.deduct(sold);
        cart.id = next.id;
        cart.user_id = next.user_id;
        cart.date = next.date;
        warn!(
            sold = %sold.id,
            kept = cart.items.len(),
            "Cart changed during checkout, carrying lines over"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::testing;
    use kasir_core::{Category, Product, Role};

    #[tokio::test]
    async fn test_add_to_cart_merges_lines() {
        let (state, _dir) = testing::app().await;
        testing::stock_product(&state, "kopi", 15000, 10).await;

        add_to_cart(&state.db, &state.cart, "kopi".into(), Some(2))
            .await
            .unwrap();
        let response = add_to_cart(&state.db, &state.cart, "kopi".into(), None)
            .await
            .unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].quantity, 3);
        assert_eq!(response.items[0].subtotal, Money::from_rupiah(45000));
        assert_eq!(response.totals.total_display, "Rp 45.000");
    }

    #[tokio::test]
    async fn test_add_to_cart_errors_leave_cart_alone() {
        let (state, _dir) = testing::app().await;
        testing::stock_product(&state, "teh", 5000, 2).await;
        add_to_cart(&state.db, &state.cart, "teh".into(), Some(2))
            .await
            .unwrap();

        let err = add_to_cart(&state.db, &state.cart, "teh".into(), Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = add_to_cart(&state.db, &state.cart, "missing".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let cart = get_cart(&state.cart);
        assert_eq!(cart.totals.total_quantity, 2);
        assert_eq!(cart.totals.total, Money::from_rupiah(10000));
    }

    #[tokio::test]
    async fn test_update_remove_and_clear() {
        let (state, _dir) = testing::app().await;
        testing::stock_product(&state, "a", 10000, 10).await;
        testing::stock_product(&state, "b", 20000, 10).await;
        add_to_cart(&state.db, &state.cart, "a".into(), Some(2))
            .await
            .unwrap();
        add_to_cart(&state.db, &state.cart, "b".into(), Some(1))
            .await
            .unwrap();

        let response = update_cart_item(&state.cart, "a".into(), 5).unwrap();
        assert_eq!(response.items[0].subtotal, Money::from_rupiah(50000));
        assert_eq!(response.items[0].price, Money::from_rupiah(10000));

        let response = update_cart_item(&state.cart, "b".into(), 0).unwrap();
        assert_eq!(response.items.len(), 1);

        let response = remove_from_cart(&state.cart, "nothing".into());
        assert_eq!(response.totals.total, Money::from_rupiah(50000));

        let response = clear_cart(&state.cart);
        assert!(response.items.is_empty());
        assert_eq!(response.totals.total, Money::zero());
    }

    #[tokio::test]
    async fn test_oversized_quantities_keep_cart_usable() {
        let (state, _dir) = testing::app().await;
        testing::stock_product(&state, "a", 10000, 10).await;
        add_to_cart(&state.db, &state.cart, "a".into(), Some(1))
            .await
            .unwrap();

        let err = add_to_cart(&state.db, &state.cart, "a".into(), Some(i64::MAX))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = update_cart_item(&state.cart, "a".into(), i64::MAX / 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let err = add_to_cart(&state.db, &state.cart, "a".into(), Some(0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // the cart lock is still healthy
        let cart = get_cart(&state.cart);
        assert_eq!(cart.totals.total_quantity, 1);
        assert_eq!(cart.totals.total, Money::from_rupiah(10000));
    }

    fn item(id: &str) -> Product {
        Product::new(id, id, Money::from_rupiah(1000), 100, Category::Food)
    }

    fn sale_of(lines: &[(&str, i64)]) -> Transaction {
        let mut sale = Transaction::new("u-1");
        for &(id, qty) in lines {
            sale.add_item(&item(id), qty).unwrap();
        }
        sale
    }

    #[test]
    fn test_settle_untouched_cart_starts_fresh() {
        let mut cart = sale_of(&[("a", 2)]);
        let snapshot = cart.clone();
        let mut open = snapshot.clone();
        let sold = open.checkout().unwrap();

        settle_cart(&mut cart, &snapshot, &sold, open.clone());

        assert_eq!(cart, open);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_settle_keeps_lines_added_during_checkout() {
        let mut cart = sale_of(&[("a", 2)]);
        let snapshot = cart.clone();
        let mut open = snapshot.clone();
        let sold = open.checkout().unwrap();

        // edits that land while the sale is being saved
        cart.add_item(&item("a"), 1).unwrap();
        cart.add_item(&item("b"), 3).unwrap();

        settle_cart(&mut cart, &snapshot, &sold, open.clone());

        assert_eq!(cart.id, open.id);
        assert_ne!(cart.id, sold.id);
        assert_eq!(cart.quantity_of("a"), 1);
        assert_eq!(cart.quantity_of("b"), 3);
        assert_eq!(cart.total, Money::from_rupiah(4000));
    }

    #[test]
    fn test_settle_leaves_reset_cart_alone() {
        let snapshot = sale_of(&[("a", 2)]);
        let mut open = snapshot.clone();
        let sold = open.checkout().unwrap();
        let mut cart = sale_of(&[("b", 1)]);
        let before = cart.clone();

        settle_cart(&mut cart, &snapshot, &sold, open);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_payment_method() {
        let cart = CartState::new("u-1");

        let response = set_payment_method(&cart, "Digital".into()).unwrap();
        assert_eq!(response.payment_method, PaymentMethod::Digital);

        let err = set_payment_method(&cart, "cheque".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(
            cart.with_cart(|c| c.payment_method),
            PaymentMethod::Digital
        );
    }

    #[tokio::test]
    async fn test_checkout_records_sale_and_resets_cart() {
        let (state, _dir) = testing::app().await;
        let session = testing::login_as(&state, Role::Cashier).await;
        testing::stock_product(&state, "kopi", 15000, 10).await;
        add_to_cart(&state.db, &state.cart, "kopi".into(), Some(3))
            .await
            .unwrap();

        let receipt = checkout(&state.db, &state.cart, &state.session, &state.config)
            .await
            .unwrap();

        assert_eq!(receipt.total_display, "Rp 45.000");
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].price_display, "Rp 15.000");
        assert_eq!(receipt.transaction.user_id, session.user_id);
        assert_eq!(receipt.cashier, session.name);

        let db = state.db.inner();
        let saved = db
            .transactions()
            .get_by_id(&receipt.transaction.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.total, Money::from_rupiah(45000));
        let kopi = db.products().get_by_id("kopi").await.unwrap().unwrap();
        assert_eq!(kopi.stock, 7);

        state.cart.with_cart(|c| {
            assert!(c.is_empty());
            assert_ne!(c.id, receipt.transaction.id);
            assert_eq!(c.user_id, session.user_id);
        });
    }

    #[tokio::test]
    async fn test_checkout_failures_keep_cart() {
        let (state, _dir) = testing::app().await;
        testing::stock_product(&state, "kopi", 15000, 3).await;
        add_to_cart(&state.db, &state.cart, "kopi".into(), Some(3))
            .await
            .unwrap();

        // nobody logged in
        let err = checkout(&state.db, &state.cart, &state.session, &state.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);

        testing::login_as(&state, Role::Cashier).await;
        add_to_cart(&state.db, &state.cart, "kopi".into(), Some(3))
            .await
            .unwrap();

        // another till sells two before we pay
        state
            .db
            .inner()
            .products()
            .update_stock("kopi", -2)
            .await
            .unwrap();

        let err = checkout(&state.db, &state.cart, &state.session, &state.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(state.cart.with_cart(|c| c.total_quantity()), 3);
        assert_eq!(state.db.inner().transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let (state, _dir) = testing::app().await;
        testing::login_as(&state, Role::Cashier).await;

        let err = checkout(&state.db, &state.cart, &state.session, &state.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }
}
