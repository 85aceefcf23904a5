//! # Cart State
//!
//! Holds the sale in progress: one [`Transaction`] behind `Arc<Mutex<_>>`.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Screen Action            Command                 Cart State Change     │
//! │  ─────────────            ───────                 ─────────────────     │
//! │                                                                         │
//! │  Pick Product ───────────► add_to_cart() ───────► add_item / merge     │
//! │                                                                         │
//! │  Change Quantity ────────► update_cart_item() ──► quantity = n         │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_cart() ──► line removed         │
//! │                                                                         │
//! │  Click Clear ────────────► clear_cart() ────────► items.clear()        │
//! │                                                                         │
//! │  Pay ────────────────────► checkout() ──────────► fresh Transaction    │
//! │                                                                         │
//! │  NOTE: All write operations acquire the Mutex lock exclusively.         │
//! │        The lock is never held across an `.await`.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use kasir_core::format::format_currency;
use kasir_core::{Money, Transaction};
use serde::Serialize;

/// Cart totals summary for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
    /// `Rp 45.000`
    pub total_display: String,
}

impl From<&Transaction> for CartTotals {
    fn from(cart: &Transaction) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total,
            total_display: format_currency(cart.total),
        }
    }
}

/// Shared cart state.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Transaction>>,
}

impl CartState {
    /// Creates an empty cart owned by `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Transaction::new(user_id))),
        }
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|t| CartTotals::from(t));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Transaction) -> R,
    {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Transaction) -> R,
    {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }

    /// Drops the current sale and starts an empty one for `user_id`.
    pub fn reset(&self, user_id: impl Into<String>) {
        self.with_cart_mut(|c| *c = Transaction::new(user_id));
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new(String::new())
    }
}
