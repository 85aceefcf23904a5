//! # Commands Module
//!
//! Every operation a screen can trigger, one module per screen.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── auth.rs         ◄─── Login, logout, session restore, user registration
//! ├── cart.rs         ◄─── Cart manipulation and checkout
//! ├── product.rs      ◄─── Product search, CRUD, photos
//! ├── transaction.rs  ◄─── Sales history
//! ├── report.rs       ◄─── Daily / weekly / monthly reports
//! └── dashboard.rs    ◄─── Home screen counters
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Screen                                                                 │
//! │  ──────                                                                 │
//! │  add_to_cart(&state.db, &state.cart, "prod-1".into(), Some(2))          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Command                                                                │
//! │  ───────                                                                │
//! │  pub async fn add_to_cart(                                              │
//! │      db: &DbState,            ◄── Only the state it needs              │
//! │      cart: &CartState,                                                  │
//! │      product_id: String,      ◄── Screen input                         │
//! │      quantity: Option<i64>,   ◄── Optional input                       │
//! │  ) -> ApiResult<CartResponse>                                           │
//! │         │                                                               │
//! │         │ (serde, camelCase)                                            │
//! │         ▼                                                               │
//! │  Screen receives: CartResponse or ApiError { code, message }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn search_products(db: &DbState, ...)
//!
//! // Only needs cart
//! fn get_cart(cart: &CartState)
//!
//! // Needs the logged-in user too
//! async fn checkout(db: &DbState, cart: &CartState, session: &SessionState, config: &ConfigState)
//! ```

pub mod auth;
pub mod cart;
pub mod dashboard;
pub mod product;
pub mod report;
pub mod transaction;
