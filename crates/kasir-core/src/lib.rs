//! # kasir-core: Pure Business Logic for KasirNest
//!
//! This crate is the **heart** of KasirNest. It holds the cart/transaction
//! aggregator, the sales report generator and the helpers around them as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KasirNest Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Desktop Commands                             │   │
//! │  │    login, add_to_cart, checkout, generate_report, etc.          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │   cart   │ │  report  │ │ format/validation│  │   │
//! │  │   │ Product  │ │  Sale    │ │  Report  │ │  Rupiah, email   │  │   │
//! │  │   │  User    │ │  Item    │ │TopProduct│ │  session expiry  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │          SQLite queries, migrations, repositories, images       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, User, PaymentMethod)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The in-progress sale and its line items
//! - [`report`] - Daily/weekly/monthly sales aggregation
//! - [`session`] - Logged-in user record with a fixed validity window
//! - [`format`] - Rupiah and Indonesian date formatting
//! - [`validation`] - Form and business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::cart::Transaction;
//! use kasir_core::money::Money;
//! use kasir_core::types::{Category, Product};
//!
//! let product = Product::new("p1", "Teh Botol", Money::from_rupiah(15000), 10, Category::Food);
//!
//! let mut sale = Transaction::new("user-1");
//! sale.add_item(&product, 2).unwrap();
//!
//! assert_eq!(sale.total, Money::from_rupiah(30000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod format;
pub mod money;
pub mod report;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Transaction, TransactionItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use report::{Report, ReportPeriod, TopProduct};
pub use session::{Session, SessionEvent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of entries in a report's top-product list.
pub const MAX_TOP_PRODUCTS: usize = 10;

/// How long a login stays valid, in hours.
pub const SESSION_VALIDITY_HOURS: i64 = 24;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 100;
