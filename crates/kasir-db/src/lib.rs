//! # kasir-db: Persistence Layer for KasirNest
//!
//! SQLite storage through sqlx, plus a filesystem store for product photos.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KasirNest Data Flow                              │
//! │                                                                         │
//! │  Desktop Command (checkout)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  ImageStore  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (blob.rs)   │  │   │
//! │  │   │               │    │ Products      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Transactions  │    │ products/    │  │   │
//! │  │   │ Migrations    │    │ Users         │    │  {id}.{ext}  │  │   │
//! │  │   │               │    │ Reports       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                               │                 │
//! │       ▼                                               ▼                 │
//! │  kasir.db (platform data dir)                  images/ (data dir)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`blob`] - Product image files
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kasir.db")).await?;
//!
//! let products = db.products().search("kopi", 20).await?;
//! db.transactions().record_checkout(&receipt).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod blob;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use blob::ImageStore;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::product::{generate_product_id, ProductRepository};
pub use repository::report::ReportRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::user::UserRepository;
