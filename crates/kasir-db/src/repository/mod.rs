//! # Repository Module
//!
//! Database repository implementations for KasirNest.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Desktop Command                                                       │
//! │       │                                                                 │
//! │       │  db.transactions().list_between(start, end)                    │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── record_checkout(&self, tx)                                        │
//! │  ├── list_between(&self, start, end)                                   │
//! │  └── sales_total_between(&self, start, end)                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `*Row` structs with `sqlx::FromRow` and
//! converted into kasir-core types, so core types carry no database
//! attributes beyond enum encodings.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, search, stock
//! - [`TransactionRepository`](transaction::TransactionRepository) - Finalized sales
//! - [`UserRepository`](user::UserRepository) - Accounts and login
//! - [`ReportRepository`](report::ReportRepository) - Saved report snapshots

pub mod product;
pub mod report;
pub mod transaction;
pub mod user;
