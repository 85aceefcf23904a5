//! # Database State
//!
//! Wraps the `Database` pool and the product image store.
//!
//! ## Thread Safety
//! `Database` holds a `SqlitePool` and `ImageStore` only a root path, so
//! commands can use both concurrently without locking.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn search_products(db: &DbState, query: String) -> ApiResult<Vec<Product>> {
//!     Ok(db.inner().products().search(&query, 50).await?)
//! }
//! ```

use kasir_db::{Database, ImageStore};

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
    images: ImageStore,
}

impl DbState {
    pub fn new(db: Database, images: ImageStore) -> Self {
        DbState { db, images }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }
}
