//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Listing by category and substring search on name/barcode
//! - CRUD operations
//! - Stock adjustments that never drive stock below zero

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasir_core::{Category, Money, Product};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_sen: i64,
    stock: i64,
    category: Category,
    barcode: Option<String>,
    image_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_sen(row.price_sen),
            stock: row.stock,
            category: row.category,
            barcode: row.barcode,
            image_ref: row.image_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT id, name, price_sen, stock, category, barcode, image_ref, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("kopi", 20).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products by name, optionally restricted to one category.
    pub async fn list(&self, category: Option<Category>, limit: u32) -> DbResult<Vec<Product>> {
        debug!(category = ?category, limit = %limit, "Listing products");

        let rows: Vec<ProductRow> = match category {
            Some(category) => {
                sqlx::query_as(&format!(
                    "{SELECT_PRODUCT} WHERE category = ?1 ORDER BY name COLLATE NOCASE LIMIT ?2"
                ))
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{SELECT_PRODUCT} ORDER BY name COLLATE NOCASE LIMIT ?1"
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Case-insensitive substring search on name and barcode.
    ///
    /// An empty query lists the catalog.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(None, limit).await;
        }

        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r#"{SELECT_PRODUCT}
            WHERE lower(name) LIKE ?1 ESCAPE '\' OR barcode LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            LIMIT ?2"#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        debug!(id = %id, "Getting product by ID");

        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Gets a product by barcode (scanner input).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        debug!(barcode = %barcode, "Getting product by barcode");

        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE barcode = ?1"))
                .bind(barcode.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` on a duplicate id or barcode.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_sen, stock, category, barcode, image_ref, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.sen())
        .bind(product.stock)
        .bind(product.category)
        .bind(&product.barcode)
        .bind(&product.image_ref)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e.into(), product))?;

        Ok(())
    }

    /// Updates every editable field and bumps `updated_at`.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_sen = ?3, stock = ?4, category = ?5,
                barcode = ?6, image_ref = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.sen())
        .bind(product.stock)
        .bind(product.category)
        .bind(&product.barcode)
        .bind(&product.image_ref)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e.into(), product))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(Product {
            updated_at: now,
            ..product.clone()
        })
    }

    /// Deletes a product. Past transactions keep their snapshot lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adjusts stock by `delta` (negative for sales, positive for restocking).
    ///
    /// ## Errors
    /// - `NotFound` if the product doesn't exist
    /// - `InsufficientStock` if the result would be negative; stock is left
    ///   unchanged rather than clamped
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "Updating stock");

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(stock) = new_stock {
            return Ok(stock);
        }

        match self.get_by_id(id).await? {
            Some(product) => Err(DbError::InsufficientStock {
                product_id: id.to_string(),
                available: product.stock,
                requested: -delta,
            }),
            None => Err(DbError::not_found("Product", id)),
        }
    }

    /// Sets or clears the product photo reference.
    pub async fn set_image(&self, id: &str, image_ref: Option<&str>) -> DbResult<()> {
        debug!(id = %id, image_ref = ?image_ref, "Setting product image");

        let result = sqlx::query("UPDATE products SET image_ref = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(image_ref)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Products with `stock <= threshold`, lowest stock first.
    pub async fn list_low_stock(&self, threshold: i64, limit: u32) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{SELECT_PRODUCT} WHERE stock <= ?1 ORDER BY stock, name COLLATE NOCASE LIMIT ?2"
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Number of products with `stock <= threshold`.
    pub async fn count_low_stock(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock <= ?1")
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn with_barcode(err: DbError, product: &Product) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field.contains("barcode") => {
            DbError::duplicate("barcode", product.barcode.clone().unwrap_or_default())
        }
        DbError::UniqueViolation { field, .. } if field.contains("id") => {
            DbError::duplicate("id", &product.id)
        }
        other => other,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn product(id: &str, name: &str, rupiah: i64, stock: i64, category: Category) -> Product {
        Product::new(id, name, Money::from_rupiah(rupiah), stock, category)
    }

    async fn seeded() -> Database {
        let db = Database::in_memory().await.unwrap();
        let repo = db.products();
        let mut kopi = product("p1", "Kopi Kapal Api", 2500, 40, Category::Food);
        kopi.barcode = Some("8991002101234".to_string());
        repo.insert(&kopi).await.unwrap();
        repo.insert(&product("p2", "Pulpen Standard", 3000, 2, Category::Stationery))
            .await
            .unwrap();
        repo.insert(&product("p3", "Kopi Susu 100%", 6000, 0, Category::Food))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = seeded().await;
        let p = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(p.name, "Kopi Kapal Api");
        assert_eq!(p.price, Money::from_rupiah(2500));
        assert_eq!(p.category, Category::Food);

        let by_code = db
            .products()
            .get_by_barcode("8991002101234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_code.id, "p1");

        assert!(db.products().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode() {
        let db = seeded().await;
        let mut dup = product("p9", "Kopi Lain", 1000, 1, Category::Food);
        dup.barcode = Some("8991002101234".to_string());

        let err = db.products().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "barcode"));
    }

    #[tokio::test]
    async fn test_search_and_list() {
        let db = seeded().await;
        let repo = db.products();

        let hits = repo.search("kopi", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = repo.search("100%", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p3");

        let hits = repo.search("89910021", 10).await.unwrap();
        assert_eq!(hits[0].id, "p1");

        assert_eq!(repo.search("  ", 10).await.unwrap().len(), 3);
        assert_eq!(repo.list(Some(Category::Stationery), 10).await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_stock_never_negative() {
        let db = seeded().await;
        let repo = db.products();

        assert_eq!(repo.update_stock("p2", -2).await.unwrap(), 0);
        let err = repo.update_stock("p2", -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 0, requested: 1, .. }
        ));
        assert_eq!(repo.update_stock("p2", 5).await.unwrap(), 5);

        assert!(matches!(
            repo.update_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = seeded().await;
        let repo = db.products();

        let mut p = repo.get_by_id("p2").await.unwrap().unwrap();
        p.price = Money::from_rupiah(3500);
        p.category = Category::Other;
        let updated = repo.update(&p).await.unwrap();
        assert!(updated.updated_at >= p.updated_at);

        let stored = repo.get_by_id("p2").await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_rupiah(3500));
        assert_eq!(stored.category, Category::Other);

        repo.delete("p2").await.unwrap();
        assert!(matches!(repo.delete("p2").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_low_stock_and_image() {
        let db = seeded().await;
        let repo = db.products();

        let low = repo.list_low_stock(5, 10).await.unwrap();
        let ids: Vec<_> = low.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2"]);
        assert_eq!(repo.count_low_stock(5).await.unwrap(), 2);

        repo.set_image("p1", Some("products/p1.png")).await.unwrap();
        let p = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(p.image_ref.as_deref(), Some("products/p1.png"));
    }
}
