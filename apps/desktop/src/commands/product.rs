//! # Product Commands
//!
//! Product search, catalog maintenance and product photos.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Search Flow                                  │
//! │                                                                         │
//! │  User types or scans "8990100000001"                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Is query a barcode? (8-13 digits)        │                         │
//! │  │  YES: Try exact barcode lookup first      │──► Found? Return [1]    │
//! │  │  NO:  Name / barcode substring search     │                         │
//! │  └───────────────────────────────────────────┘                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Return Vec<Product> to the product grid                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog changes (create, update, delete, photo upload) are admin only.

use std::time::Instant;

use chrono::Utc;
use kasir_core::format::parse_currency;
use kasir_core::validation::{validate_product_form, FieldErrors};
use kasir_core::{default_categories, Category, CategoryInfo, Money, Product};
use kasir_db::generate_product_id;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, SessionState};

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 500;

/// The product form as the screen submits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    /// As typed, e.g. `Rp 15.000` or `15000`.
    pub price: String,
    pub stock: i64,
    /// Category id such as `food`.
    pub category: String,
    #[serde(default)]
    pub barcode: Option<String>,
}

/// A validated [`ProductInput`].
struct ProductFields {
    name: String,
    price: Money,
    stock: i64,
    category: Category,
    barcode: Option<String>,
}

impl ProductInput {
    /// Checks every field, reporting all failures in one error.
    fn validate(self) -> ApiResult<ProductFields> {
        let mut errors = FieldErrors::new();

        let price = match parse_currency(&self.price) {
            Ok(price) => price,
            Err(e) => {
                errors.add("price", e.to_string());
                Money::zero()
            }
        };
        let category = match self.category.parse::<Category>() {
            Ok(category) => category,
            Err(e) => {
                errors.add("category", e.to_string());
                Category::default()
            }
        };
        let barcode = self
            .barcode
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        if let Err(e) = validate_product_form(&self.name, price, self.stock, barcode.as_deref()) {
            errors.add("form", e.to_string());
        }
        errors.into_result()?;

        Ok(ProductFields {
            name: self.name.trim().to_string(),
            price,
            stock: self.stock,
            category,
            barcode,
        })
    }
}

/// Checks if a query looks like a barcode (8-13 numeric digits).
///
/// ## Barcode Formats Detected
/// - EAN-8: 8 digits
/// - UPC-A: 12 digits
/// - EAN-13: 13 digits
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Lists products, optionally of one category, by name.
pub async fn list_products(
    db: &DbState,
    category: Option<String>,
    limit: Option<u32>,
) -> ApiResult<Vec<Product>> {
    let category = category
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.parse::<Category>())
        .transpose()?;
    let limit = clamp_limit(limit);
    debug!(category = ?category, limit = %limit, "list_products command");

    Ok(db.inner().products().list(category, limit).await?)
}

/// Searches products by name or barcode.
///
/// ## Arguments
/// * `query` - Search term; an empty query lists everything
/// * `limit` - Maximum results to return (default: 100, max: 500)
pub async fn search_products(
    db: &DbState,
    query: String,
    limit: Option<u32>,
) -> ApiResult<Vec<Product>> {
    let start = Instant::now();
    let query = query.trim();
    let limit = clamp_limit(limit);

    debug!(query = %query, limit = %limit, "search_products command");

    let products = db.inner().products();

    if query.is_empty() {
        return Ok(products.list(None, limit).await?);
    }

    if is_barcode_query(query) {
        if let Some(product) = products.get_by_barcode(query).await? {
            debug!(
                barcode = %query,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Barcode hit"
            );
            return Ok(vec![product]);
        }
    }

    let results = products.search(query, limit).await?;
    debug!(
        count = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Search completed"
    );
    Ok(results)
}

/// Gets a single product.
pub async fn get_product(db: &DbState, id: String) -> ApiResult<Product> {
    debug!(id = %id, "get_product command");

    db.inner()
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

/// Adds a product to the catalog. Admin only.
pub async fn create_product(
    db: &DbState,
    session: &SessionState,
    input: ProductInput,
) -> ApiResult<Product> {
    session.require_admin(Utc::now(), "Create product").await?;
    debug!(name = %input.name, "create_product command");

    let fields = input.validate()?;
    let mut product = Product::new(
        generate_product_id(),
        fields.name,
        fields.price,
        fields.stock,
        fields.category,
    );
    product.barcode = fields.barcode;

    db.inner().products().insert(&product).await?;

    info!(id = %product.id, name = %product.name, "Product created");
    Ok(product)
}

/// Replaces the editable fields of a product. Admin only.
pub async fn update_product(
    db: &DbState,
    session: &SessionState,
    id: String,
    input: ProductInput,
) -> ApiResult<Product> {
    session.require_admin(Utc::now(), "Update product").await?;
    debug!(id = %id, "update_product command");

    let fields = input.validate()?;
    let products = db.inner().products();
    let existing = products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let updated = products
        .update(&Product {
            name: fields.name,
            price: fields.price,
            stock: fields.stock,
            category: fields.category,
            barcode: fields.barcode,
            ..existing
        })
        .await?;

    info!(id = %updated.id, "Product updated");
    Ok(updated)
}

/// Removes a product and its photo. Admin only.
pub async fn delete_product(db: &DbState, session: &SessionState, id: String) -> ApiResult<()> {
    session.require_admin(Utc::now(), "Delete product").await?;
    debug!(id = %id, "delete_product command");

    db.inner().products().delete(&id).await?;
    db.images().delete_product_image(&id).await?;

    info!(id = %id, "Product deleted");
    Ok(())
}

/// Stores a product photo and links it to the product. Admin only.
///
/// ## Arguments
/// * `bytes` - The image file
/// * `content_type` - `image/jpeg`, `image/png` or `image/webp`
pub async fn upload_product_image(
    db: &DbState,
    session: &SessionState,
    product_id: String,
    bytes: Vec<u8>,
    content_type: String,
) -> ApiResult<Product> {
    session
        .require_admin(Utc::now(), "Upload product image")
        .await?;
    debug!(product_id = %product_id, size = bytes.len(), "upload_product_image command");

    let products = db.inner().products();
    let mut product = products
        .get_by_id(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product_id))?;

    let reference = db
        .images()
        .upload_product_image(&product_id, &bytes, &content_type)
        .await?;
    products.set_image(&product_id, Some(&reference)).await?;

    product.image_ref = Some(reference);
    Ok(product)
}

/// The fixed category list for filters and the product form.
pub fn list_categories() -> Vec<CategoryInfo> {
    default_categories()
}
