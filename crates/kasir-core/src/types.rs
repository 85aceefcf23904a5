//! # Domain Types
//!
//! Core domain types used throughout KasirNest.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      User       │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  Cash           │       │
//! │  │  name           │   │  email          │   │  Card           │       │
//! │  │  price (Money)  │   │  name           │   │  Digital        │       │
//! │  │  stock          │   │  role           │   └─────────────────┘       │
//! │  │  category       │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │    Category     │   │      Role       │                              │
//! │  │  food, fashion, │   │  Admin          │                              │
//! │  │  health, ...    │   │  Cashier(kasir) │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// Closed set of product categories.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Electronic,
    Fashion,
    Health,
    Household,
    Stationery,
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Electronic,
        Category::Fashion,
        Category::Health,
        Category::Household,
        Category::Stationery,
        Category::Other,
    ];

    /// Stable identifier stored in the database.
    pub const fn id(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Electronic => "electronic",
            Category::Fashion => "fashion",
            Category::Health => "health",
            Category::Household => "household",
            Category::Stationery => "stationery",
            Category::Other => "other",
        }
    }

    /// Name shown to the cashier.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Category::Food => "Makanan",
            Category::Electronic => "Elektronik",
            Category::Fashion => "Fashion",
            Category::Health => "Kesehatan",
            Category::Household => "Rumah Tangga",
            Category::Stationery => "Alat Tulis",
            Category::Other => "Lainnya",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Category::Food => "Produk makanan dan minuman",
            Category::Electronic => "Perangkat elektronik",
            Category::Fashion => "Pakaian dan aksesoris",
            Category::Health => "Produk kesehatan dan kecantikan",
            Category::Household => "Keperluan rumah tangga",
            Category::Stationery => "Alat tulis dan kantor",
            Category::Other => "Kategori lainnya",
        }
    }

    /// Full record for list screens.
    pub fn info(&self) -> CategoryInfo {
        CategoryInfo {
            category_id: self.id().to_string(),
            name: self.display_name().to_string(),
            description: self.description().to_string(),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.id() == needle)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.id().to_string()).collect(),
            })
    }
}

/// A category as listed on the product screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInfo {
    pub category_id: String,
    pub name: String,
    pub description: String,
}

/// The seven built-in categories.
pub fn default_categories() -> Vec<CategoryInfo> {
    Category::ALL.iter().map(Category::info).collect()
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: Category,

    /// EAN-8 / EAN-13 / UPC barcode.
    pub barcode: Option<String>,

    /// Object store reference of the product photo.
    pub image_ref: Option<String>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with fresh timestamps and no barcode or image.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        stock: i64,
        category: Category,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            category,
            barcode: None,
            image_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True while at least one unit is on hand.
    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Checks whether `quantity` units can be sold right now.
    ///
    /// ```rust
    /// use kasir_core::{Category, Money, Product};
    ///
    /// let p = Product::new("p1", "Buku Tulis", Money::from_rupiah(5000), 3, Category::Stationery);
    /// assert!(p.can_sell(3));
    /// assert!(!p.can_sell(4));
    /// assert!(!p.can_sell(0));
    /// ```
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    /// Price of `quantity` units, `None` when it does not fit in [`Money`].
    #[inline]
    pub fn subtotal(&self, quantity: i64) -> Option<Money> {
        self.price.multiply_quantity(quantity)
    }

    /// Removes `quantity` units from stock.
    ///
    /// Fails without touching stock when the quantity is not sellable; stock
    /// is never clamped to zero.
    pub fn sell(&mut self, quantity: i64) -> CoreResult<()> {
        if !self.can_sell(quantity) {
            return Err(self.insufficient(quantity));
        }
        self.stock -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Adds `quantity` units back to stock.
    pub fn restock(&mut self, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        self.stock += quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub(crate) fn insufficient(&self, requested: i64) -> CoreError {
        CoreError::InsufficientStock {
            product_id: self.id.clone(),
            available: self.stock,
            requested,
        }
    }
}

// =============================================================================
// User & Role
// =============================================================================

/// What a logged-in user may do.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages products and users.
    Admin,
    /// Rings up sales.
    #[serde(alias = "kasir")]
    Cashier,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Cashier
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cashier" | "kasir" => Ok(Role::Cashier),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".to_string(), "cashier".to_string()],
            }),
        }
    }
}

/// A registered cashier or admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Debit or credit card on an external terminal.
    Card,
    /// QRIS and e-wallets.
    Digital,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Digital];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Digital => "digital",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product::new("p1", "Indomie Goreng", Money::from_rupiah(3500), stock, Category::Food)
    }

    #[test]
    fn test_can_sell() {
        let p = product(5);
        assert!(p.can_sell(1));
        assert!(p.can_sell(5));
        assert!(!p.can_sell(6));
        assert!(!p.can_sell(0));
        assert!(!p.can_sell(-1));
    }

    #[test]
    fn test_sell_fails_without_clamping() {
        let mut p = product(2);
        let err = p.sell(3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));
        assert_eq!(p.stock, 2);

        p.sell(2).unwrap();
        assert_eq!(p.stock, 0);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_restock() {
        let mut p = product(0);
        p.restock(4).unwrap();
        assert_eq!(p.stock, 4);
        assert!(p.restock(0).is_err());
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(product(10).subtotal(3), Some(Money::from_rupiah(10500)));
        assert_eq!(product(10).subtotal(i64::MAX), None);
    }

    #[test]
    fn test_default_categories() {
        let cats = default_categories();
        assert_eq!(cats.len(), 7);
        assert_eq!(cats[0].category_id, "food");
        assert_eq!(cats[0].name, "Makanan");
        assert_eq!(cats[4].name, "Rumah Tangga");
        assert_eq!(cats[6].description, "Kategori lainnya");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Health".parse::<Category>().unwrap(), Category::Health);
        assert!("toys".parse::<Category>().is_err());
    }

    #[test]
    fn test_role_accepts_kasir_alias() {
        let role: Role = serde_json::from_str("\"kasir\"").unwrap();
        assert_eq!(role, Role::Cashier);
        assert_eq!("kasir".parse::<Role>().unwrap(), Role::Cashier);
        assert_eq!(serde_json::to_string(&Role::Cashier).unwrap(), "\"cashier\"");
    }

    #[test]
    fn test_payment_method_round_trip_text() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
