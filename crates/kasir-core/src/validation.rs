//! # Validation Module
//!
//! Input validation for the login, user and product forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Desktop command                                              │
//! │  └── THIS MODULE: field formats and business rules                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core types                                                   │
//! │  └── Product::can_sell, Transaction::add_item stock checks             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0) constraints                         │
//! │  └── UNIQUE email, UNIQUE barcode                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_email, validate_quantity};
//!
//! assert!(validate_email("kasir@toko.id").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_PRODUCT_NAME_LENGTH, MIN_PASSWORD_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static BARCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8,13}$").expect("valid barcode regex"));

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Checks the character count (not bytes) of the trimmed value.
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates an email address.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_email;
///
/// assert!(validate_email(" admin@kasirnest.id ").is_ok());
/// assert!(validate_email("admin@localhost").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("email", email)?;
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ValidationError::invalid_format(
            "email",
            "expected name@domain.tld",
        ));
    }
    Ok(())
}

/// Password must have at least six characters, with an uppercase letter,
/// a lowercase letter and a digit.
pub fn validate_password_strength(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_upper && has_lower && has_digit) {
        return Err(ValidationError::invalid_format(
            "password",
            "must contain uppercase, lowercase and a digit",
        ));
    }
    Ok(())
}

/// Barcode is optional; when present it must be 8 to 13 digits.
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<()> {
    match barcode.map(str::trim) {
        None | Some("") => Ok(()),
        Some(code) if BARCODE_RE.is_match(code) => Ok(()),
        Some(_) => Err(ValidationError::invalid_format(
            "barcode",
            "expected 8 to 13 digits",
        )),
    }
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name)?;
    validate_length("name", name, 1, MAX_PRODUCT_NAME_LENGTH)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices must be greater than zero.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Stock may be zero but never negative.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

/// Quantities in a sale must be positive.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Multi-field Forms
// =============================================================================

/// Collects failures across several fields so a form can report them all at
/// once.
///
/// ```rust
/// use kasir_core::validation::{validate_email, validate_required, FieldErrors};
///
/// let mut errors = FieldErrors::new();
/// errors.check("email", validate_email("nope"));
/// errors.check("name", validate_required("name", "Budi"));
///
/// assert!(!errors.is_valid());
/// assert_eq!(errors.len(), 1);
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(String, String)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push((field.into(), message.into()));
    }

    /// Records `result`'s error, if any, under `field`.
    pub fn check(&mut self, field: &str, result: ValidationResult<()>) {
        if let Err(err) = result {
            self.add(field, err.to_string());
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `field: message` lines joined by newlines; empty when valid.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError::Multiple(self.message()))
        }
    }
}

/// Validates every field of the product form at once.
pub fn validate_product_form(
    name: &str,
    price: Money,
    stock: i64,
    barcode: Option<&str>,
) -> ValidationResult<()> {
    let mut errors = FieldErrors::new();
    errors.check("name", validate_product_name(name));
    errors.check("price", validate_price(price));
    errors.check("stock", validate_stock(stock));
    errors.check("barcode", validate_barcode(barcode));
    errors.into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("kasir@toko.co.id").is_ok());
        assert!(validate_email("first.last+tag@example.com").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b.c").is_err());
        assert!(matches!(
            validate_email("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("Rahasia1").is_ok());
        assert!(validate_password_strength("Ab1").is_err());
        assert!(validate_password_strength("rahasia1").is_err());
        assert!(validate_password_strength("RAHASIA1").is_err());
        assert!(validate_password_strength("Rahasia").is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode(None).is_ok());
        assert!(validate_barcode(Some("")).is_ok());
        assert!(validate_barcode(Some("12345678")).is_ok());
        assert!(validate_barcode(Some("8992761111111")).is_ok());
        assert!(validate_barcode(Some("1234567")).is_err());
        assert!(validate_barcode(Some("12345678901234")).is_err());
        assert!(validate_barcode(Some("ABC45678")).is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_price(Money::from_rupiah(1)).is_ok());
        assert!(validate_price(Money::zero()).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
    }

    #[test]
    fn test_validate_length_counts_chars() {
        assert!(validate_length("name", "éé", 2, 2).is_ok());
        assert!(validate_length("name", "a", 2, 5).is_err());
        assert!(validate_length("name", "abcdef", 2, 5).is_err());
    }

    #[test]
    fn test_validate_product_form_collects_all() {
        let err = validate_product_form("", Money::zero(), -2, Some("12")).unwrap_err();
        let ValidationError::Multiple(message) = err else {
            panic!("expected Multiple, got {err:?}");
        };
        let lines: Vec<_> = message.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "name: name is required");
        assert!(lines[3].starts_with("barcode:"));

        assert!(validate_product_form("Teh", Money::from_rupiah(5000), 0, None).is_ok());
    }
}
