//! # Formatting
//!
//! Rupiah amounts and Indonesian dates as shown on screens and receipts.
//!
//! ```text
//! Money::from_sen(123_456_700)  ──► "Rp 1.234.567"
//! Money::from_sen(150_050)      ──► "Rp 1.500,50"
//! 2026-10-18 14:05              ──► "18 Oktober 2026 14:05"
//!                               ──► "18/10/2026 14:05"
//! ```

use chrono::{Datelike, NaiveDate, Timelike};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// Indonesian month names, January first.
pub const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

// =============================================================================
// Numbers & Currency
// =============================================================================

/// Formats an amount as Rupiah.
///
/// Dots group thousands; the `,dd` sen part only appears when non-zero.
///
/// ```rust
/// use kasir_core::format::format_currency;
/// use kasir_core::Money;
///
/// assert_eq!(format_currency(Money::from_rupiah(15000)), "Rp 15.000");
/// assert_eq!(format_currency(Money::from_sen(-150_050)), "Rp -1.500,50");
/// ```
pub fn format_currency(amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let whole = add_thousand_separators(&amount.rupiah().unsigned_abs().to_string());
    match amount.sen_part() {
        0 => format!("Rp {sign}{whole}"),
        sen => format!("Rp {sign}{whole},{sen:02}"),
    }
}

/// Groups a digit string with dots, e.g. `"1234567"` → `"1.234.567"`.
///
/// Existing dots and commas are dropped first. A leading minus is kept.
pub fn add_thousand_separators(digits: &str) -> String {
    let cleaned: String = digits.chars().filter(|c| *c != '.' && *c != ',').collect();
    let (sign, body) = match cleaned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", cleaned.as_str()),
    };

    let n = body.chars().count();
    let mut out = String::with_capacity(n + n / 3 + 1);
    out.push_str(sign);
    for (i, ch) in body.chars().enumerate() {
        if i > 0 && (n - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Formats an integer with thousand separators.
pub fn format_number(n: i64) -> String {
    add_thousand_separators(&n.to_string())
}

/// Parses text like `"Rp 1.500,50"` or `"15000"` into money.
///
/// Accepts an optional `Rp`/`rp` prefix, dot thousand separators and a comma
/// before at most two decimal digits.
pub fn parse_currency(text: &str) -> ValidationResult<Money> {
    let invalid = |reason: &str| ValidationError::invalid_format("amount", reason);

    let cleaned = text.trim();
    let cleaned = cleaned
        .strip_prefix("Rp")
        .or_else(|| cleaned.strip_prefix("rp"))
        .unwrap_or(cleaned)
        .trim()
        .replace('.', "");

    let (negative, cleaned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, cleaned),
    };

    let (whole, frac) = match cleaned.split_once(',') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits"));
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("at most two decimal digits"));
    }

    let rupiah: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
    let sen: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid("bad decimals"))? * 10,
        _ => frac.parse().map_err(|_| invalid("bad decimals"))?,
    };

    let total = rupiah
        .checked_mul(100)
        .and_then(|v| v.checked_add(sen))
        .ok_or_else(|| invalid("amount too large"))?;

    Ok(Money::from_sen(if negative { -total } else { total }))
}

/// One decimal place and a percent sign, e.g. `12.5%`.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Human readable byte count (`512 B`, `1.5 KB`, `3.0 MB`).
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < UNITS.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}", bytes as f64 / div as f64, UNITS[exp])
}

// =============================================================================
// Dates
// =============================================================================

/// `18 Oktober 2026`
pub fn format_date<D: Datelike>(d: &D) -> String {
    format!("{} {} {}", d.day(), MONTHS[d.month0() as usize], d.year())
}

/// `18 Oktober 2026 14:05`
pub fn format_date_time<T: Datelike + Timelike>(t: &T) -> String {
    format!("{} {}", format_date(t), format_time(t))
}

/// `14:05`
pub fn format_time<T: Timelike>(t: &T) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

/// `18/10/2026`
pub fn format_date_short<D: Datelike>(d: &D) -> String {
    format!("{:02}/{:02}/{}", d.day(), d.month(), d.year())
}

/// `18/10/2026 14:05`
pub fn format_date_time_short<T: Datelike + Timelike>(t: &T) -> String {
    format!("{} {}", format_date_short(t), format_time(t))
}

/// Parses `DD/MM/YYYY`, the format of the date fields on every screen.
pub fn parse_date_short(text: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y")
        .map_err(|_| ValidationError::invalid_format("date", "expected DD/MM/YYYY"))
}

// =============================================================================
// Text
// =============================================================================

/// Shortens `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn clean_string(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Unit Tests
// =============================================================================
