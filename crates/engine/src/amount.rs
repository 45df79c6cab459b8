//! Amount normalisation and rupiah formatting.
//!
//! Amounts are whole rupiah (no minor units). Anything typed by a user or read
//! back from OCR/spreadsheet cells goes through [`normalize`], which keeps only
//! the decimal digits:
//!
//! ```rust
//! use engine::amount::{format_rupiah, normalize};
//!
//! assert_eq!(normalize("Rp 1.234.567"), 1_234_567);
//! assert_eq!(normalize("abc"), 0);
//! assert_eq!(format_rupiah(-50_000), "-Rp50.000");
//! ```

/// Strips every non-digit and parses the rest as base-10.
///
/// Total and pure: empty, digit-free or overflowing input yields `0`.
#[must_use]
pub fn normalize(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Like [`normalize`] but keeps a leading minus sign, for balance cells that
/// can go negative (`-Rp 12.000`).
#[must_use]
pub fn normalize_signed(raw: &str) -> i64 {
    let value = to_signed(normalize(raw));
    if raw.trim_start().starts_with('-') {
        -value
    } else {
        value
    }
}

/// Returns `true` when `raw` carries at least one decimal digit.
#[must_use]
pub fn has_digits(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
}

/// Converts an amount into a signed balance delta, saturating at `i64::MAX`.
#[must_use]
pub fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Formats a value as `Rp1.234.567`.
#[must_use]
pub fn format_rupiah(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let digits = value.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}Rp{grouped}")
}
