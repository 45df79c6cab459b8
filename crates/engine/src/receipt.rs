//! Total-amount extraction from receipt OCR text.
//!
//! Strategies are tried in priority order and the first success wins:
//!
//! 1. a total label (`TOTAL BELANJA`, `GRAND TOTAL`, ..., `TOTAL`) followed by
//!    `Rp`/`IDR` and a number, or by a number that looks like money (grouped
//!    thousands or at least four digits). `TOTAL 3 ITEM` is not a total;
//! 2. the largest number written with thousand separators (`12.345`,
//!    `1,250,000`);
//! 3. nothing found: amount `0` with [`Confidence::None`].
//!
//! Strategy 2 is best-effort. Receipts usually print line items below the
//! total, so the largest grouped number is the proxy used, but cash tendered
//! ("TUNAI 100.000") can beat it on an unlabeled receipt.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    amount::normalize,
    classify::{Category, classify},
    transactions::{INVESTMENT_CATEGORY, TransactionDraft, TransactionKind},
};

/// Category of receipts that are neither salary slips nor investments.
pub const SHOPPING_CATEGORY: &str = "Belanja";

/// How the amount was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    Labeled,
    LargestGrouped,
    /// No number at all; the amount is a placeholder `0`.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extraction {
    pub amount: u64,
    pub confidence: Confidence,
}

impl Extraction {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::None
    }
}

/// Total labels, most specific first.
const TOTAL_LABELS: &[&str] = &[
    r"total\s+belanja",
    r"grand\s+total",
    r"total\s+bayar",
    r"amount\s+due",
    r"jumlah\s+bayar",
    r"total",
];

const NUMBER: &str = r"\d{1,3}(?:[.,]\d{3})+|\d+";

/// Amount shapes accepted after a label without a currency prefix.
const BARE_AMOUNT: &str = r"\d{1,3}(?:[.,]\d{3})+|\d{4,}";

fn label_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        TOTAL_LABELS
            .iter()
            .filter_map(|label| {
                Regex::new(&format!(
                    r"(?i)\b{label}\b\s*[:=]?\s*(?:(?:rp\.?|idr)\s*({NUMBER})|({BARE_AMOUNT}))"
                ))
                .ok()
            })
            .collect()
    })
}

fn grouped_number_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:[.,]\d{3})+").ok())
        .as_ref()
}

/// Finds the most likely total in `ocr_text`.
pub fn extract_amount(ocr_text: &str) -> Extraction {
    if let Some(amount) = labeled_total(ocr_text) {
        return Extraction {
            amount,
            confidence: Confidence::Labeled,
        };
    }

    if let Some(amount) = largest_grouped(ocr_text) {
        return Extraction {
            amount,
            confidence: Confidence::LargestGrouped,
        };
    }

    Extraction {
        amount: 0,
        confidence: Confidence::None,
    }
}

/// Builds a draft from receipt text: the extracted total, the classifier
/// label as description, and a kind/category derived from that label.
pub fn draft_from_receipt(ocr_text: &str) -> (TransactionDraft, Extraction) {
    let extraction = extract_amount(ocr_text);
    let category = classify(ocr_text);

    let (kind, category_label) = match category {
        Category::Salary => (TransactionKind::Income, category.label().to_string()),
        Category::Investment => (TransactionKind::Expense, INVESTMENT_CATEGORY.to_string()),
        _ => (TransactionKind::Expense, SHOPPING_CATEGORY.to_string()),
    };

    let draft = TransactionDraft {
        category: category_label,
        description: category.label().to_string(),
        amount: extraction.amount,
        kind,
    };
    (draft, extraction)
}

fn labeled_total(text: &str) -> Option<u64> {
    label_patterns()
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| normalize(m.as_str()))
}

fn largest_grouped(text: &str) -> Option<u64> {
    grouped_number_re()?
        .find_iter(text)
        .map(|m| normalize(m.as_str()))
        .max()
}
