//! Keyword classification of free text into spending categories.
//!
//! Rules are an ordered list evaluated top to bottom and the first match wins,
//! so a receipt mentioning both `tokopedia` and `grab` is a marketplace
//! purchase.

use unicode_normalization::UnicodeNormalization;

/// Number of characters kept when no rule matches.
pub const FALLBACK_PREFIX_CHARS: usize = 30;
const ELLIPSIS: char = '…';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Marketplace,
    MinimarketPurchase,
    WalletTopup,
    Transportation,
    Salary,
    Investment,
    /// Truncated input used as a synthetic label.
    Other(String),
}

impl Category {
    /// Label persisted in the ledger.
    pub fn label(&self) -> &str {
        match self {
            Self::Marketplace => "Marketplace",
            Self::MinimarketPurchase => "Belanja Minimarket",
            Self::WalletTopup => "Topup E-Wallet",
            Self::Transportation => "Transportasi Online",
            Self::Salary => "Gaji",
            Self::Investment => "Investasi",
            Self::Other(label) => label,
        }
    }
}

const RULES: &[(&[&str], Category)] = &[
    (
        &["tokopedia", "shopee", "lazada", "bukalapak", "blibli"],
        Category::Marketplace,
    ),
    (
        &["alfamart", "indomaret", "alfamidi"],
        Category::MinimarketPurchase,
    ),
    (&["gopay", "ovo", "dana", "linkaja"], Category::WalletTopup),
    (&["grab", "gojek", "maxim"], Category::Transportation),
    (&["gaji", "salary", "payroll"], Category::Salary),
    (
        &["invest", "saham", "reksadana", "reksa dana", "emas"],
        Category::Investment,
    ),
];

/// Classifies OCR or free text.
pub fn classify(text: &str) -> Category {
    let folded = fold(text);
    for (keywords, category) in RULES {
        if keywords.iter().any(|k| folded.contains(k)) {
            return category.clone();
        }
    }
    Category::Other(fallback_label(text))
}

/// Coarse meaning of the type token of a manual command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    Income,
    Investment,
    /// The token itself is the category.
    Custom,
}

const ENTRY_RULES: &[(&[&str], EntryType)] = &[
    (&["masuk", "income", "pemasukan"], EntryType::Income),
    (&["invest", "emas", "saham"], EntryType::Investment),
];

/// Reduced rule set applied to the type token of `catat`/`record`.
///
/// `pemasukan` contains `emas`, which is why income is checked first.
pub fn classify_entry_type(token: &str) -> EntryType {
    let folded = fold(token);
    ENTRY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| folded.contains(k)))
        .map_or(EntryType::Custom, |(_, ty)| *ty)
}

fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

fn fallback_label(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut label: String = collapsed.chars().take(FALLBACK_PREFIX_CHARS).collect();
    label.push(ELLIPSIS);
    label
}
