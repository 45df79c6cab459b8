//! Ledger records and their row schema.
//!
//! A record is persisted as the row
//! `(timestamp RFC 3339, category, description, amount, kind label)`.
//! The kind labels are literal strings the period filters compare against,
//! so they must never change.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::{
    amount::{has_digits, normalize, to_signed},
    store::Row,
};

pub const INCOME_LABEL: &str = "Pemasukan";
pub const EXPENSE_LABEL: &str = "Pengeluaran";

/// Category given to manual income entries.
pub const INCOME_CATEGORY: &str = "Pemasukan";
/// Category given to manual and receipt investment entries.
pub const INVESTMENT_CATEGORY: &str = "Investasi";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => INCOME_LABEL,
            Self::Expense => EXPENSE_LABEL,
        }
    }

    /// Parses a persisted label. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            INCOME_LABEL => Some(Self::Income),
            EXPENSE_LABEL => Some(Self::Expense),
            _ => None,
        }
    }
}

/// A validated, not yet persisted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    pub category: String,
    pub description: String,
    pub amount: u64,
    pub kind: TransactionKind,
}

/// An appended ledger row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub description: String,
    pub amount: u64,
    pub kind: TransactionKind,
}

impl TransactionRecord {
    /// The timestamp is cut to the millisecond precision of the stored row.
    pub fn from_draft(draft: TransactionDraft, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            category: draft.category,
            description: draft.description,
            amount: draft.amount,
            kind: draft.kind,
        }
    }

    /// Amount with the sign implied by the kind.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => to_signed(self.amount),
            TransactionKind::Expense => -to_signed(self.amount),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.category.clone(),
            self.description.clone(),
            self.amount.to_string(),
            self.kind.label().to_string(),
        ]
    }

    /// Reads a stored row back. Header and malformed rows (missing
    /// timestamp, amount or kind) yield `None`.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let timestamp = DateTime::parse_from_rfc3339(row.first()?.trim())
            .ok()?
            .with_timezone(&Utc);
        let raw_amount = row.get(3)?;
        if !has_digits(raw_amount) {
            return None;
        }
        let kind = TransactionKind::from_label(row.get(4)?.trim())?;

        Some(Self {
            timestamp,
            category: row.get(1).cloned().unwrap_or_default(),
            description: row.get(2).cloned().unwrap_or_default(),
            amount: normalize(raw_amount),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn writes_the_sheet_schema() {
        let record = TransactionRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            category: "makan".to_string(),
            description: "nasi padang".to_string(),
            amount: 25_000,
            kind: TransactionKind::Expense,
        };
        assert_eq!(
            record.to_row(),
            row(&[
                "2024-01-02T03:04:05.000Z",
                "makan",
                "nasi padang",
                "25000",
                "Pengeluaran"
            ])
        );
        assert_eq!(TransactionRecord::from_row(&record.to_row()), Some(record));
    }

    #[test]
    fn drafts_keep_only_milliseconds() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::TimeDelta::nanoseconds(571_003_518);
        let draft = TransactionDraft {
            category: "makan".to_string(),
            description: "-".to_string(),
            amount: 1,
            kind: TransactionKind::Expense,
        };
        let record = TransactionRecord::from_draft(draft, at);
        assert_eq!(record.timestamp.timestamp_subsec_nanos(), 571_000_000);
        assert_eq!(TransactionRecord::from_row(&record.to_row()), Some(record));
    }

    #[test]
    fn reads_formatted_amounts() {
        let parsed = TransactionRecord::from_row(&row(&[
            "2024-01-02T03:04:05.000Z",
            "Gaji",
            "",
            "Rp 5.000.000",
            "Pemasukan",
        ]))
        .unwrap();
        assert_eq!(parsed.amount, 5_000_000);
        assert_eq!(parsed.signed_amount(), 5_000_000);
    }

    #[test]
    fn skips_malformed_rows() {
        let header = row(&["Tanggal", "Kategori", "Deskripsi", "Jumlah", "Tipe"]);
        assert_eq!(TransactionRecord::from_row(&header), None);
        assert_eq!(
            TransactionRecord::from_row(&row(&["2024-01-02T03:04:05Z", "x", "y", "", "Pemasukan"])),
            None
        );
        assert_eq!(
            TransactionRecord::from_row(&row(&["2024-01-02T03:04:05Z", "x", "y", "10"])),
            None
        );
        assert_eq!(
            TransactionRecord::from_row(&row(&["2024-01-02T03:04:05Z", "x", "y", "10", "pemasukan"])),
            None
        );
    }
}
