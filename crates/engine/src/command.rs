use crate::{
    ValidationError,
    amount::{has_digits, normalize},
    classify::{EntryType, classify_entry_type},
    transactions::{INCOME_CATEGORY, INVESTMENT_CATEGORY, TransactionDraft, TransactionKind},
};

/// Verbs accepted for a manual entry (matched case-insensitively).
pub const RECORD_VERBS: &[&str] = &["catat", "record"];

/// Description used when the command has none.
pub const DEFAULT_DESCRIPTION: &str = "-";

/// Returns `true` when the first token of `text` is a record verb.
pub fn is_record_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|verb| RECORD_VERBS.iter().any(|v| v.eq_ignore_ascii_case(verb)))
}

/// Parses a manual entry into a draft.
///
/// Grammar: `<verb> <amount> <type> [description...]`
/// - `masuk`, `income`, `pemasukan` in the type => income
/// - `invest`, `emas`, `saham` => investment expense
/// - anything else => expense whose category is the type token as typed
pub fn parse_command(text: &str) -> Result<TransactionDraft, ValidationError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [verb, raw_amount, type_token, rest @ ..] = tokens.as_slice() else {
        return Err(ValidationError::TooFewTokens);
    };

    if !RECORD_VERBS.iter().any(|v| v.eq_ignore_ascii_case(verb)) {
        return Err(ValidationError::UnknownVerb(verb.to_string()));
    }
    if !has_digits(raw_amount) {
        return Err(ValidationError::InvalidAmount(raw_amount.to_string()));
    }

    let (kind, category) = match classify_entry_type(type_token) {
        EntryType::Income => (TransactionKind::Income, INCOME_CATEGORY.to_string()),
        EntryType::Investment => (TransactionKind::Expense, INVESTMENT_CATEGORY.to_string()),
        EntryType::Custom => (TransactionKind::Expense, type_token.to_string()),
    };

    let description = if rest.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        rest.join(" ")
    };

    Ok(TransactionDraft {
        category,
        description,
        amount: normalize(raw_amount),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_keeps_type_token_as_category() {
        let draft = parse_command("record 50000 expense lunch").unwrap();
        assert_eq!(
            draft,
            TransactionDraft {
                category: "expense".to_string(),
                description: "lunch".to_string(),
                amount: 50_000,
                kind: TransactionKind::Expense,
            }
        );
    }

    #[test]
    fn income_keyword() {
        let draft = parse_command("catat 200.000 masuk gaji bulan ini").unwrap();
        assert_eq!(draft.kind, TransactionKind::Income);
        assert_eq!(draft.category, INCOME_CATEGORY);
        assert_eq!(draft.amount, 200_000);
        assert_eq!(draft.description, "gaji bulan ini");
    }

    #[test]
    fn investment_keyword() {
        let draft = parse_command("Catat 100000 invest emas antam").unwrap();
        assert_eq!(draft.kind, TransactionKind::Expense);
        assert_eq!(draft.category, INVESTMENT_CATEGORY);
    }

    #[test]
    fn missing_description_uses_placeholder() {
        let draft = parse_command("catat 15000 Makan").unwrap();
        assert_eq!(draft.category, "Makan");
        assert_eq!(draft.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn rejects_short_commands() {
        assert_eq!(parse_command("catat 5000"), Err(ValidationError::TooFewTokens));
        assert_eq!(parse_command("catat"), Err(ValidationError::TooFewTokens));
        assert_eq!(parse_command("   "), Err(ValidationError::TooFewTokens));
    }

    #[test]
    fn rejects_amount_without_digits() {
        assert_eq!(
            parse_command("catat lima keluar makan"),
            Err(ValidationError::InvalidAmount("lima".to_string()))
        );
    }

    #[test]
    fn rejects_other_verbs() {
        assert_eq!(
            parse_command("hapus 5000 keluar"),
            Err(ValidationError::UnknownVerb("hapus".to_string()))
        );
        assert!(is_record_command("RECORD 1 x"));
        assert!(!is_record_command("recorder 1 x"));
    }
}
