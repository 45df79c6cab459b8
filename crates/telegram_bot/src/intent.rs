//! What an inbound event asks for.

use engine::{PeriodMode, command::is_record_command};

const HELP_WORDS: &[&str] = &["help", "menu", "/start", "/help"];
const BALANCE_WORDS: &[&str] = &["saldo", "balance"];
const REPORT_WORDS: &[&str] = &["laporan", "report"];
const WEEK_WORDS: &[&str] = &["minggu", "mingguan", "week", "weekly"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Intent {
    Help,
    Record,
    Balance,
    Report(PeriodMode),
    Receipt,
}

/// Picks the intent of an event. An attached image always wins over its
/// caption; text that matches nothing is `None`.
pub(crate) fn detect(text: Option<&str>, has_image: bool) -> Option<Intent> {
    if has_image {
        return Some(Intent::Receipt);
    }

    let text = text?.trim();
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    if words.len() == 1 && HELP_WORDS.contains(&words[0]) {
        return Some(Intent::Help);
    }
    if is_record_command(text) {
        return Some(Intent::Record);
    }
    if words.iter().any(|w| REPORT_WORDS.contains(w)) {
        let mode = if words.iter().any(|w| WEEK_WORDS.contains(w)) {
            PeriodMode::Week
        } else {
            PeriodMode::Month
        };
        return Some(Intent::Report(mode));
    }
    if words.iter().any(|w| BALANCE_WORDS.contains(w)) {
        return Some(Intent::Balance);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<Intent> {
        detect(Some(s), false)
    }

    #[test]
    fn help_aliases() {
        for s in ["help", "HELP", " menu ", "/start", "/help"] {
            assert_eq!(text(s), Some(Intent::Help), "{s}");
        }
        assert_eq!(text("help me please"), None);
    }

    #[test]
    fn record_verbs() {
        assert_eq!(text("catat 50000 keluar makan"), Some(Intent::Record));
        assert_eq!(text("Record 50000 expense lunch"), Some(Intent::Record));
        // Too short to parse, still routed so the user gets the usage hint.
        assert_eq!(text("catat"), Some(Intent::Record));
    }

    #[test]
    fn record_beats_keywords_in_the_description() {
        assert_eq!(text("catat 10000 topup saldo gopay"), Some(Intent::Record));
    }

    #[test]
    fn balance_phrases() {
        assert_eq!(text("update saldo"), Some(Intent::Balance));
        assert_eq!(text("Saldo"), Some(Intent::Balance));
        assert_eq!(text("balance"), Some(Intent::Balance));
    }

    #[test]
    fn report_modes() {
        assert_eq!(text("laporan minggu"), Some(Intent::Report(PeriodMode::Week)));
        assert_eq!(text("report week"), Some(Intent::Report(PeriodMode::Week)));
        assert_eq!(text("laporan bulan"), Some(Intent::Report(PeriodMode::Month)));
        assert_eq!(text("laporan"), Some(Intent::Report(PeriodMode::Month)));
    }

    #[test]
    fn image_wins_over_caption() {
        assert_eq!(detect(Some("laporan minggu"), true), Some(Intent::Receipt));
        assert_eq!(detect(None, true), Some(Intent::Receipt));
    }

    #[test]
    fn chatter_is_ignored() {
        assert_eq!(text("halo apa kabar"), None);
        assert_eq!(text(""), None);
        assert_eq!(detect(None, false), None);
    }
}
