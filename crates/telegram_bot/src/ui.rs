use engine::{
    Extraction, PeriodMode, PeriodTotals, TransactionRecord, ValidationError,
    amount::format_rupiah, amount::to_signed,
};

const USAGE: &str = "Format: catat [jumlah] [tipe] [deskripsi]\ncontoh: catat 50000 keluar makan siang";

pub(crate) fn help_text() -> &'static str {
    "📌 Panduan Penggunaan Bot Keuangan\n\
     1. catat [jumlah] [tipe] [deskripsi]\n\
     \u{20}  contoh: catat 50000 keluar makan siang\n\
     \u{20}  contoh: catat 200000 masuk gaji\n\
     \u{20}  contoh: catat 100000 invest emas\n\
     \n\
     2. update saldo\n\
     \u{20}  ➝ Menampilkan saldo & investasi terbaru\n\
     \n\
     3. laporan minggu\n\
     \u{20}  ➝ Rekap 7 hari terakhir\n\
     \n\
     4. laporan bulan\n\
     \u{20}  ➝ Rekap bulan ini\n\
     \n\
     5. Kirim foto struk\n\
     \u{20}  ➝ Bot akan membaca total otomatis"
}

pub(crate) fn saved(balance: Option<i64>) -> String {
    match balance {
        Some(balance) => format!("✅ Data tersimpan!\nSaldo terkini: {}", format_rupiah(balance)),
        None => "✅ Data tersimpan!\nSaldo belum bisa dihitung, coba \"saldo\" sebentar lagi.".to_string(),
    }
}

pub(crate) fn balance_update(balance: i64, investment: i64) -> String {
    format!(
        "🔄 Update Saldo:\nSaldo Terkini: {}\nNilai Investasi: {}",
        format_rupiah(balance),
        format_rupiah(investment)
    )
}

pub(crate) fn report(mode: PeriodMode, totals: PeriodTotals, balance: i64) -> String {
    format!(
        "📊 Laporan {}\nPemasukan: {}\nPengeluaran: {}\nSaldo akhir: {}",
        mode.label(),
        format_rupiah(totals.income),
        format_rupiah(totals.expense),
        format_rupiah(balance)
    )
}

pub(crate) fn report_already_sent(mode: PeriodMode) -> String {
    format!("ℹ️ Laporan {} sudah dikirim hari ini.", mode.label())
}

pub(crate) fn receipt_saved(
    record: &TransactionRecord,
    extraction: Extraction,
    balance: Option<i64>,
) -> String {
    let mut text = format!(
        "✅ Struk dibaca.\nKategori: {}\nTotal: {}",
        record.category,
        format_rupiah(to_signed(record.amount))
    );
    if let Some(balance) = balance {
        text.push_str(&format!("\nSaldo sekarang: {}", format_rupiah(balance)));
    }
    if extraction.is_low_confidence() {
        text.push_str(
            "\n⚠️ Total tidak terbaca, tercatat Rp0. Koreksi dengan perintah catat.",
        );
    }
    text
}

pub(crate) fn invalid_command(err: &ValidationError) -> String {
    let reason = match err {
        ValidationError::TooFewTokens => "❌ Perintah kurang lengkap.".to_string(),
        ValidationError::UnknownVerb(verb) => format!("❌ Perintah \"{verb}\" tidak dikenal."),
        ValidationError::InvalidAmount(raw) => format!("❌ Jumlah \"{raw}\" tidak valid."),
    };
    format!("{reason}\n{USAGE}")
}

pub(crate) fn store_failed() -> &'static str {
    "⚠️ Gagal mengakses buku kas. Coba lagi nanti."
}

pub(crate) fn ocr_failed() -> String {
    format!("⚠️ Struk tidak bisa dibaca. Kirim foto yang lebih jelas atau catat manual.\n{USAGE}")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use engine::{Confidence, TransactionKind};

    use super::*;

    fn record(amount: u64) -> TransactionRecord {
        TransactionRecord {
            timestamp: Utc::now(),
            category: "Belanja".to_string(),
            description: "Belanja Minimarket".to_string(),
            amount,
            kind: TransactionKind::Expense,
        }
    }

    #[test]
    fn help_lists_every_intent() {
        let help = help_text();
        for needle in ["catat 50000 keluar", "update saldo", "laporan minggu", "laporan bulan", "foto struk"] {
            assert!(help.contains(needle), "{needle}");
        }
        assert!(help.contains("\n   contoh: catat 200000 masuk gaji\n"));
    }

    #[test]
    fn report_uses_rupiah() {
        let text = report(
            PeriodMode::Week,
            PeriodTotals {
                income: 1_000_000,
                expense: 250_500,
            },
            -20_000,
        );
        assert_eq!(
            text,
            "📊 Laporan minggu\nPemasukan: Rp1.000.000\nPengeluaran: Rp250.500\nSaldo akhir: -Rp20.000"
        );
    }

    #[test]
    fn receipt_warns_on_low_confidence() {
        let low = Extraction {
            amount: 0,
            confidence: Confidence::None,
        };
        let text = receipt_saved(&record(0), low, Some(5_000));
        assert!(text.contains("Total: Rp0"));
        assert!(text.contains("Saldo sekarang: Rp5.000"));
        assert!(text.contains("⚠️"));

        let labeled = Extraction {
            amount: 23_500,
            confidence: Confidence::Labeled,
        };
        assert!(!receipt_saved(&record(23_500), labeled, None).contains("⚠️"));
    }

    #[test]
    fn validation_messages_carry_usage() {
        let text = invalid_command(&ValidationError::InvalidAmount("abc".to_string()));
        assert!(text.starts_with("❌ Jumlah \"abc\" tidak valid."));
        assert!(text.ends_with(USAGE));
    }
}
