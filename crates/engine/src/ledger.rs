use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::{
    StoreError,
    amount::to_signed,
    balance::{AnchoredCell, BalanceSource, BalanceStrategy, LogMetric, LogSum, MetricCache},
    reports::PeriodMode,
    store::{A1Range, RowStore},
    transactions::{TransactionDraft, TransactionKind, TransactionRecord},
};

pub const DEFAULT_LOG_RANGE: &str = "Sheet1!A:E";
pub const DEFAULT_BALANCE_CELL: &str = "Sheet1!G4";
pub const DEFAULT_INVESTMENT_CELL: &str = "Sheet1!G7";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

const WEEK: chrono::TimeDelta = chrono::TimeDelta::days(7);

/// Receipt for a persisted draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ack {
    pub record: TransactionRecord,
}

/// Income and expense over a period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    pub income: i64,
    pub expense: i64,
}

#[derive(Debug)]
struct Metric {
    strategy: Box<dyn BalanceStrategy>,
    cache: MetricCache,
}

impl Metric {
    async fn get(&self, store: &dyn RowStore, force: bool) -> Result<i64, StoreError> {
        self.cache
            .get_or_refresh(force, || self.strategy.compute(store))
            .await
    }
}

/// Owns the transaction log access, the balance caches and the period
/// aggregation.
pub struct Ledger {
    store: Arc<dyn RowStore>,
    log: A1Range,
    source: BalanceSource,
    balance: Metric,
    investment: Metric,
    timezone: Tz,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("log", &self.log)
            .field("source", &self.source)
            .field("balance", &self.balance)
            .field("investment", &self.investment)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Return a builder for `Ledger`.
    pub fn builder(store: Arc<dyn RowStore>) -> LedgerBuilder {
        LedgerBuilder {
            store,
            source: BalanceSource::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            log_range: DEFAULT_LOG_RANGE.to_string(),
            balance_cell: DEFAULT_BALANCE_CELL.to_string(),
            investment_cell: DEFAULT_INVESTMENT_CELL.to_string(),
            timezone: Tz::UTC,
        }
    }

    pub fn source(&self) -> BalanceSource {
        self.source
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Appends one row stamped with the current time.
    ///
    /// On success both balance caches are marked stale; on failure nothing
    /// local changes.
    pub async fn append(&self, draft: TransactionDraft) -> Result<Ack, StoreError> {
        let record = TransactionRecord::from_draft(draft, Utc::now());
        self.store.append_row(&self.log, record.to_row()).await?;

        tracing::info!(
            category = %record.category,
            amount = record.amount,
            kind = record.kind.label(),
            "transaction appended"
        );

        self.balance.cache.invalidate().await;
        self.investment.cache.invalidate().await;
        Ok(Ack { record })
    }

    /// Cash balance; `force` bypasses a fresh cache entry.
    pub async fn balance(&self, force: bool) -> Result<i64, StoreError> {
        self.balance.get(self.store.as_ref(), force).await
    }

    /// Investment value, cached independently of the balance.
    pub async fn investment_value(&self, force: bool) -> Result<i64, StoreError> {
        self.investment.get(self.store.as_ref(), force).await
    }

    pub async fn period_totals(&self, mode: PeriodMode) -> Result<PeriodTotals, StoreError> {
        self.period_totals_at(mode, Utc::now()).await
    }

    /// Scans the whole log for rows inside `mode`'s window ending at `now`.
    /// Malformed rows are skipped.
    pub async fn period_totals_at(
        &self,
        mode: PeriodMode,
        now: DateTime<Utc>,
    ) -> Result<PeriodTotals, StoreError> {
        let rows = self.store.read_range(&self.log).await?;
        let local_now = now.with_timezone(&self.timezone);

        let mut totals = PeriodTotals::default();
        for record in rows.iter().filter_map(|row| TransactionRecord::from_row(row)) {
            let in_period = match mode {
                PeriodMode::Week => now - record.timestamp <= WEEK,
                PeriodMode::Month => {
                    let local = record.timestamp.with_timezone(&self.timezone);
                    local.year() == local_now.year() && local.month() == local_now.month()
                }
            };
            if !in_period {
                continue;
            }

            let amount = to_signed(record.amount);
            match record.kind {
                TransactionKind::Income => totals.income = totals.income.saturating_add(amount),
                TransactionKind::Expense => totals.expense = totals.expense.saturating_add(amount),
            }
        }

        Ok(totals)
    }
}

pub struct LedgerBuilder {
    store: Arc<dyn RowStore>,
    source: BalanceSource,
    cache_ttl: Duration,
    log_range: String,
    balance_cell: String,
    investment_cell: String,
    timezone: Tz,
}

impl LedgerBuilder {
    pub fn source(mut self, source: BalanceSource) -> Self {
        self.source = source;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn log_range(mut self, range: &str) -> Self {
        self.log_range = range.to_string();
        self
    }

    pub fn balance_cell(mut self, cell: &str) -> Self {
        self.balance_cell = cell.to_string();
        self
    }

    pub fn investment_cell(mut self, cell: &str) -> Self {
        self.investment_cell = cell.to_string();
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Construct `Ledger`. Fails on malformed ranges.
    pub fn build(self) -> Result<Ledger, StoreError> {
        let log: A1Range = self.log_range.parse()?;
        let balance_cell: A1Range = self.balance_cell.parse()?;
        let investment_cell: A1Range = self.investment_cell.parse()?;
        if log.cell().is_ok() {
            return Err(StoreError::InvalidRange(format!(
                "log range {log} must be a column span"
            )));
        }
        balance_cell.cell()?;
        investment_cell.cell()?;

        let (balance, investment): (Box<dyn BalanceStrategy>, Box<dyn BalanceStrategy>) =
            match self.source {
                BalanceSource::Derived => (
                    Box::new(LogSum::new(log.clone(), LogMetric::Cash)),
                    Box::new(LogSum::new(log.clone(), LogMetric::Investment)),
                ),
                BalanceSource::Anchored => (
                    Box::new(AnchoredCell::new(balance_cell)),
                    Box::new(AnchoredCell::new(investment_cell)),
                ),
            };

        tracing::info!(source = ?self.source, log = %log, "ledger ready");

        Ok(Ledger {
            store: self.store,
            log,
            source: self.source,
            balance: Metric {
                strategy: balance,
                cache: MetricCache::new(self.cache_ttl),
            },
            investment: Metric {
                strategy: investment,
                cache: MetricCache::new(self.cache_ttl),
            },
            timezone: self.timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::MemoryStore;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn draft(amount: u64, kind: TransactionKind, category: &str) -> TransactionDraft {
        TransactionDraft {
            category: category.to_string(),
            description: "-".to_string(),
            amount,
            kind,
        }
    }

    fn ledger(store: Arc<MemoryStore>, source: BalanceSource) -> Ledger {
        Ledger::builder(store)
            .source(source)
            .timezone(chrono_tz::Asia::Jakarta)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn cached_balance_skips_the_store() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), BalanceSource::Derived);
        ledger
            .append(draft(100_000, TransactionKind::Income, "Pemasukan"))
            .await
            .unwrap();

        assert_eq!(ledger.balance(false).await.unwrap(), 100_000);
        assert_eq!(ledger.balance(false).await.unwrap(), 100_000);
        assert_eq!(store.read_count(), 1);

        assert_eq!(ledger.balance(true).await.unwrap(), 100_000);
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn ack_matches_the_stored_row() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), BalanceSource::Derived);
        let ack = ledger
            .append(draft(12_500, TransactionKind::Expense, "parkir"))
            .await
            .unwrap();

        assert_eq!(
            TransactionRecord::from_row(&ack.record.to_row()),
            Some(ack.record.clone())
        );
        let log: A1Range = DEFAULT_LOG_RANGE.parse().unwrap();
        let rows = store.read_range(&log).await.unwrap();
        assert_eq!(TransactionRecord::from_row(&rows[0]), Some(ack.record));
    }

    #[tokio::test]
    async fn concurrent_readers_share_one_refresh() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), BalanceSource::Derived);
        ledger
            .append(draft(70_000, TransactionKind::Income, "Pemasukan"))
            .await
            .unwrap();

        let (a, b) = tokio::join!(ledger.balance(false), ledger.balance(false));
        assert_eq!(a.unwrap(), 70_000);
        assert_eq!(b.unwrap(), 70_000);
        assert_eq!(store.read_count(), 1);

        let (cash, invest, again) = tokio::join!(
            ledger.balance(false),
            ledger.investment_value(false),
            ledger.investment_value(false)
        );
        assert_eq!((cash.unwrap(), invest.unwrap(), again.unwrap()), (70_000, 0, 0));
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn balance_and_investment_have_separate_caches() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), BalanceSource::Derived);
        ledger
            .append(draft(300_000, TransactionKind::Expense, "Investasi"))
            .await
            .unwrap();

        assert_eq!(ledger.balance(false).await.unwrap(), -300_000);
        assert_eq!(ledger.investment_value(false).await.unwrap(), 300_000);
        assert_eq!(store.read_count(), 2);
        ledger.investment_value(false).await.unwrap();
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn append_invalidates_the_caches() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), BalanceSource::Derived);
        assert_eq!(ledger.balance(false).await.unwrap(), 0);

        ledger
            .append(draft(50_000, TransactionKind::Expense, "expense"))
            .await
            .unwrap();
        assert_eq!(ledger.balance(false).await.unwrap(), -50_000);
    }

    #[tokio::test]
    async fn anchored_balance_ignores_the_log() {
        let store = Arc::new(MemoryStore::new());
        let cell: A1Range = DEFAULT_BALANCE_CELL.parse().unwrap();
        store.set_cell(&cell, "1.000.000").await.unwrap();
        let ledger = ledger(store.clone(), BalanceSource::Anchored);

        ledger
            .append(draft(50_000, TransactionKind::Expense, "expense"))
            .await
            .unwrap();
        assert_eq!(ledger.balance(true).await.unwrap(), 1_000_000);

        store.set_cell(&cell, "950.000").await.unwrap();
        assert_eq!(ledger.balance(true).await.unwrap(), 950_000);
    }

    #[tokio::test]
    async fn period_windows() {
        let store = Arc::new(MemoryStore::new());
        let log: A1Range = DEFAULT_LOG_RANGE.parse().unwrap();
        for r in [
            row(&["Tanggal", "Kategori", "Deskripsi", "Jumlah", "Tipe"]),
            // 40 days ago
            row(&["2024-02-20T10:00:00.000Z", "Gaji", "-", "5.000.000", "Pemasukan"]),
            // 8 days ago, same month
            row(&["2024-03-23T10:00:00.000Z", "makan", "-", "20000", "Pengeluaran"]),
            // 2 days ago
            row(&["2024-03-29T10:00:00.000Z", "makan", "-", "30000", "Pengeluaran"]),
            row(&["2024-03-30T10:00:00.000Z", "Pemasukan", "-", "100000", "Pemasukan"]),
            // Malformed rows are skipped.
            row(&["", "makan", "-", "999", "Pengeluaran"]),
            row(&["2024-03-30T10:00:00.000Z", "makan", "-", "", "Pengeluaran"]),
            row(&["2024-03-30T10:00:00.000Z", "makan", "-", "999", "Lainnya"]),
        ] {
            store.append_row(&log, r).await.unwrap();
        }
        let ledger = ledger(store, BalanceSource::Derived);
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 10, 0, 0).unwrap();

        let week = ledger.period_totals_at(PeriodMode::Week, now).await.unwrap();
        assert_eq!(week, PeriodTotals { income: 100_000, expense: 30_000 });

        let month = ledger.period_totals_at(PeriodMode::Month, now).await.unwrap();
        assert_eq!(month, PeriodTotals { income: 100_000, expense: 50_000 });
    }

    #[tokio::test]
    async fn month_follows_the_configured_timezone() {
        let store = Arc::new(MemoryStore::new());
        let log: A1Range = DEFAULT_LOG_RANGE.parse().unwrap();
        // 1 April 01:00 in Jakarta.
        store
            .append_row(
                &log,
                row(&["2024-03-31T18:00:00.000Z", "makan", "-", "10000", "Pengeluaran"]),
            )
            .await
            .unwrap();
        let ledger = ledger(store, BalanceSource::Derived);

        let april = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let totals = ledger.period_totals_at(PeriodMode::Month, april).await.unwrap();
        assert_eq!(totals.expense, 10_000);
    }

    #[test]
    fn rejects_bad_ranges() {
        let store = Arc::new(MemoryStore::new());
        assert!(Ledger::builder(store.clone()).log_range("Sheet1!A1").build().is_err());
        assert!(Ledger::builder(store.clone()).balance_cell("Sheet1!G:G").build().is_err());
        assert!(Ledger::builder(store).investment_cell("nope").build().is_err());
    }
}
