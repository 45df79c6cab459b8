//! Balance derivation strategies and their time-bounded cache.
//!
//! Two ways of knowing a balance coexist and are picked by configuration:
//!
//! - [`BalanceSource::Derived`]: replay the whole transaction log;
//! - [`BalanceSource::Anchored`]: trust one externally maintained cell
//!   (usually a spreadsheet formula a human keeps up to date).

use std::{fmt, future::Future, time::Duration};

use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    BoxFuture, StoreError,
    amount::{normalize_signed, to_signed},
    store::{A1Range, RowStore},
    transactions::{INVESTMENT_CATEGORY, TransactionKind, TransactionRecord},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSource {
    #[default]
    Derived,
    Anchored,
}

/// Computes one metric from the store.
pub trait BalanceStrategy: Send + Sync + fmt::Debug {
    fn compute<'a>(&'a self, store: &'a dyn RowStore) -> BoxFuture<'a, Result<i64, StoreError>>;
}

/// What a [`LogSum`] adds up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogMetric {
    /// Income minus expense.
    Cash,
    /// Expenses booked under the investment category.
    Investment,
}

/// Derived strategy: a full scan of the transaction log.
#[derive(Clone, Debug)]
pub struct LogSum {
    log: A1Range,
    metric: LogMetric,
}

impl LogSum {
    pub fn new(log: A1Range, metric: LogMetric) -> Self {
        Self { log, metric }
    }

    fn contribution(&self, record: &TransactionRecord) -> i64 {
        match self.metric {
            LogMetric::Cash => record.signed_amount(),
            LogMetric::Investment => {
                if record.kind == TransactionKind::Expense
                    && record.category.eq_ignore_ascii_case(INVESTMENT_CATEGORY)
                {
                    to_signed(record.amount)
                } else {
                    0
                }
            }
        }
    }
}

impl BalanceStrategy for LogSum {
    fn compute<'a>(&'a self, store: &'a dyn RowStore) -> BoxFuture<'a, Result<i64, StoreError>> {
        Box::pin(async move {
            let rows = store.read_range(&self.log).await?;
            Ok(rows
                .iter()
                .filter_map(|row| TransactionRecord::from_row(row))
                .fold(0i64, |acc, record| {
                    acc.saturating_add(self.contribution(&record))
                }))
        })
    }
}

/// Anchored strategy: the value of a single cell.
#[derive(Clone, Debug)]
pub struct AnchoredCell {
    cell: A1Range,
}

impl AnchoredCell {
    pub fn new(cell: A1Range) -> Self {
        Self { cell }
    }
}

impl BalanceStrategy for AnchoredCell {
    fn compute<'a>(&'a self, store: &'a dyn RowStore) -> BoxFuture<'a, Result<i64, StoreError>> {
        Box::pin(async move {
            let rows = store.read_range(&self.cell).await?;
            Ok(rows
                .first()
                .and_then(|row| row.first())
                .map_or(0, |value| normalize_signed(value)))
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub value: i64,
    pub computed_at: Instant,
}

/// Single-slot cache with a fixed TTL.
///
/// The lock is held while refreshing, so concurrent readers of a stale
/// metric wait for one store query instead of issuing their own.
#[derive(Debug)]
pub struct MetricCache {
    ttl: Duration,
    slot: Mutex<Option<Snapshot>>,
}

impl MetricCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached value when fresh and `force` is false, otherwise
    /// runs `compute` and stores its result. A failed compute leaves the
    /// previous snapshot untouched.
    pub async fn get_or_refresh<F, Fut>(&self, force: bool, compute: F) -> Result<i64, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, StoreError>>,
    {
        let mut slot = self.slot.lock().await;
        if !force
            && let Some(snapshot) = *slot
            && snapshot.computed_at.elapsed() < self.ttl
        {
            return Ok(snapshot.value);
        }

        let value = compute().await?;
        *slot = Some(Snapshot {
            value,
            computed_at: Instant::now(),
        });
        Ok(value)
    }

    /// Marks the metric stale.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        *self.slot.lock().await
    }
}
