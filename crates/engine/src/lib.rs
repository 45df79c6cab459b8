//! Personal ledger engine.
//!
//! Turns manual commands and receipt OCR text into ledger rows, and keeps a
//! cheap view of the balance on top of a slow external [`RowStore`].
//!
//! Leaf components ([`amount`], [`classify`], [`receipt`], [`command`]) are
//! pure functions. [`Ledger`], [`RateLimiter`] and [`ReportGate`] own all
//! in-memory state and are meant to be shared behind an `Arc`.

use std::{future::Future, pin::Pin};

pub use balance::{BalanceSource, BalanceStrategy, MetricCache};
pub use classify::{Category, classify};
pub use command::parse_command;
pub use error::{EngineError, OcrError, StoreError, ValidationError};
pub use ledger::{Ack, Ledger, LedgerBuilder, PeriodTotals};
pub use rate_limit::RateLimiter;
pub use receipt::{Confidence, Extraction, extract_amount};
pub use reports::{PeriodMode, ReportClaim, ReportGate, day_key};
pub use store::{A1Range, MemoryStore, Row, RowStore, SqliteStore};
pub use transactions::{TransactionDraft, TransactionKind, TransactionRecord};

pub mod amount;
pub mod balance;
pub mod classify;
pub mod command;
mod error;
pub mod ledger;
mod rate_limit;
pub mod receipt;
mod reports;
pub mod store;
pub mod transactions;

/// Boxed future returned by the object-safe collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns an image into text.
pub trait TextRecognizer: Send + Sync {
    fn recognize<'a>(
        &'a self,
        image: &'a [u8],
        languages: &'a str,
    ) -> BoxFuture<'a, Result<String, OcrError>>;
}
