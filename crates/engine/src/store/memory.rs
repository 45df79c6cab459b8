use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use tokio::sync::Mutex;

use super::{A1Range, Grid, Row, RowStore, collect_rows, next_append_row, row_cells};
use crate::{BoxFuture, StoreError};

/// Process-local store. Lost on restart.
///
/// Counts range reads so callers can observe cache behaviour, and exposes
/// [`MemoryStore::set_cell`] to stand in for a human editing the sheet.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: Mutex<HashMap<String, Grid>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read_range` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Edits a cell out of band.
    pub async fn set_cell(&self, cell: &A1Range, value: &str) -> Result<(), StoreError> {
        self.write(cell, value.to_string()).await
    }

    async fn write(&self, cell: &A1Range, value: String) -> Result<(), StoreError> {
        let key = cell.cell()?;
        let mut sheets = self.sheets.lock().await;
        let grid = sheets.entry(cell.sheet.clone()).or_default();
        if value.is_empty() {
            grid.remove(&key);
        } else {
            grid.insert(key, value);
        }
        Ok(())
    }
}

impl RowStore for MemoryStore {
    fn append_row<'a>(&'a self, range: &'a A1Range, row: Row) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut sheets = self.sheets.lock().await;
            let grid = sheets.entry(range.sheet.clone()).or_default();
            let row_index = next_append_row(grid, range)?;
            grid.extend(row_cells(range, row_index, row));
            Ok(())
        })
    }

    fn read_range<'a>(&'a self, range: &'a A1Range) -> BoxFuture<'a, Result<Vec<Row>, StoreError>> {
        Box::pin(async move {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let sheets = self.sheets.lock().await;
            Ok(sheets
                .get(&range.sheet)
                .map(|grid| collect_rows(grid, range))
                .unwrap_or_default())
        })
    }

    fn write_cell<'a>(&'a self, cell: &'a A1Range, value: String) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.write(cell, value))
    }
}
