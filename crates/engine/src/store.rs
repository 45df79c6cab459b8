//! Durable row store interface.
//!
//! The ledger never talks to a database or spreadsheet directly: it goes
//! through [`RowStore`], which speaks spreadsheet ranges in A1 notation
//! (`Sheet1!A:E` for a column span, `Sheet1!G4` for one cell).
//!
//! Implementations:
//! - [`MemoryStore`], process-local, used by tests and the `memory` setting;
//! - [`SqliteStore`], one row per non-empty cell in `sheet_cells`;
//! - `sheets::SheetsStore` in its own crate, backed by Google Sheets.

use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{BoxFuture, StoreError};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

mod memory;
mod sqlite;

/// One spreadsheet row, left to right.
pub type Row = Vec<String>;

/// Append-only row store with range reads and single-cell writes.
pub trait RowStore: Send + Sync {
    /// Appends `row` after the last non-empty row of the column span `range`.
    fn append_row<'a>(&'a self, range: &'a A1Range, row: Row) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Reads `range` top to bottom. Trailing empty cells of each row and
    /// trailing empty rows are omitted.
    fn read_range<'a>(&'a self, range: &'a A1Range) -> BoxFuture<'a, Result<Vec<Row>, StoreError>>;

    /// Overwrites one cell. An empty value clears it.
    fn write_cell<'a>(&'a self, cell: &'a A1Range, value: String) -> BoxFuture<'a, Result<(), StoreError>>;
}

const DEFAULT_SHEET: &str = "Sheet1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Span {
    /// Whole columns `first..=last` (zero-based).
    Columns { first: u32, last: u32 },
    /// A single zero-based cell.
    Cell { col: u32, row: u32 },
}

/// A parsed A1 range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    pub span: Span,
}

impl A1Range {
    pub fn first_col(&self) -> u32 {
        match self.span {
            Span::Columns { first, .. } => first,
            Span::Cell { col, .. } => col,
        }
    }

    pub fn last_col(&self) -> u32 {
        match self.span {
            Span::Columns { last, .. } => last,
            Span::Cell { col, .. } => col,
        }
    }

    pub fn contains_col(&self, col: u32) -> bool {
        (self.first_col()..=self.last_col()).contains(&col)
    }

    /// Returns the cell position, or an error for column spans.
    pub fn cell(&self) -> Result<(u32, u32), StoreError> {
        match self.span {
            Span::Cell { col, row } => Ok((row, col)),
            Span::Columns { .. } => Err(StoreError::InvalidRange(format!(
                "{self} is not a single cell"
            ))),
        }
    }

    fn columns(&self) -> Result<(u32, u32), StoreError> {
        match self.span {
            Span::Columns { first, last } => Ok((first, last)),
            Span::Cell { .. } => Err(StoreError::InvalidRange(format!(
                "{self} is not a column span"
            ))),
        }
    }
}

impl FromStr for A1Range {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidRange(s.to_string());

        let (sheet, reference) = match s.trim().rsplit_once('!') {
            Some((sheet, reference)) => (sheet.trim_matches('\''), reference),
            None => (DEFAULT_SHEET, s.trim()),
        };
        if sheet.is_empty() {
            return Err(invalid());
        }

        let span = match reference.split_once(':') {
            Some((from, to)) => {
                let first = column_index(from).ok_or_else(invalid)?;
                let last = column_index(to).ok_or_else(invalid)?;
                if last < first {
                    return Err(invalid());
                }
                Span::Columns { first, last }
            }
            None => {
                let split = reference
                    .find(|c: char| c.is_ascii_digit())
                    .ok_or_else(invalid)?;
                let (letters, digits) = reference.split_at(split);
                let col = column_index(letters).ok_or_else(invalid)?;
                let row: u32 = digits.parse().map_err(|_| invalid())?;
                if row == 0 {
                    return Err(invalid());
                }
                Span::Cell { col, row: row - 1 }
            }
        };

        Ok(Self {
            sheet: sheet.to_string(),
            span,
        })
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            write!(f, "{}!", self.sheet)?;
        } else {
            write!(f, "'{}'!", self.sheet)?;
        }
        match self.span {
            Span::Columns { first, last } => {
                write!(f, "{}:{}", column_name(first), column_name(last))
            }
            Span::Cell { col, row } => write!(f, "{}{}", column_name(col), row + 1),
        }
    }
}

fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let digit = u32::from(c.to_ascii_uppercase() as u8 - b'A') + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
    .map(|n| n - 1)
}

fn column_name(index: u32) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

/// Non-empty cells of one sheet keyed by `(row, col)`.
pub(crate) type Grid = BTreeMap<(u32, u32), String>;

/// Row index an append to `range` lands on.
pub(crate) fn next_append_row(grid: &Grid, range: &A1Range) -> Result<u32, StoreError> {
    range.columns()?;
    Ok(grid
        .keys()
        .filter(|(_, col)| range.contains_col(*col))
        .map(|(row, _)| row + 1)
        .max()
        .unwrap_or(0))
}

/// Cells written by appending `row` at `row_index`.
pub(crate) fn row_cells(range: &A1Range, row_index: u32, row: Row) -> Vec<((u32, u32), String)> {
    let first = range.first_col();
    row.into_iter()
        .zip(first..)
        .filter(|(value, _)| !value.is_empty())
        .map(|(value, col)| ((row_index, col), value))
        .collect()
}

/// Shapes the cells of `grid` covered by `range` the way a spreadsheet API
/// returns them.
pub(crate) fn collect_rows(grid: &Grid, range: &A1Range) -> Vec<Row> {
    if let Span::Cell { col, row } = range.span {
        return grid
            .get(&(row, col))
            .map(|value| vec![vec![value.clone()]])
            .unwrap_or_default();
    }

    let first = range.first_col();
    let mut rows: Vec<Row> = Vec::new();
    for ((row, col), value) in grid.iter().filter(|((_, col), _)| range.contains_col(*col)) {
        let row = *row as usize;
        if rows.len() <= row {
            rows.resize_with(row + 1, Vec::new);
        }
        let offset = (col - first) as usize;
        let cells = &mut rows[row];
        if cells.len() <= offset {
            cells.resize(offset + 1, String::new());
        }
        cells[offset] = value.clone();
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> A1Range {
        s.parse().unwrap()
    }

    #[test]
    fn parses_column_spans_and_cells() {
        assert_eq!(
            range("Sheet1!A:E"),
            A1Range {
                sheet: "Sheet1".to_string(),
                span: Span::Columns { first: 0, last: 4 }
            }
        );
        assert_eq!(range("Sheet1!G4").span, Span::Cell { col: 6, row: 3 });
        assert_eq!(range("'My Sheet'!AA10").sheet, "My Sheet");
        assert_eq!(range("'My Sheet'!AA10").span, Span::Cell { col: 26, row: 9 });
        assert_eq!(range("B2").sheet, DEFAULT_SHEET);
    }

    #[test]
    fn rejects_bad_ranges() {
        for bad in ["", "Sheet1!", "Sheet1!E:A", "Sheet1!G0", "Sheet1!4", "!A:B", "Sheet1!A1:"] {
            assert!(bad.parse::<A1Range>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn display_round_trips() {
        for s in ["Sheet1!A:E", "Sheet1!G4", "Log!AB:AZ", "'Buku Kas'!G7"] {
            assert_eq!(range(s).to_string(), s);
        }
    }

    #[test]
    fn rows_are_trimmed_like_a_spreadsheet() {
        let mut grid = Grid::new();
        grid.insert((0, 0), "a".to_string());
        grid.insert((0, 2), "c".to_string());
        grid.insert((2, 1), "x".to_string());
        grid.insert((5, 6), "outside".to_string());

        let rows = collect_rows(&grid, &range("Sheet1!A:E"));
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), String::new(), "c".to_string()],
                vec![],
                vec![String::new(), "x".to_string()],
            ]
        );
        assert_eq!(next_append_row(&grid, &range("Sheet1!A:E")).unwrap(), 3);
        assert_eq!(collect_rows(&grid, &range("Sheet1!G6")), vec![vec!["outside".to_string()]]);
        assert!(collect_rows(&grid, &range("Sheet1!G7")).is_empty());
    }
}
