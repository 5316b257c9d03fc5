//! Workbook sources: named sheets yielding rows of raw cells.
//!
//! Rows are addressed from cell `A1`: if a sheet's used range starts further in,
//! [`XlsxWorkbook`] pads it so column indices stay absolute.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use indexmap::IndexMap;

/// One raw cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Blank or error cell.
    Empty,
    /// Text (never empty).
    Text(String),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
}

impl Cell {
    /// Text form of the cell, `None` for [`Cell::Empty`]. Whole floats print without a
    /// fractional part (`3.0` → `"3"`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// Integer form: numbers are truncated, text contributes its leading integer
    /// (`"12 spits"` → `12`).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Cell::Text(s) => leading_int(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<&Data> for Cell {
    fn from(d: &Data) -> Self {
        match d {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Text(dt.to_string()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

/// Leading optional sign and digits after trimming, like a lenient `parseInt`.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits = s[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len() - sign_len);
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// A workbook-like source of named sheets.
pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// All rows of one sheet, starting at row 1.
    fn rows(&mut self, sheet: &str) -> anyhow::Result<Vec<Vec<Cell>>>;
}

/// Spreadsheet file read with calamine (xlsx, xls, ods).
pub struct XlsxWorkbook {
    inner: Sheets<BufReader<File>>,
}

impl XlsxWorkbook {
    /// Open a workbook file; the format is picked from the extension.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let inner = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
        Ok(Self { inner })
    }
}

impl WorkbookSource for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn rows(&mut self, sheet: &str) -> anyhow::Result<Vec<Vec<Cell>>> {
        let range = self
            .inner
            .worksheet_range(sheet)
            .with_context(|| format!("Failed to read sheet: {sheet}"))?;

        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); first_row as usize];
        for r in range.rows() {
            let mut cells = vec![Cell::Empty; first_col as usize];
            cells.extend(r.iter().map(Cell::from));
            rows.push(cells);
        }
        Ok(rows)
    }
}

/// Sheets held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: IndexMap<String, Vec<Vec<Cell>>>,
}

impl MemoryWorkbook {
    /// Empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append (or replace) a sheet.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        self.sheets.insert(name.into(), rows);
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn rows(&mut self, sheet: &str) -> anyhow::Result<Vec<Vec<Cell>>> {
        self.sheets
            .get(sheet)
            .cloned()
            .with_context(|| format!("no sheet named {sheet}"))
    }
}
