//! Workbook layout configuration: parsing, normalization, and loading.
//!
//! The layout says which column holds which field, how many header rows open each
//! sheet, which label text marks a repeated header line, and which sheets are not
//! topo sheets at all. Every field has a default, so an empty TOML document yields
//! [`ImportLayout::default`]:
//!
//! ```toml
//! header_rows = 2
//! header_sentinel = "VOIE"
//! skip_sheets = ["Sheet2"]
//!
//! [columns]
//! site = 0
//! convention = 2
//! sector = 3
//! label = 4
//! pitch_count = 8
//! bolts = 9
//! ```
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_layout_str`]
//! - Parse + normalize from a file path: [`load_layout_path`]

use std::{collections::HashSet, mem};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use toml::from_str;

/// Zero-based column indices of the fields the importer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ColumnLayout {
    /// Crag name.
    pub site: usize,
    /// Access agreement marker (Y/N, OUI/NON).
    pub convention: usize,
    /// Sector name.
    pub sector: usize,
    /// Route label (number, name, grade, pitch marker).
    pub label: usize,
    /// Pitch count; read but informational only.
    pub pitch_count: usize,
    /// Bolt count.
    pub bolts: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            site: 0,
            convention: 2,
            sector: 3,
            label: 4,
            pitch_count: 8,
            bolts: 9,
        }
    }
}

/// Top-level layout document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ImportLayout {
    /// Column positions.
    pub columns: ColumnLayout,
    /// Leading rows of every sheet that are never data.
    pub header_rows: usize,
    /// Label text marking a repeated header line.
    pub header_sentinel: String,
    /// Sheets ignored entirely, by exact name.
    pub skip_sheets: Vec<String>,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            columns: ColumnLayout::default(),
            header_rows: 2,
            header_sentinel: "VOIE".to_string(),
            skip_sheets: vec!["Sheet2".to_string()],
        }
    }
}

impl ImportLayout {
    /// Whether `sheet` is listed in [`ImportLayout::skip_sheets`].
    pub fn skips(&self, sheet: &str) -> bool {
        self.skip_sheets.iter().any(|s| s == sheet)
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Skipped-sheet entries dropped as blank or duplicate.
    pub skip_sheets_dropped: usize,
    /// Whether the sentinel had surrounding whitespace.
    pub sentinel_trimmed: bool,
}

/// Normalize a layout in-place.
///
/// - Trim skipped sheet names; drop blanks and duplicates, keeping first-seen order
/// - Trim the header sentinel; reject an empty one
/// - Reject layouts where site, sector and label share a column
pub fn normalize_layout(layout: &mut ImportLayout) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let before_len = layout.skip_sheets.len();
    let mut seen = HashSet::new();
    let mut sheets = Vec::with_capacity(before_len);
    for name in mem::take(&mut layout.skip_sheets) {
        let name = name.trim().to_string();
        if !name.is_empty() && seen.insert(name.clone()) {
            sheets.push(name);
        }
    }
    report.skip_sheets_dropped = before_len - sheets.len();
    layout.skip_sheets = sheets;

    let sentinel = layout.header_sentinel.trim();
    if sentinel.is_empty() {
        bail!("header_sentinel cannot be empty after trimming");
    }
    if sentinel.len() != layout.header_sentinel.len() {
        report.sentinel_trimmed = true;
        layout.header_sentinel = sentinel.to_string();
    }

    let c = layout.columns;
    let keyed = [("site", c.site), ("sector", c.sector), ("label", c.label)];
    for (i, (name, col)) in keyed.iter().enumerate() {
        if let Some((other, _)) = keyed[i + 1..].iter().find(|(_, o)| o == col) {
            bail!("columns.{name} and columns.{other} both point at column {col}");
        }
    }

    Ok(report)
}

/// Parse and normalize a layout from a TOML string.
pub fn load_layout_str(toml_str: &str) -> anyhow::Result<ImportLayout> {
    let mut layout: ImportLayout = from_str(toml_str).context("failed to parse layout TOML")?;
    let report = normalize_layout(&mut layout).context("normalize_layout failed")?;
    tracing::debug!(?report, "layout normalized");
    Ok(layout)
}

/// Read a layout TOML file from disk, parse, and normalize it.
pub fn load_layout_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<ImportLayout> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read layout file {}", path.as_ref().display()))?;
    load_layout_str(&text)
}
