use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::store::EntityCounts;

/// Why a labelled row produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No site or no sector seen yet on this sheet.
    MissingContext,
    /// No name and no route to continue.
    Unattributable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingContext => write!(f, "missing site or sector"),
            SkipReason::Unattributable => write!(f, "cannot determine route"),
        }
    }
}

/// A skipped data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based row number in the sheet.
    pub row: usize,
    /// Label cell as read.
    pub label: String,
    /// Cause.
    pub reason: SkipReason,
}

/// Outcome of importing one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    /// Routes created.
    pub routes: usize,
    /// Pitches created (first pitches included).
    pub pitches: usize,
    /// Rows skipped with a warning.
    pub skipped: Vec<SkippedRow>,
    /// Crags whose convention marker changed after creation; the first value is kept.
    pub convention_conflicts: Vec<String>,
}

impl SheetReport {
    pub(crate) fn skip(&mut self, row: usize, label: &str, reason: SkipReason) {
        tracing::warn!(row, label, %reason, "skipping row");
        self.skipped.push(SkippedRow {
            row,
            label: label.to_string(),
            reason,
        });
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Per-sheet reports in workbook order.
    pub sheets: IndexMap<String, SheetReport>,
    /// Sheets ignored by name.
    pub skipped_sheets: Vec<String>,
    /// Table sizes after the run.
    pub totals: EntityCounts,
    /// Whether the run wrote to an in-memory store only.
    pub dry_run: bool,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // helper: section header with underline
        let mut wrote_any = false;
        let mut section = |title: &str,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.chars().count()))?;
            body(f)?;
            wrote_any = true;
            Ok(())
        };

        for (name, sheet) in &self.sheets {
            section(&format!("Sheet {name}"), &mut |f| {
                writeln!(f, "Routes: {}", sheet.routes)?;
                writeln!(f, "Pitches: {}", sheet.pitches)?;
                for s in &sheet.skipped {
                    writeln!(f, "! row {}: {} ({:?})", s.row, s.reason, s.label)?;
                }
                for crag in &sheet.convention_conflicts {
                    writeln!(f, "! crag {crag:?}: conflicting convention, kept first value")?;
                }
                Ok(())
            })?;
        }

        if !self.skipped_sheets.is_empty() {
            section("Skipped sheets", &mut |f| {
                for name in &self.skipped_sheets {
                    writeln!(f, "{name}")?;
                }
                Ok(())
            })?;
        }

        let title = if self.dry_run {
            "Import Summary (dry run)"
        } else {
            "Import Summary"
        };
        section(title, &mut |f| writeln!(f, "{}", self.totals))
    }
}
