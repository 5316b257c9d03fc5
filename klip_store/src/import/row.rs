use super::{layout::ColumnLayout, workbook::Cell};

/// The fields of one data row the importer looks at, already extracted from cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    /// Trimmed site name, `None` when blank.
    pub site: Option<String>,
    /// Raw convention marker, `None` when the cell is empty.
    pub convention: Option<String>,
    /// Trimmed sector name, `None` when blank.
    pub sector: Option<String>,
    /// Raw route label, `None` when the cell is empty.
    pub label: Option<String>,
    /// Pitch count column (informational).
    pub pitch_count: Option<i64>,
    /// Bolt count; zero and unreadable values become `None`.
    pub nb_bolts: Option<i32>,
}

impl ImportRow {
    /// Extract the configured columns. Short rows read as blank cells.
    pub fn from_cells(cells: &[Cell], columns: &ColumnLayout) -> Self {
        let text = |i: usize| cells.get(i).and_then(Cell::as_text);
        let trimmed = |i: usize| {
            text(i)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let int = |i: usize| cells.get(i).and_then(Cell::as_int);

        Self {
            site: trimmed(columns.site),
            convention: text(columns.convention),
            sector: trimmed(columns.sector),
            label: text(columns.label),
            pitch_count: int(columns.pitch_count),
            nb_bolts: int(columns.bolts)
                .filter(|&n| n != 0)
                .and_then(|n| i32::try_from(n).ok()),
        }
    }

    /// `true` when every cell of the row is empty.
    pub fn is_blank(cells: &[Cell]) -> bool {
        cells.iter().all(|c| *c == Cell::Empty)
    }
}

/// Access agreement marker: Y/YES/OUI → `Some(true)`, N/NO/NON → `Some(false)`, anything
/// else → `None`. Case-insensitive, surrounding whitespace ignored.
pub fn parse_convention(value: &str) -> Option<bool> {
    match value.trim().to_uppercase().as_str() {
        "Y" | "YES" | "OUI" => Some(true),
        "N" | "NO" | "NON" => Some(false),
        _ => None,
    }
}
