//! One sheet: a fold of [`CarryState`] over the data rows.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::{
    carry::{CarryState, RowTarget},
    label::parse_label,
    layout::ImportLayout,
    report::{SheetReport, SkipReason},
    resolve::{CachePolicy, NameCache},
    row::ImportRow,
    workbook::Cell,
};
use crate::store::ImportStore;

/// Per-sheet lookup state. Nothing here outlives the sheet.
struct SheetImport<'a, S: ?Sized> {
    store: &'a mut S,
    layout: &'a ImportLayout,
    crags: NameCache<String>,
    sectors: NameCache<(i32, String)>,
    conventions: HashMap<i32, Option<bool>>,
    conflicted: HashSet<i32>,
    report: SheetReport,
}

/// Import the data rows of one sheet into `store`.
///
/// The first [`ImportLayout::header_rows`] rows are skipped; row problems are logged,
/// recorded in the returned report, and do not stop the sheet. Store errors do.
pub fn import_sheet<S: ImportStore + ?Sized>(
    store: &mut S,
    layout: &ImportLayout,
    sheet: &str,
    rows: &[Vec<Cell>],
) -> anyhow::Result<SheetReport> {
    info!(sheet, rows = rows.len(), "processing sheet");
    let mut import = SheetImport {
        store,
        layout,
        crags: NameCache::new(CachePolicy::TrustCache),
        sectors: NameCache::new(CachePolicy::TrustCache),
        conventions: HashMap::new(),
        conflicted: HashSet::new(),
        report: SheetReport::default(),
    };

    rows.iter()
        .enumerate()
        .skip(layout.header_rows)
        .try_fold(CarryState::default(), |state, (idx, cells)| {
            import.step(state, idx + 1, cells)
        })?;

    let report = import.report;
    info!(
        sheet,
        routes = report.routes,
        pitches = report.pitches,
        skipped = report.skipped.len(),
        "sheet done"
    );
    Ok(report)
}

impl<S: ImportStore + ?Sized> SheetImport<'_, S> {
    fn step(&mut self, state: CarryState, row_no: usize, cells: &[Cell]) -> anyhow::Result<CarryState> {
        if ImportRow::is_blank(cells) {
            return Ok(state);
        }
        let row = ImportRow::from_cells(cells, &self.layout.columns);
        let state = state.absorb(&row);

        let Some(label) = row.label.as_deref().filter(|l| !l.trim().is_empty()) else {
            return Ok(state);
        };
        if label.contains(&self.layout.header_sentinel) {
            return Ok(state);
        }
        let Some((site, sector)) = state.context() else {
            self.report.skip(row_no, label, SkipReason::MissingContext);
            return Ok(state);
        };

        let crag_id = self.crag(site, state.convention)?;
        let sector_id = self.sector(crag_id, sector)?;

        let parsed = parse_label(label);
        match RowTarget::classify(&parsed, state.route_id) {
            RowTarget::Continuation(route_id) => {
                self.store
                    .create_pitch(route_id, parsed.grade.as_deref(), row.nb_bolts)?;
                self.report.pitches += 1;
                Ok(state)
            }
            RowTarget::NewRoute { number, name } => {
                let route_id = self.store.create_route(sector_id, number, Some(&name))?;
                debug!(route_id, number, %name, "created route");
                self.store
                    .create_pitch(route_id, parsed.grade.as_deref(), row.nb_bolts)?;
                self.report.routes += 1;
                self.report.pitches += 1;
                Ok(state.with_route(route_id))
            }
            RowTarget::Unattributable => {
                self.report.skip(row_no, label, SkipReason::Unattributable);
                Ok(state)
            }
        }
    }

    fn crag(&mut self, name: &str, convention: Option<bool>) -> anyhow::Result<i32> {
        let resolved = self.crags.resolve(
            &mut *self.store,
            name.to_string(),
            |s| s.find_crag(name),
            |s| s.create_crag(name, convention),
        )?;
        if resolved.created {
            debug!(crag_id = resolved.id, name, ?convention, "created crag");
            self.conventions.insert(resolved.id, convention);
        } else if let Some(&first) = self.conventions.get(&resolved.id) {
            if first != convention && self.conflicted.insert(resolved.id) {
                warn!(name, ?first, later = ?convention, "convention differs, keeping first value");
                self.report.convention_conflicts.push(name.to_string());
            }
        }
        Ok(resolved.id)
    }

    fn sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<i32> {
        let resolved = self.sectors.resolve(
            &mut *self.store,
            (crag_id, name.to_string()),
            |s| s.find_sector(crag_id, name),
            |s| s.create_sector(crag_id, name),
        )?;
        if resolved.created {
            debug!(sector_id = resolved.id, crag_id, name, "created sector");
        }
        Ok(resolved.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn r(site: &str, conv: &str, sector: &str, label: &str, bolts: i64) -> Vec<Cell> {
        vec![
            Cell::from(site),
            Cell::Empty,
            Cell::from(conv),
            Cell::from(sector),
            Cell::from(label),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Int(1),
            Cell::Int(bolts),
        ]
    }

    fn headers() -> Vec<Vec<Cell>> {
        vec![
            vec![Cell::from("Maintenance")],
            r("SITE", "CONVENTION", "SECTEUR", "VOIE", 0),
        ]
    }

    #[test]
    fn continuation_row_attaches_to_previous_route() {
        let mut rows = headers();
        rows.push(r("Buoux", "OUI", "Styx", "1 - Rose L1: 6a", 10));
        rows.push(r("", "", "", "L2: 6b", 8));
        let mut store = MemoryStore::new();

        let report = import_sheet(&mut store, &ImportLayout::default(), "S", &rows).unwrap();

        assert_eq!((report.routes, report.pitches), (1, 2));
        let pitches = store.pitches_of(1);
        assert_eq!(pitches.len(), 2);
        assert_eq!(pitches[1].position, 2);
        assert_eq!(pitches[1].cotation.as_deref(), Some("6b"));
        assert_eq!(pitches[1].nb_bolts, Some(8));
    }

    #[test]
    fn rows_before_context_are_skipped() {
        let mut rows = headers();
        rows.push(r("", "", "", "1 - Orphan 6a", 0));
        rows.push(r("Buoux", "", "Styx", "L2: 6b", 0));
        let mut store = MemoryStore::new();

        let report = import_sheet(&mut store, &ImportLayout::default(), "S", &rows).unwrap();

        let reasons: Vec<_> = report.skipped.iter().map(|s| (s.row, s.reason)).collect();
        assert_eq!(
            reasons,
            [(3, SkipReason::MissingContext), (4, SkipReason::Unattributable)]
        );
        // crag and sector are created before the label is classified
        assert_eq!(store.crags.len(), 1);
        assert_eq!(store.sectors.len(), 1);
        assert!(store.routes.is_empty());
    }

    #[test]
    fn header_sentinel_and_blank_rows_are_ignored() {
        let mut rows = headers();
        rows.push(vec![]);
        rows.push(r("Buoux", "", "Styx", "N° VOIE", 0));
        rows.push(r("", "", "", "   ", 0));
        let mut store = MemoryStore::new();

        let report = import_sheet(&mut store, &ImportLayout::default(), "S", &rows).unwrap();

        assert_eq!(report, SheetReport::default());
        assert!(store.crags.is_empty());
    }

    #[test]
    fn first_convention_wins() {
        let mut rows = headers();
        rows.push(r("Buoux", "OUI", "Styx", "1 - A 5c", 0));
        rows.push(r("Buoux", "NON", "Styx", "2 - B 6a", 0));
        rows.push(r("Buoux", "NON", "Styx", "3 - C 6b", 0));
        let mut store = MemoryStore::new();

        let report = import_sheet(&mut store, &ImportLayout::default(), "S", &rows).unwrap();

        assert_eq!(store.crags.len(), 1);
        assert_eq!(store.crags[0].convention, Some(true));
        assert_eq!(report.convention_conflicts, ["Buoux"]);
    }

    #[test]
    fn cached_names_skip_store_lookups() {
        let mut rows = headers();
        for n in 1..=5 {
            rows.push(r("Buoux", "", "Styx", &format!("{n} - R{n}"), 0));
        }
        let mut store = MemoryStore::new();

        import_sheet(&mut store, &ImportLayout::default(), "S", &rows).unwrap();

        // one crag lookup and one sector lookup, then cache hits
        assert_eq!(store.lookups, 2);
        assert_eq!(store.routes.len(), 5);
    }
}
