use diesel::prelude::*;
use klip_store::import::{
    Cell, ImportError, ImportLayout, ImportOptions, MemoryWorkbook, WorkbookSource,
    dry_run_import, import_into_url, run_import,
};
use klip_store::models::{Crag, Pitch, Route};
use klip_store::schema::{crag, pitch, route};
use klip_store::topo::{ReportInput, ReportUpdate, create_report};

mod common;
use common::{count, row, sample_workbook, seed_sample, setup_db, sheet, wipe_opts};

/// Serves the wrapped sheets, then fails on the sheet named `broken`.
struct BrokenWorkbook {
    inner: MemoryWorkbook,
    broken: &'static str,
}

impl WorkbookSource for BrokenWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        let mut names = self.inner.sheet_names();
        names.push(self.broken.to_string());
        names
    }

    fn rows(&mut self, name: &str) -> anyhow::Result<Vec<Vec<Cell>>> {
        if name == self.broken {
            anyhow::bail!("sheet {name} is corrupt");
        }
        self.inner.rows(name)
    }
}

fn route_named(conn: &mut SqliteConnection, name: &str) -> Route {
    route::table
        .filter(route::name.eq(name))
        .select(Route::as_select())
        .first(conn)
        .unwrap()
}

fn pitches(conn: &mut SqliteConnection, route_id: i32) -> Vec<Pitch> {
    pitch::table
        .filter(pitch::route_id.eq(route_id))
        .order(pitch::position)
        .select(Pitch::as_select())
        .load(conn)
        .unwrap()
}

fn file_report(conn: &mut SqliteConnection) {
    let pitch_id = pitch::table.select(pitch::id).first::<i32>(conn).unwrap();
    create_report(
        conn,
        &ReportInput {
            pitch_ids: vec![pitch_id],
            user_email: "garde@buoux.fr".into(),
            user_name: Some("Anne Garde".into()),
            details: ReportUpdate {
                visual_check: Some(true),
                ..ReportUpdate::default()
            },
        },
    )
    .unwrap();
}

#[test]
fn workbook_builds_the_topo() {
    let (_db, mut conn) = setup_db();

    let summary = run_import(
        &mut conn,
        &mut sample_workbook(),
        &ImportLayout::default(),
        &wipe_opts(),
    )
    .unwrap();

    assert!(!summary.dry_run);
    assert_eq!(summary.skipped_sheets, ["Sheet2"]);
    assert_eq!(summary.sheets.keys().collect::<Vec<_>>(), ["Buoux", "Orpierre"]);
    assert_eq!(
        (summary.totals.crags, summary.totals.sectors, summary.totals.routes, summary.totals.pitches),
        (2, 3, 5, 6)
    );
    assert_eq!(count(&mut conn, "route"), 5);

    let crags: Vec<Crag> = crag::table
        .order(crag::name)
        .select(Crag::as_select())
        .load(&mut conn)
        .unwrap();
    let flags: Vec<_> = crags.iter().map(|c| (c.name.as_str(), c.convention)).collect();
    assert_eq!(flags, [("Buoux", Some(true)), ("Orpierre", Some(false))]);

    let rose = route_named(&mut conn, "Rose des sables");
    assert_eq!(rose.number, 1);
    let p = pitches(&mut conn, rose.id);
    assert_eq!(p.len(), 1);
    assert_eq!(p[0].cotation.as_deref(), Some("6a+"));
    assert_eq!(p[0].nb_bolts, Some(12));

    let unnumbered = route_named(&mut conn, "Les pas perdus");
    assert_eq!(unnumbered.number, 0);
    let p = pitches(&mut conn, unnumbered.id);
    assert_eq!(p[0].cotation.as_deref(), Some("5c"));
    assert_eq!(p[0].nb_bolts, None, "0 bolts is stored as unknown");

    common::fk_check_empty(&mut conn);
}

#[test]
fn pitch_rows_continue_the_previous_route() {
    let (_db, mut conn) = setup_db();
    seed_sample(&mut conn);

    let route = route_named(&mut conn, "La nuit du lézard");
    assert_eq!(route.number, 2);

    let p = pitches(&mut conn, route.id);
    let got: Vec<_> = p
        .iter()
        .map(|p| (p.position, p.cotation.as_deref(), p.nb_bolts))
        .collect();
    assert_eq!(got, [(1, Some("7a"), Some(10)), (2, Some("7b+"), Some(9))]);
}

#[test]
fn one_crag_per_name_across_sheets() {
    let (_db, mut conn) = setup_db();
    let mut wb = MemoryWorkbook::new()
        .with_sheet("Janvier", sheet(vec![row("Buoux", "OUI", "Styx", "1 - A 5c", 0)]))
        .with_sheet(
            "Février",
            sheet(vec![
                row("Buoux", "", "Styx", "2 - B 6a", 0),
                row("", "", "Autre", "3 - C 6b", 0),
            ]),
        );

    let summary = run_import(&mut conn, &mut wb, &ImportLayout::default(), &wipe_opts()).unwrap();

    assert_eq!((summary.totals.crags, summary.totals.sectors), (1, 2));
    assert_eq!(summary.totals.routes, 3);
    // the later sheet's blank convention does not overwrite the first
    let conv: Option<bool> = crag::table.select(crag::convention).first(&mut conn).unwrap();
    assert_eq!(conv, Some(true));
}

#[test]
fn skipped_rows_are_reported_not_fatal() {
    let (_db, mut conn) = setup_db();
    let mut wb = MemoryWorkbook::new().with_sheet(
        "Buoux",
        sheet(vec![
            row("", "", "", "1 - Sans secteur 6a", 0),
            row("Buoux", "", "Styx", "L2: 6b", 0),
            row("", "", "", "1 - Rose 6a", 0),
        ]),
    );

    let summary = run_import(&mut conn, &mut wb, &ImportLayout::default(), &wipe_opts()).unwrap();

    let rows: Vec<_> = summary.sheets["Buoux"].skipped.iter().map(|s| s.row).collect();
    assert_eq!(rows, [3, 4]);
    assert_eq!(count(&mut conn, "route"), 1);
}

#[test]
fn import_replaces_existing_data_and_reports() {
    let (_db, mut conn) = setup_db();
    seed_sample(&mut conn);
    file_report(&mut conn);
    assert_eq!(count(&mut conn, "report"), 1);

    let mut wb = MemoryWorkbook::new()
        .with_sheet("Céüse", sheet(vec![row("Céüse", "", "Biographie", "1 - Realization 9a+", 0)]));
    let summary = run_import(&mut conn, &mut wb, &ImportLayout::default(), &wipe_opts()).unwrap();

    assert_eq!(summary.totals.crags, 1);
    assert_eq!(count(&mut conn, "report"), 0);
    assert_eq!(count(&mut conn, "route"), 1);
    // reporters survive a topo wipe
    assert_eq!(count(&mut conn, "app_user"), 1);
    let r = route::table.select(Route::as_select()).first(&mut conn).unwrap();
    assert_eq!(r.name.as_deref(), Some("Realization"));
    assert_eq!(pitches(&mut conn, r.id)[0].cotation.as_deref(), Some("9a+"));
}

#[test]
fn failed_import_rolls_back_everything() {
    let (_db, mut conn) = setup_db();
    seed_sample(&mut conn);
    file_report(&mut conn);

    let mut wb = BrokenWorkbook {
        inner: MemoryWorkbook::new()
            .with_sheet("Céüse", sheet(vec![row("Céüse", "", "Biographie", "1 - Bio 8a", 0)])),
        broken: "Annexe",
    };
    let err = run_import(&mut conn, &mut wb, &ImportLayout::default(), &wipe_opts()).unwrap_err();
    assert!(err.to_string().contains("corrupt"), "{err}");

    assert_eq!(count(&mut conn, "crag"), 2);
    assert_eq!(count(&mut conn, "route"), 5);
    assert_eq!(count(&mut conn, "report"), 1);
    let names: Vec<String> = crag::table.order(crag::name).select(crag::name).load(&mut conn).unwrap();
    assert_eq!(names, ["Buoux", "Orpierre"]);
}

#[test]
fn unconfirmed_or_production_runs_change_nothing() {
    let (_db, mut conn) = setup_db();
    seed_sample(&mut conn);

    let err = run_import(
        &mut conn,
        &mut MemoryWorkbook::new(),
        &ImportLayout::default(),
        &ImportOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.downcast_ref::<ImportError>(), Some(&ImportError::WipeNotConfirmed));

    let prod = ImportOptions {
        environment: Some("production".into()),
        ..wipe_opts()
    };
    let err = run_import(&mut conn, &mut MemoryWorkbook::new(), &ImportLayout::default(), &prod)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ImportError>(),
        Some(ImportError::ProductionRefused { .. })
    ));

    assert_eq!(count(&mut conn, "crag"), 2);
    assert_eq!(count(&mut conn, "pitch"), 6);
}

#[test]
fn refused_import_never_creates_the_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("fresh.db");
    let url = path.to_string_lossy().to_string();

    let err = import_into_url(
        &url,
        &mut sample_workbook(),
        &ImportLayout::default(),
        &ImportOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.downcast_ref::<ImportError>(), Some(&ImportError::WipeNotConfirmed));
    assert!(!path.exists());

    let summary =
        import_into_url(&url, &mut sample_workbook(), &ImportLayout::default(), &wipe_opts())
            .unwrap();
    assert_eq!(summary.totals.routes, 5);
    assert!(path.exists());
}

#[test]
fn dry_run_leaves_the_database_alone() {
    let (_db, mut conn) = setup_db();
    seed_sample(&mut conn);

    let mut wb = MemoryWorkbook::new()
        .with_sheet("Céüse", sheet(vec![row("Céüse", "", "Biographie", "1 - Bio 8a", 0)]));
    let opt = ImportOptions {
        dry_run: true,
        ..ImportOptions::default()
    };
    let summary = run_import(&mut conn, &mut wb, &ImportLayout::default(), &opt).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.totals.crags, 1);
    assert_eq!(count(&mut conn, "crag"), 2);
    assert_eq!(count(&mut conn, "route"), 5);
}

#[test]
fn dry_run_predicts_the_real_run() {
    let (_db, mut conn) = setup_db();
    let layout = ImportLayout::default();

    let predicted = dry_run_import(&mut sample_workbook(), &layout).unwrap();
    let actual = run_import(&mut conn, &mut sample_workbook(), &layout, &wipe_opts()).unwrap();

    assert_eq!(predicted.sheets, actual.sheets);
    assert_eq!(predicted.totals, actual.totals);
}

#[test]
fn summary_serializes_for_the_cli() {
    let (_db, mut conn) = setup_db();
    let summary = run_import(
        &mut conn,
        &mut sample_workbook(),
        &ImportLayout::default(),
        &wipe_opts(),
    )
    .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        json["totals"],
        serde_json::json!({ "crags": 2, "sectors": 3, "routes": 5, "pitches": 6 })
    );
    assert_eq!(json["sheets"]["Buoux"]["routes"], 3);
    assert_eq!(json["sheets"]["Buoux"]["pitches"], 4);
    assert_eq!(json["skipped_sheets"], serde_json::json!(["Sheet2"]));
}
