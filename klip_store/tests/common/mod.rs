#![allow(dead_code)]

use std::path::PathBuf;

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Integer, Text};
use klip_store::db::{connection, migrate};
use klip_store::import::{Cell, ImportLayout, ImportOptions, MemoryWorkbook, run_import};
use klip_store::models::AppUser;
use klip_store::schema::app_user;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Cnt {
    #[diesel(sql_type = BigInt)]
    cnt: i64,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

/// `PRAGMA foreign_key_check` reports no violations.
pub fn fk_check_empty(conn: &mut SqliteConnection) {
    let n: Cnt = sql_query("SELECT COUNT(*) AS cnt FROM pragma_foreign_key_check;")
        .get_result(conn)
        .unwrap();
    assert_eq!(n.cnt, 0, "foreign key violations");
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let n: Cnt = sql_query(format!("SELECT COUNT(*) AS cnt FROM {table};"))
        .get_result(conn)
        .unwrap();
    n.cnt
}

/// Data row in the default column layout.
pub fn row(site: &str, convention: &str, sector: &str, label: &str, bolts: i64) -> Vec<Cell> {
    vec![
        Cell::from(site),
        Cell::Empty,
        Cell::from(convention),
        Cell::from(sector),
        Cell::from(label),
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        Cell::Int(1),
        Cell::Int(bolts),
    ]
}

/// Title and column header rows that open every sheet.
pub fn sheet(data: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let mut rows = vec![
        vec![Cell::from("Projet de maintenance")],
        row("SITE", "CONVENTION", "SECTEUR", "VOIE", 0),
    ];
    rows.extend(data);
    rows
}

/// Two crags over two sheets, one multi-pitch route, one empty ignored sheet.
pub fn sample_workbook() -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet(
            "Buoux",
            sheet(vec![
                row("Buoux", "OUI", "Styx", "1 - Rose des sables 6a+", 12),
                row("", "", "", "2 - La nuit du lézard L1: 7a", 10),
                row("", "", "", "L2: 7b+", 9),
                row("", "", "Bout du Monde", "Les pas perdus 5c", 0),
            ]),
        )
        .with_sheet("Sheet2", vec![])
        .with_sheet(
            "Orpierre",
            sheet(vec![
                row("Orpierre", "NON", "Quiquillon", "1 - Ticket danse 6b", 8),
                row("", "", "", "3 - Cyclope 6c", 8),
            ]),
        )
}

pub fn wipe_opts() -> ImportOptions {
    ImportOptions {
        wipe: true,
        ..ImportOptions::default()
    }
}

/// Import [`sample_workbook`] into the database.
pub fn seed_sample(conn: &mut SqliteConnection) {
    run_import(
        conn,
        &mut sample_workbook(),
        &ImportLayout::default(),
        &wipe_opts(),
    )
    .expect("seed import");
}

pub fn insert_user(conn: &mut SqliteConnection, email: &str, role: &str) -> AppUser {
    diesel::insert_into(app_user::table)
        .values((
            app_user::email.eq(email),
            app_user::firstname.eq("Test"),
            app_user::lastname.eq("User"),
            app_user::role.eq(role),
        ))
        .returning(AppUser::as_returning())
        .get_result(conn)
        .expect("insert user")
}
