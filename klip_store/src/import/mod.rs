//! Spreadsheet import of the topo hierarchy (crag → sector → route → pitch).
//!
//! ## What this does
//! - Reads every sheet of a workbook except the ones the [`ImportLayout`] skips.
//! - Folds a [`CarryState`] over each sheet's data rows: site, convention and sector
//!   cells carry forward until replaced, and `L<n>` rows without a name add pitches to
//!   the previous route.
//! - Resolves crags by name and sectors by `(crag, name)` through per-sheet caches in
//!   front of the store, so one name yields one row per run.
//!
//! ## Destructive run
//! A real run first deletes every report, pitch, route, sector and crag, then rebuilds
//! from the workbook. It requires [`ImportOptions::wipe`], is refused when the
//! environment is `production` unless explicitly allowed, and runs inside a single
//! **`BEGIN IMMEDIATE`** transaction: any store error rolls the database back to its
//! previous contents.
//!
//! ## Dry-run
//! [`dry_run_import`] runs the same import against a [`MemoryStore`] and returns the
//! summary without opening the database.

mod carry;
mod label;
mod layout;
mod report;
mod resolve;
mod row;
mod sheet;
mod workbook;

use diesel::SqliteConnection;
use shared_utils::env::{EnvError, env_flag, optional_env_var};
use thiserror::Error;
use tracing::{info, warn};

pub use carry::{CarryState, RowTarget};
pub use label::{ParsedLabel, parse_label};
pub use layout::{
    ColumnLayout, ImportLayout, NormalizationReport, load_layout_path, load_layout_str,
    normalize_layout,
};
pub use report::{ImportSummary, SheetReport, SkipReason, SkippedRow};
pub use resolve::{CachePolicy, NameCache, Resolved};
pub use row::{ImportRow, parse_convention};
pub use sheet::import_sheet;
pub use workbook::{Cell, MemoryWorkbook, WorkbookSource, XlsxWorkbook};

use crate::db::{connection::connect_sqlite, migrate};
use crate::store::{ImportStore, MemoryStore, SqliteStore};

/// Environment variable naming the deployment environment.
pub const ENV_VAR: &str = "KLIP_ENV";
/// Environment flag that lets a destructive import run in production.
pub const ALLOW_DESTRUCTIVE_VAR: &str = "KLIP_ALLOW_DESTRUCTIVE_IMPORT";

/// Run-level refusals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// The caller did not acknowledge that existing data is deleted.
    #[error("import deletes all crags, sectors, routes, pitches and reports; pass --wipe to confirm")]
    WipeNotConfirmed,
    /// Production environment without the override flag.
    #[error("refusing destructive import in {environment} (set KLIP_ALLOW_DESTRUCTIVE_IMPORT=true to override)")]
    ProductionRefused {
        /// Value of `KLIP_ENV`.
        environment: String,
    },
}

/// Options for a workbook import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Caller confirmed the wipe of existing data.
    pub wipe: bool,
    /// Import into memory only.
    pub dry_run: bool,
    /// Deployment environment (`KLIP_ENV`).
    pub environment: Option<String>,
    /// Production override (`KLIP_ALLOW_DESTRUCTIVE_IMPORT`).
    pub allow_destructive: bool,
}

impl ImportOptions {
    /// Options with the environment fields read from the process environment.
    pub fn from_env(wipe: bool, dry_run: bool) -> Result<Self, EnvError> {
        Ok(Self {
            wipe,
            dry_run,
            environment: optional_env_var(ENV_VAR),
            allow_destructive: env_flag(ALLOW_DESTRUCTIVE_VAR)?,
        })
    }

    /// Refuse a destructive run that was not confirmed or targets production.
    pub fn check_destructive(&self) -> Result<(), ImportError> {
        if !self.wipe {
            return Err(ImportError::WipeNotConfirmed);
        }
        match self.environment.as_deref() {
            Some(env) if env.eq_ignore_ascii_case("production") => {
                if !self.allow_destructive {
                    return Err(ImportError::ProductionRefused {
                        environment: env.to_string(),
                    });
                }
                warn!(environment = env, "destructive import explicitly allowed");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Wipe `store`, import every non-skipped sheet of `workbook`, and count the result.
///
/// Performs no transaction handling; see [`run_import`].
pub fn import_workbook<S, W>(
    store: &mut S,
    workbook: &mut W,
    layout: &ImportLayout,
) -> anyhow::Result<ImportSummary>
where
    S: ImportStore + ?Sized,
    W: WorkbookSource + ?Sized,
{
    let names = workbook.sheet_names();
    info!(sheets = names.len(), "starting import");
    store.wipe()?;

    let mut summary = ImportSummary::default();
    for name in names {
        if layout.skips(&name) {
            info!(sheet = %name, "skipping sheet");
            summary.skipped_sheets.push(name);
            continue;
        }
        let rows = workbook.rows(&name)?;
        let report = import_sheet(store, layout, &name, &rows)?;
        summary.sheets.insert(name, report);
    }

    summary.totals = store.counts()?;
    info!(
        crags = summary.totals.crags,
        sectors = summary.totals.sectors,
        routes = summary.totals.routes,
        pitches = summary.totals.pitches,
        "import completed"
    );
    Ok(summary)
}

/// Import into a fresh [`MemoryStore`]; nothing is persisted.
pub fn dry_run_import<W: WorkbookSource + ?Sized>(
    workbook: &mut W,
    layout: &ImportLayout,
) -> anyhow::Result<ImportSummary> {
    let mut store = MemoryStore::new();
    let mut summary = import_workbook(&mut store, workbook, layout)?;
    summary.dry_run = true;
    Ok(summary)
}

/// Replace the topo tables with the workbook contents.
///
/// - `opt.dry_run` delegates to [`dry_run_import`] and leaves `conn` untouched.
/// - Otherwise [`ImportOptions::check_destructive`] must pass, and the wipe plus
///   rebuild runs in one immediate transaction.
pub fn run_import<W: WorkbookSource + ?Sized>(
    conn: &mut SqliteConnection,
    workbook: &mut W,
    layout: &ImportLayout,
    opt: &ImportOptions,
) -> anyhow::Result<ImportSummary> {
    if opt.dry_run {
        return dry_run_import(workbook, layout);
    }
    opt.check_destructive()?;

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut store = SqliteStore::new(conn);
        import_workbook(&mut store, workbook, layout)
    })
}

/// Migrate the database at `db_url` and run [`run_import`] against it.
///
/// The destructive guard runs first, so a refused import never creates or
/// migrates the target database.
pub fn import_into_url<W: WorkbookSource + ?Sized>(
    db_url: &str,
    workbook: &mut W,
    layout: &ImportLayout,
    opt: &ImportOptions,
) -> anyhow::Result<ImportSummary> {
    if opt.dry_run {
        return dry_run_import(workbook, layout);
    }
    opt.check_destructive()?;
    migrate::run_all(db_url)?;
    let mut conn = connect_sqlite(db_url)?;
    run_import(&mut conn, workbook, layout, opt)
}
