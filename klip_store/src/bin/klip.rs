use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use diesel::SqliteConnection;
use klip_grades::{compare_grades, is_valid_cotation, max_cotation};
use klip_store::{
    db::{connection::connect_sqlite, migrate},
    import::{
        ImportLayout, ImportOptions, XlsxWorkbook, dry_run_import, import_into_url, load_layout_path,
    },
    topo,
};
use serde::Serialize;
use shared_utils::env::get_env_var;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Klip climbing-site maintenance CLI")]
struct Cli {
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending schema migrations.
    Migrate,
    /// Replace the topo with the contents of a workbook.
    Import(ImportCmd),
    /// List crags.
    Crags,
    /// Show one crag with its sectors and routes.
    Crag { id: i32 },
    /// Show one route with its pitches and reports.
    Route { id: i32 },
    /// Show one pitch with its route and location.
    Pitch { id: i32 },
    /// Search routes by route, sector or crag name.
    Search { query: String },
    /// Grade utilities.
    Grade(GradeCmd),
}

#[derive(Args)]
struct ImportCmd {
    #[arg(long, value_name = "FILE")]
    file: String,
    /// Confirm that every crag, sector, route, pitch and report is deleted first.
    #[arg(long)]
    wipe: bool,
    /// Import into memory and print the summary only.
    #[arg(long)]
    dry_run: bool,
    #[arg(long, value_name = "FILE")]
    layout: Option<String>,
}

#[derive(Args)]
struct GradeCmd {
    #[command(subcommand)]
    sub: GradeSub,
}

#[derive(Subcommand)]
enum GradeSub {
    /// Hardest of the given grades.
    Max { grades: Vec<String> },
    /// Sort grades easiest first; unparseable ones come first.
    Sort { grades: Vec<String> },
    /// Exit non-zero unless the grade is a valid cotation.
    Check { grade: String },
}

fn open_db() -> Result<SqliteConnection> {
    let db_url = get_env_var("DATABASE_URL")?;
    connect_sqlite(&db_url)
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "?",
    }
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.cmd {
        Cmd::Migrate => {
            let db_url = get_env_var("DATABASE_URL")?;
            let applied = migrate::run_all(&db_url)?;
            info!(applied, "migrations applied");
        }
        Cmd::Import(ImportCmd {
            file,
            wipe,
            dry_run,
            layout,
        }) => {
            let layout = match layout {
                Some(path) => load_layout_path(&path)?,
                None => ImportLayout::default(),
            };
            let mut workbook = XlsxWorkbook::open(&file)?;
            info!(%file, "reading workbook");

            let summary = if dry_run {
                dry_run_import(&mut workbook, &layout)?
            } else {
                let opt = ImportOptions::from_env(wipe, dry_run)?;
                let db_url = get_env_var("DATABASE_URL")?;
                import_into_url(&db_url, &mut workbook, &layout, &opt)
                    .with_context(|| format!("import of {file} failed, nothing was changed"))?
            };
            emit(json, &summary, |s| s.to_string())?;
        }
        Cmd::Crags => {
            let crags = topo::list_crags(&mut open_db()?)?;
            emit(json, &crags, |crags| {
                crags
                    .iter()
                    .map(|c| {
                        format!(
                            "{:>5}  {}  (convention: {}, {} sectors, {} routes)",
                            c.id,
                            c.name,
                            yes_no(c.convention),
                            c.sector_count,
                            c.route_count
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Cmd::Crag { id } => {
            let Some(detail) = topo::crag_detail(&mut open_db()?, id)? else {
                bail!("crag {id} not found");
            };
            emit(json, &detail, |d| {
                let mut out = format!("{} (convention: {})", d.crag.name, yes_no(d.crag.convention));
                for s in &d.sectors {
                    out.push_str(&format!("\n  {}", s.sector.name));
                    for r in &s.routes {
                        out.push_str(&format!(
                            "\n    [{}] {}. {}  {}  {}",
                            r.route.id,
                            r.route.number,
                            r.display_name,
                            r.summary.cotation_label(),
                            r.summary.length_label()
                        ));
                    }
                }
                out
            })?;
        }
        Cmd::Route { id } => {
            let Some(detail) = topo::route_detail(&mut open_db()?, id)? else {
                bail!("route {id} not found");
            };
            emit(json, &detail, |d| {
                let mut out = format!(
                    "{}. {}  ({} › {})  {}  {}",
                    d.route.number,
                    d.display_name,
                    d.crag.name,
                    d.sector.name,
                    d.summary.cotation_label(),
                    d.summary.length_label()
                );
                for p in &d.pitches {
                    out.push_str(&format!(
                        "\n  L{}  {}  bolts: {}",
                        p.pitch.position,
                        p.pitch.cotation.as_deref().unwrap_or("?"),
                        p.pitch.nb_bolts.map_or("?".to_string(), |n| n.to_string())
                    ));
                    for r in &p.reports {
                        let when = match r.report.created_at_utc() {
                            Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
                            None => r.report.created_at.clone(),
                        };
                        out.push_str(&format!(
                            "\n    {when}  {} {}: {}",
                            r.reporter.firstname,
                            r.reporter.lastname,
                            r.report.comment.as_deref().unwrap_or("")
                        ));
                    }
                }
                out
            })?;
        }
        Cmd::Pitch { id } => {
            let Some(detail) = topo::pitch_detail(&mut open_db()?, id)? else {
                bail!("pitch {id} not found");
            };
            emit(json, &detail, |d| {
                format!(
                    "L{} of {}  ({} › {})  {}  {}",
                    d.pitch.position,
                    d.route_name,
                    d.crag.name,
                    d.sector.name,
                    d.pitch.cotation.as_deref().unwrap_or("?"),
                    d.pitch.length.map_or("?m".to_string(), |n| format!("{n}m"))
                )
            })?;
        }
        Cmd::Search { query } => {
            let hits = topo::search_routes(&mut open_db()?, &query)?;
            emit(json, &hits, |hits| {
                hits.iter()
                    .map(|h| format!("{:>5}  {}  ({})", h.id, h.name, h.context))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Cmd::Grade(GradeCmd { sub }) => match sub {
            GradeSub::Max { grades } => {
                let max = max_cotation(grades.iter().map(String::as_str));
                emit(json, &max, |m| m.as_deref().unwrap_or("?").to_string())?;
            }
            GradeSub::Sort { mut grades } => {
                grades.sort_by(|a, b| compare_grades(a, b));
                emit(json, &grades, |g| g.join("\n"))?;
            }
            GradeSub::Check { grade } => {
                if !is_valid_cotation(&grade) {
                    bail!("invalid cotation: {grade:?}");
                }
                emit(json, &grade, |g| format!("{g}: valid"))?;
            }
        },
    }

    Ok(())
}
