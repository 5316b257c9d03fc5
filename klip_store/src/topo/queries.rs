//! Read side: crag listing, crag and route detail views, route search.

use std::collections::HashMap;

use diesel::SqliteConnection;
use diesel::dsl::{count, count_star};
use diesel::prelude::*;
use klip_grades::RouteSummary;
use serde::Serialize;

use super::TopoResult;
use crate::db::connection::unicode_lower;
use crate::models::{AppUser, Crag, Pitch, Report, Route, Sector};
use crate::schema::{app_user, crag, pitch, report, route, sector};

/// Search results are capped at this many routes.
pub const SEARCH_LIMIT: i64 = 20;

/// One line of the crag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CragWithStats {
    /// Crag id.
    pub id: i32,
    /// Crag name.
    pub name: String,
    /// Access agreement flag.
    pub convention: Option<bool>,
    /// Number of sectors.
    pub sector_count: i64,
    /// Number of routes across all sectors.
    pub route_count: i64,
}

/// A route with its pitches and derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOverview {
    /// Stored route.
    #[serde(flatten)]
    pub route: Route,
    /// Name or `"Voie {number}"`.
    pub display_name: String,
    /// Pitches in position order.
    pub pitches: Vec<Pitch>,
    /// Hardest grade, total length.
    pub summary: RouteSummary,
}

impl RouteOverview {
    fn new(route: Route, pitches: Vec<Pitch>) -> Self {
        Self {
            display_name: route.display_name(),
            summary: RouteSummary::of(route.length, &pitches),
            route,
            pitches,
        }
    }
}

/// A sector and its routes ordered by number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorWithRoutes {
    /// Stored sector.
    #[serde(flatten)]
    pub sector: Sector,
    /// Routes.
    pub routes: Vec<RouteOverview>,
}

/// A crag with sectors ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CragDetail {
    /// Stored crag.
    #[serde(flatten)]
    pub crag: Crag,
    /// Sectors.
    pub sectors: Vec<SectorWithRoutes>,
}

/// A maintenance report with its author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportWithReporter {
    /// Stored report.
    #[serde(flatten)]
    pub report: Report,
    /// Author.
    pub reporter: AppUser,
}

/// A pitch with its reports, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchWithReports {
    /// Stored pitch.
    #[serde(flatten)]
    pub pitch: Pitch,
    /// Reports.
    pub reports: Vec<ReportWithReporter>,
}

/// A route page: location, pitches and their reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDetail {
    /// Stored route.
    #[serde(flatten)]
    pub route: Route,
    /// Name or `"Voie {number}"`.
    pub display_name: String,
    /// Parent sector.
    pub sector: Sector,
    /// Parent crag.
    pub crag: Crag,
    /// Pitches in position order.
    pub pitches: Vec<PitchWithReports>,
    /// Hardest grade, total length.
    pub summary: RouteSummary,
}

/// One pitch with its route, location and the route's pitches, for the report form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchDetail {
    /// Stored pitch.
    #[serde(flatten)]
    pub pitch: Pitch,
    /// Parent route.
    pub route: Route,
    /// Route name or `"Voie {number}"`.
    pub route_name: String,
    /// Parent sector.
    pub sector: Sector,
    /// Parent crag.
    pub crag: Crag,
    /// Every pitch of the route in position order, this one included.
    pub route_pitches: Vec<Pitch>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Route id.
    pub id: i32,
    /// Name or `"Voie {number}"`.
    pub name: String,
    /// `"crag › sector"`.
    pub context: String,
}

/// All crags ordered by name, with sector and route counts.
pub fn list_crags(conn: &mut SqliteConnection) -> TopoResult<Vec<CragWithStats>> {
    let crags: Vec<Crag> = crag::table
        .order((crag::name.asc(), crag::id.asc()))
        .select(Crag::as_select())
        .load(conn)?;

    let sectors: HashMap<i32, i64> = sector::table
        .group_by(sector::crag_id)
        .select((sector::crag_id, count_star()))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();
    let routes: HashMap<i32, i64> = route::table
        .inner_join(sector::table)
        .group_by(sector::crag_id)
        .select((sector::crag_id, count(route::id)))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();

    Ok(crags
        .into_iter()
        .map(|c| CragWithStats {
            sector_count: sectors.get(&c.id).copied().unwrap_or(0),
            route_count: routes.get(&c.id).copied().unwrap_or(0),
            id: c.id,
            name: c.name,
            convention: c.convention,
        })
        .collect())
}

/// One crag with its sectors, routes and pitches; `None` when the id is unknown.
pub fn crag_detail(conn: &mut SqliteConnection, crag_id: i32) -> TopoResult<Option<CragDetail>> {
    let Some(crag) = crag::table
        .find(crag_id)
        .select(Crag::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let sectors: Vec<Sector> = Sector::belonging_to(&crag)
        .order((sector::name.asc(), sector::id.asc()))
        .select(Sector::as_select())
        .load(conn)?;
    let routes: Vec<Route> = Route::belonging_to(&sectors)
        .order((route::number.asc(), route::id.asc()))
        .select(Route::as_select())
        .load(conn)?;
    let pitches: Vec<Pitch> = Pitch::belonging_to(&routes)
        .order((pitch::position.asc(), pitch::id.asc()))
        .select(Pitch::as_select())
        .load(conn)?;

    let pitches_by_route = pitches.grouped_by(&routes);
    let mut by_sector: HashMap<i32, Vec<RouteOverview>> = HashMap::new();
    for (route, pitches) in routes.into_iter().zip(pitches_by_route) {
        by_sector
            .entry(route.sector_id)
            .or_default()
            .push(RouteOverview::new(route, pitches));
    }

    let sectors = sectors
        .into_iter()
        .map(|s| SectorWithRoutes {
            routes: by_sector.remove(&s.id).unwrap_or_default(),
            sector: s,
        })
        .collect();
    Ok(Some(CragDetail { crag, sectors }))
}

/// One route with location, pitches and reports; `None` when the id is unknown.
pub fn route_detail(conn: &mut SqliteConnection, route_id: i32) -> TopoResult<Option<RouteDetail>> {
    let Some((route, sector, crag)) = route::table
        .inner_join(sector::table.inner_join(crag::table))
        .filter(route::id.eq(route_id))
        .select((Route::as_select(), Sector::as_select(), Crag::as_select()))
        .first::<(Route, Sector, Crag)>(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let pitches: Vec<Pitch> = Pitch::belonging_to(&route)
        .order((pitch::position.asc(), pitch::id.asc()))
        .select(Pitch::as_select())
        .load(conn)?;
    let pitch_ids: Vec<i32> = pitches.iter().map(|p| p.id).collect();

    let mut reports: HashMap<i32, Vec<ReportWithReporter>> = HashMap::new();
    for (report, reporter) in report::table
        .inner_join(app_user::table)
        .filter(report::pitch_id.eq_any(&pitch_ids))
        .order((report::created_at.desc(), report::id.desc()))
        .select((Report::as_select(), AppUser::as_select()))
        .load::<(Report, AppUser)>(conn)?
    {
        reports
            .entry(report.pitch_id)
            .or_default()
            .push(ReportWithReporter { report, reporter });
    }

    let summary = RouteSummary::of(route.length, &pitches);
    let pitches = pitches
        .into_iter()
        .map(|p| PitchWithReports {
            reports: reports.remove(&p.id).unwrap_or_default(),
            pitch: p,
        })
        .collect();

    Ok(Some(RouteDetail {
        display_name: route.display_name(),
        route,
        sector,
        crag,
        pitches,
        summary,
    }))
}

/// One pitch with its route, sector, crag and sibling pitches; `None` when the id is unknown.
pub fn pitch_detail(conn: &mut SqliteConnection, pitch_id: i32) -> TopoResult<Option<PitchDetail>> {
    let Some((pitch, route, sector, crag)) = pitch::table
        .inner_join(route::table.inner_join(sector::table.inner_join(crag::table)))
        .filter(pitch::id.eq(pitch_id))
        .select((
            Pitch::as_select(),
            Route::as_select(),
            Sector::as_select(),
            Crag::as_select(),
        ))
        .first::<(Pitch, Route, Sector, Crag)>(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let route_pitches = Pitch::belonging_to(&route)
        .order((pitch::position.asc(), pitch::id.asc()))
        .select(Pitch::as_select())
        .load(conn)?;

    Ok(Some(PitchDetail {
        route_name: route.display_name(),
        pitch,
        route,
        sector,
        crag,
        route_pitches,
    }))
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Routes whose name, sector name or crag name contains `query`, ignoring case
/// (Unicode-aware, so `"évêque"` finds `"Évêque"`). Queries shorter than two
/// characters return nothing.
///
/// Needs a connection from [`connect_sqlite`](crate::db::connection::connect_sqlite).
pub fn search_routes(conn: &mut SqliteConnection, query: &str) -> TopoResult<Vec<SearchResult>> {
    if query.chars().count() < 2 {
        return Ok(Vec::new());
    }
    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

    let rows = route::table
        .inner_join(sector::table.inner_join(crag::table))
        .filter(
            unicode_lower(sector::name.nullable())
                .like(&pattern)
                .escape('\\')
                .or(unicode_lower(crag::name.nullable()).like(&pattern).escape('\\'))
                .or(unicode_lower(route::name).like(&pattern).escape('\\')),
        )
        .order((crag::name.asc(), sector::name.asc(), route::number.asc(), route::id.asc()))
        .limit(SEARCH_LIMIT)
        .select((route::id, route::number, route::name, sector::name, crag::name))
        .load::<(i32, i32, Option<String>, String, String)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(id, number, name, sector, crag)| SearchResult {
            id,
            name: name.unwrap_or_else(|| format!("Voie {number}")),
            context: format!("{crag} › {sector}"),
        })
        .collect())
}
