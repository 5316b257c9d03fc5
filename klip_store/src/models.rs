//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`] for use with Diesel's Queryable/Insertable APIs:
//! - [`crate::schema::crag`] → [`crate::schema::sector`] → [`crate::schema::route`] →
//!   [`crate::schema::pitch`]: the topo hierarchy, each level `ON DELETE CASCADE`
//! - [`crate::schema::app_user`]: reporters, with a role column
//! - [`crate::schema::report`]: maintenance reports filed against one pitch
//!
//! Timestamps are RFC3339 UTC strings filled by column defaults.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use klip_grades::{HasCotation, PitchMetrics};
use serde::Serialize;

use crate::schema::*;

/// A row in [`crate::schema::crag`]: a named climbing site.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = crag, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Crag {
    /// Database primary key.
    pub id: i32,
    /// Site name (e.g., "Buoux"). Not unique at the schema level.
    pub name: String,
    /// Whether an access agreement exists; `None` when unknown.
    pub convention: Option<bool>,
    /// Row creation timestamp in RFC3339 UTC.
    pub created_at: String,
}

/// Insertable form of [`Crag`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crag)]
pub struct NewCrag<'a> {
    /// Site name.
    pub name: &'a str,
    /// Access agreement flag.
    pub convention: Option<bool>,
}

/// A row in [`crate::schema::sector`]: a sub-area of one crag.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize)]
#[diesel(table_name = sector, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Crag, foreign_key = crag_id))]
pub struct Sector {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Crag::id`].
    pub crag_id: i32,
    /// Sector name, unique per crag by convention only.
    pub name: String,
    /// Row creation timestamp in RFC3339 UTC.
    pub created_at: String,
}

/// Insertable form of [`Sector`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sector)]
pub struct NewSector<'a> {
    /// FK to [`Crag::id`].
    pub crag_id: i32,
    /// Sector name.
    pub name: &'a str,
}

/// A row in [`crate::schema::route`]: a numbered and/or named line in a sector.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize)]
#[diesel(table_name = route, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Sector, foreign_key = sector_id))]
pub struct Route {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Sector::id`].
    pub sector_id: i32,
    /// Topo number; `0` when the source gave none.
    pub number: i32,
    /// Route name, if any.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Explicit total length in metres; overrides the pitch sum when set.
    pub length: Option<i32>,
    /// Row creation timestamp in RFC3339 UTC.
    pub created_at: String,
}

impl Route {
    /// Display name: the route name or `"Voie {number}"`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Voie {}", self.number))
    }
}

/// Insertable form of [`Route`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = route)]
pub struct NewRoute<'a> {
    /// FK to [`Sector::id`].
    pub sector_id: i32,
    /// Topo number.
    pub number: i32,
    /// Route name.
    pub name: Option<&'a str>,
    /// Free-text description.
    pub description: Option<&'a str>,
    /// Explicit total length in metres.
    pub length: Option<i32>,
}

/// A row in [`crate::schema::pitch`]: one rope length of a route.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize)]
#[diesel(table_name = pitch, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Route, foreign_key = route_id))]
pub struct Pitch {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Route::id`].
    pub route_id: i32,
    /// 1-based order within the route.
    pub position: i32,
    /// Grade string as stored (lowercase when imported).
    pub cotation: Option<String>,
    /// Length in metres.
    pub length: Option<i32>,
    /// Number of bolts.
    pub nb_bolts: Option<i32>,
    /// Free-text description.
    pub description: Option<String>,
}

impl HasCotation for Pitch {
    fn cotation(&self) -> Option<&str> {
        self.cotation.as_deref()
    }
}

impl PitchMetrics for Pitch {
    fn length(&self) -> Option<i32> {
        self.length
    }
}

/// Insertable form of [`Pitch`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pitch)]
pub struct NewPitch<'a> {
    /// FK to [`Route::id`].
    pub route_id: i32,
    /// 1-based order within the route.
    pub position: i32,
    /// Grade string.
    pub cotation: Option<&'a str>,
    /// Length in metres.
    pub length: Option<i32>,
    /// Number of bolts.
    pub nb_bolts: Option<i32>,
}

/// Partial pitch update. Outer `None` leaves a column alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = pitch)]
pub struct PitchChanges {
    /// New length.
    pub length: Option<Option<i32>>,
    /// New cotation.
    pub cotation: Option<Option<String>>,
}

impl PitchChanges {
    /// `true` when no column would change.
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.cotation.is_none()
    }
}

/// A row in [`crate::schema::app_user`].
///
/// `role` is one of `"ADMIN"`, `"ROUTE_SETTER"`, `"CONTRIBUTOR"`; see
/// [`crate::topo::roles::UserRole`].
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = app_user, check_for_backend(diesel::sqlite::Sqlite))]
pub struct AppUser {
    /// Database primary key.
    pub id: i32,
    /// Login e-mail, unique.
    pub email: String,
    /// First name, possibly empty.
    pub firstname: String,
    /// Last name, possibly empty.
    pub lastname: String,
    /// Role code.
    pub role: String,
}

/// Insertable form of [`AppUser`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_user)]
pub struct NewAppUser<'a> {
    /// Login e-mail.
    pub email: &'a str,
    /// First name.
    pub firstname: &'a str,
    /// Last name.
    pub lastname: &'a str,
    /// Role code.
    pub role: &'a str,
}

/// A row in [`crate::schema::report`]: one maintenance visit on one pitch.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize)]
#[diesel(table_name = report, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Pitch, foreign_key = pitch_id))]
#[diesel(belongs_to(AppUser, foreign_key = reporter_id))]
pub struct Report {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Pitch::id`].
    pub pitch_id: i32,
    /// FK to [`AppUser::id`].
    pub reporter_id: i32,
    /// Creation timestamp in RFC3339 UTC.
    pub created_at: String,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Visual inspection done.
    pub visual_check: Option<bool>,
    /// Anchor inspection done.
    pub anchor_check: Option<bool>,
    /// Cleaning done.
    pub cleaning_done: Option<bool>,
    /// Loose rock removed.
    pub trundle_done: Option<bool>,
    /// Full rebolting done.
    pub total_rebolting_done: Option<bool>,
}

impl Report {
    /// [`Report::created_at`] parsed; `None` for rows written outside the schema default.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Insertable form of [`Report`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = report)]
pub struct NewReport<'a> {
    /// FK to [`Pitch::id`].
    pub pitch_id: i32,
    /// FK to [`AppUser::id`].
    pub reporter_id: i32,
    /// Free-text comment.
    pub comment: Option<&'a str>,
    /// Visual inspection done.
    pub visual_check: Option<bool>,
    /// Anchor inspection done.
    pub anchor_check: Option<bool>,
    /// Cleaning done.
    pub cleaning_done: Option<bool>,
    /// Loose rock removed.
    pub trundle_done: Option<bool>,
    /// Full rebolting done.
    pub total_rebolting_done: Option<bool>,
}

/// Full replacement of a report's editable columns; `None` writes NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = report, treat_none_as_null = true)]
pub struct ReportChanges<'a> {
    /// Free-text comment.
    pub comment: Option<&'a str>,
    /// Visual inspection done.
    pub visual_check: Option<bool>,
    /// Anchor inspection done.
    pub anchor_check: Option<bool>,
    /// Cleaning done.
    pub cleaning_done: Option<bool>,
    /// Loose rock removed.
    pub trundle_done: Option<bool>,
    /// Full rebolting done.
    pub total_rebolting_done: Option<bool>,
}
