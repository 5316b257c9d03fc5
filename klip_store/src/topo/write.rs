//! Role-gated topo edits.

use diesel::prelude::*;
use diesel::{SqliteConnection, dsl::exists, insert_into, select};
use tracing::info;

use super::{
    TopoError, TopoResult,
    roles::ensure_can_edit,
    validate::{self, DESCRIPTION_MAX, NAME_MAX},
};
use crate::models::{AppUser, NewCrag, NewPitch, NewRoute, NewSector, Pitch};
use crate::schema::{crag, pitch, route, sector};

pub use crate::models::PitchChanges as PitchUpdate;

/// New crag.
#[derive(Debug, Clone, Default)]
pub struct NewCragInput {
    /// Name, trimmed before storage.
    pub name: String,
    /// Access agreement flag.
    pub convention: Option<bool>,
}

/// One pitch of a [`NewRouteInput`].
#[derive(Debug, Clone, Default)]
pub struct NewPitchInput {
    /// Grade, validated when present.
    pub cotation: Option<String>,
    /// Length in metres.
    pub length: Option<i32>,
}

/// New route with its pitches, in order.
#[derive(Debug, Clone, Default)]
pub struct NewRouteInput {
    /// Parent sector.
    pub sector_id: i32,
    /// Topo number, positive.
    pub number: i32,
    /// Name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// At least one pitch.
    pub pitches: Vec<NewPitchInput>,
}

/// Create a crag and return its id.
pub fn create_crag(
    conn: &mut SqliteConnection,
    actor: Option<&AppUser>,
    input: &NewCragInput,
) -> TopoResult<i32> {
    ensure_can_edit(actor, "create crags")?;
    let name = validate::required_name("name", &input.name)?;

    let id = insert_into(crag::table)
        .values(&NewCrag {
            name: &name,
            convention: input.convention,
        })
        .returning(crag::id)
        .get_result(conn)?;
    info!(crag_id = id, %name, "crag created");
    Ok(id)
}

/// Create a sector in an existing crag and return its id.
pub fn create_sector(
    conn: &mut SqliteConnection,
    actor: Option<&AppUser>,
    crag_id: i32,
    name: &str,
) -> TopoResult<i32> {
    ensure_can_edit(actor, "create sectors")?;
    let name = validate::required_name("name", name)?;
    if !select(exists(crag::table.find(crag_id))).get_result::<bool>(conn)? {
        return Err(TopoError::NotFound {
            entity: "crag",
            id: crag_id,
        });
    }

    let id = insert_into(sector::table)
        .values(&NewSector {
            crag_id,
            name: &name,
        })
        .returning(sector::id)
        .get_result(conn)?;
    info!(sector_id = id, crag_id, %name, "sector created");
    Ok(id)
}

/// Create a route and its pitches (positions 1..=n) in one transaction.
pub fn create_route(
    conn: &mut SqliteConnection,
    actor: Option<&AppUser>,
    input: &NewRouteInput,
) -> TopoResult<i32> {
    ensure_can_edit(actor, "create routes")?;
    validate::positive("number", Some(input.number))?;
    let name = validate::optional_text("name", input.name.as_deref(), NAME_MAX)?;
    let description =
        validate::optional_text("description", input.description.as_deref(), DESCRIPTION_MAX)?;
    if input.pitches.is_empty() {
        return Err(TopoError::Invalid {
            field: "pitches",
            reason: "at least one pitch is required".into(),
        });
    }
    for p in &input.pitches {
        validate::cotation(p.cotation.as_deref())?;
        validate::length("length", p.length)?;
    }

    conn.transaction::<_, TopoError, _>(|conn| {
        if !select(exists(sector::table.find(input.sector_id))).get_result::<bool>(conn)? {
            return Err(TopoError::NotFound {
                entity: "sector",
                id: input.sector_id,
            });
        }

        let route_id = insert_into(route::table)
            .values(&NewRoute {
                sector_id: input.sector_id,
                number: input.number,
                name: name.as_deref(),
                description: description.as_deref(),
                length: None,
            })
            .returning(route::id)
            .get_result(conn)?;

        for (p, position) in input.pitches.iter().zip(1..) {
            insert_into(pitch::table)
                .values(&NewPitch {
                    route_id,
                    position,
                    cotation: p.cotation.as_deref(),
                    length: p.length,
                    nb_bolts: None,
                })
                .execute(conn)?;
        }

        info!(route_id, sector_id = input.sector_id, pitches = input.pitches.len(), "route created");
        Ok(route_id)
    })
}

/// Apply a partial update to one pitch and return the stored row.
pub fn update_pitch(
    conn: &mut SqliteConnection,
    actor: Option<&AppUser>,
    pitch_id: i32,
    changes: &PitchUpdate,
) -> TopoResult<Pitch> {
    ensure_can_edit(actor, "edit pitches")?;
    if let Some(length) = changes.length {
        validate::length("length", length)?;
    }
    if let Some(cotation) = &changes.cotation {
        validate::cotation(cotation.as_deref())?;
    }

    let not_found = TopoError::NotFound {
        entity: "pitch",
        id: pitch_id,
    };
    let updated = if changes.is_empty() {
        pitch::table
            .find(pitch_id)
            .select(Pitch::as_select())
            .first(conn)
            .optional()?
    } else {
        diesel::update(pitch::table.find(pitch_id))
            .set(changes)
            .returning(Pitch::as_returning())
            .get_result(conn)
            .optional()?
    };
    updated.ok_or(not_found)
}
