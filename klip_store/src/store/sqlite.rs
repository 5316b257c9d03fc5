//! insert / lookup statements for the import
use anyhow::Context;
use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};
use tracing::debug;

use super::{EntityCounts, ImportStore};
use crate::models::{NewCrag, NewPitch, NewRoute, NewSector};
use crate::schema::{crag, pitch, report, route, sector};

/// [`ImportStore`] over a borrowed diesel connection.
///
/// Does not open transactions itself; the caller decides the unit of work
/// (see [`crate::import::run_import`]).
pub struct SqliteStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteStore<'c> {
    /// Wrap a connection.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }
}

impl ImportStore for SqliteStore<'_> {
    fn wipe(&mut self) -> anyhow::Result<()> {
        // reverse dependency order, even though the FKs cascade
        let reports = diesel::delete(report::table).execute(self.conn)?;
        let pitches = diesel::delete(pitch::table).execute(self.conn)?;
        let routes = diesel::delete(route::table).execute(self.conn)?;
        let sectors = diesel::delete(sector::table).execute(self.conn)?;
        let crags = diesel::delete(crag::table).execute(self.conn)?;
        debug!(reports, pitches, routes, sectors, crags, "wiped topo tables");
        Ok(())
    }

    fn find_crag(&mut self, name: &str) -> anyhow::Result<Option<i32>> {
        let id = crag::table
            .filter(crag::name.eq(name))
            .order(crag::id)
            .select(crag::id)
            .first::<i32>(self.conn)
            .optional()?;
        Ok(id)
    }

    fn create_crag(&mut self, name: &str, convention: Option<bool>) -> anyhow::Result<i32> {
        let id = insert_into(crag::table)
            .values(&NewCrag { name, convention })
            .returning(crag::id)
            .get_result(self.conn)
            .with_context(|| format!("create crag {name:?}"))?;
        Ok(id)
    }

    fn find_sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<Option<i32>> {
        let id = sector::table
            .filter(sector::crag_id.eq(crag_id).and(sector::name.eq(name)))
            .order(sector::id)
            .select(sector::id)
            .first::<i32>(self.conn)
            .optional()?;
        Ok(id)
    }

    fn create_sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<i32> {
        let id = insert_into(sector::table)
            .values(&NewSector { crag_id, name })
            .returning(sector::id)
            .get_result(self.conn)
            .with_context(|| format!("create sector {name:?} in crag {crag_id}"))?;
        Ok(id)
    }

    fn create_route(
        &mut self,
        sector_id: i32,
        number: i32,
        name: Option<&str>,
    ) -> anyhow::Result<i32> {
        let row = NewRoute {
            sector_id,
            number,
            name,
            description: None,
            length: None,
        };
        let id = insert_into(route::table)
            .values(&row)
            .returning(route::id)
            .get_result(self.conn)
            .with_context(|| format!("create route {number} {name:?} in sector {sector_id}"))?;
        Ok(id)
    }

    fn create_pitch(
        &mut self,
        route_id: i32,
        cotation: Option<&str>,
        nb_bolts: Option<i32>,
    ) -> anyhow::Result<i32> {
        let last: Option<i32> = pitch::table
            .filter(pitch::route_id.eq(route_id))
            .select(diesel::dsl::max(pitch::position))
            .get_result(self.conn)?;
        let row = NewPitch {
            route_id,
            position: last.unwrap_or(0) + 1,
            cotation,
            length: None,
            nb_bolts,
        };
        let id = insert_into(pitch::table)
            .values(&row)
            .returning(pitch::id)
            .get_result(self.conn)
            .with_context(|| format!("create pitch on route {route_id}"))?;
        Ok(id)
    }

    fn counts(&mut self) -> anyhow::Result<EntityCounts> {
        Ok(EntityCounts {
            crags: crag::table.count().get_result(self.conn)?,
            sectors: sector::table.count().get_result(self.conn)?,
            routes: route::table.count().get_result(self.conn)?,
            pitches: pitch::table.count().get_result(self.conn)?,
        })
    }
}
