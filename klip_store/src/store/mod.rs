//! Persistence surface used by the spreadsheet importer.
//!
//! [`ImportStore`] is the portable surface; [`SqliteStore`] writes through diesel and
//! [`MemoryStore`] keeps everything in vectors (dry runs and tests).

mod memory;
mod sqlite;

use std::fmt;

use serde::Serialize;

pub use memory::{MemCrag, MemPitch, MemRoute, MemSector, MemoryStore};
pub use sqlite::SqliteStore;

/// Row counts of the topo tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    /// Rows in `crag`.
    pub crags: i64,
    /// Rows in `sector`.
    pub sectors: i64,
    /// Rows in `route`.
    pub routes: i64,
    /// Rows in `pitch`.
    pub pitches: i64,
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crags: {}", self.crags)?;
        writeln!(f, "Sectors: {}", self.sectors)?;
        writeln!(f, "Routes: {}", self.routes)?;
        write!(f, "Pitches: {}", self.pitches)
    }
}

/// Create/lookup operations the importer needs. Every call is synchronous and the
/// importer awaits each one before reading the next row.
pub trait ImportStore {
    /// Delete every report, pitch, route, sector and crag, children first.
    fn wipe(&mut self) -> anyhow::Result<()>;

    /// First crag with exactly this name.
    fn find_crag(&mut self, name: &str) -> anyhow::Result<Option<i32>>;

    /// Insert a crag and return its id.
    fn create_crag(&mut self, name: &str, convention: Option<bool>) -> anyhow::Result<i32>;

    /// First sector of `crag_id` with exactly this name.
    fn find_sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<Option<i32>>;

    /// Insert a sector and return its id.
    fn create_sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<i32>;

    /// Insert a route and return its id.
    fn create_route(
        &mut self,
        sector_id: i32,
        number: i32,
        name: Option<&str>,
    ) -> anyhow::Result<i32>;

    /// Append a pitch after the existing pitches of `route_id` and return its id.
    fn create_pitch(
        &mut self,
        route_id: i32,
        cotation: Option<&str>,
        nb_bolts: Option<i32>,
    ) -> anyhow::Result<i32>;

    /// Current table sizes.
    fn counts(&mut self) -> anyhow::Result<EntityCounts>;
}
