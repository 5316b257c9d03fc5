use super::{EntityCounts, ImportStore};

/// A crag held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemCrag {
    /// Assigned id (1-based, insertion order).
    pub id: i32,
    /// Site name.
    pub name: String,
    /// Access agreement flag.
    pub convention: Option<bool>,
}

/// A sector held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemSector {
    /// Assigned id.
    pub id: i32,
    /// Parent crag.
    pub crag_id: i32,
    /// Sector name.
    pub name: String,
}

/// A route held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemRoute {
    /// Assigned id.
    pub id: i32,
    /// Parent sector.
    pub sector_id: i32,
    /// Topo number.
    pub number: i32,
    /// Route name.
    pub name: Option<String>,
}

/// A pitch held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemPitch {
    /// Assigned id.
    pub id: i32,
    /// Parent route.
    pub route_id: i32,
    /// 1-based order within the route.
    pub position: i32,
    /// Grade string.
    pub cotation: Option<String>,
    /// Number of bolts.
    pub nb_bolts: Option<i32>,
}

/// In-memory [`ImportStore`]. Ids are 1-based positions in each vector.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    /// Stored crags.
    pub crags: Vec<MemCrag>,
    /// Stored sectors.
    pub sectors: Vec<MemSector>,
    /// Stored routes.
    pub routes: Vec<MemRoute>,
    /// Stored pitches.
    pub pitches: Vec<MemPitch>,
    /// Number of `find_*` calls served, for cache-policy assertions.
    pub lookups: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pitches of one route in position order.
    pub fn pitches_of(&self, route_id: i32) -> Vec<&MemPitch> {
        let mut out: Vec<&MemPitch> = self
            .pitches
            .iter()
            .filter(|p| p.route_id == route_id)
            .collect();
        out.sort_by_key(|p| p.position);
        out
    }
}

fn next_id(len: usize) -> anyhow::Result<i32> {
    Ok(i32::try_from(len)? + 1)
}

impl ImportStore for MemoryStore {
    fn wipe(&mut self) -> anyhow::Result<()> {
        self.pitches.clear();
        self.routes.clear();
        self.sectors.clear();
        self.crags.clear();
        Ok(())
    }

    fn find_crag(&mut self, name: &str) -> anyhow::Result<Option<i32>> {
        self.lookups += 1;
        Ok(self.crags.iter().find(|c| c.name == name).map(|c| c.id))
    }

    fn create_crag(&mut self, name: &str, convention: Option<bool>) -> anyhow::Result<i32> {
        let id = next_id(self.crags.len())?;
        self.crags.push(MemCrag {
            id,
            name: name.to_string(),
            convention,
        });
        Ok(id)
    }

    fn find_sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<Option<i32>> {
        self.lookups += 1;
        Ok(self
            .sectors
            .iter()
            .find(|s| s.crag_id == crag_id && s.name == name)
            .map(|s| s.id))
    }

    fn create_sector(&mut self, crag_id: i32, name: &str) -> anyhow::Result<i32> {
        if !self.crags.iter().any(|c| c.id == crag_id) {
            anyhow::bail!("crag {crag_id} does not exist");
        }
        let id = next_id(self.sectors.len())?;
        self.sectors.push(MemSector {
            id,
            crag_id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn create_route(
        &mut self,
        sector_id: i32,
        number: i32,
        name: Option<&str>,
    ) -> anyhow::Result<i32> {
        if !self.sectors.iter().any(|s| s.id == sector_id) {
            anyhow::bail!("sector {sector_id} does not exist");
        }
        let id = next_id(self.routes.len())?;
        self.routes.push(MemRoute {
            id,
            sector_id,
            number,
            name: name.map(str::to_string),
        });
        Ok(id)
    }

    fn create_pitch(
        &mut self,
        route_id: i32,
        cotation: Option<&str>,
        nb_bolts: Option<i32>,
    ) -> anyhow::Result<i32> {
        if !self.routes.iter().any(|r| r.id == route_id) {
            anyhow::bail!("route {route_id} does not exist");
        }
        let position = self
            .pitches
            .iter()
            .filter(|p| p.route_id == route_id)
            .map(|p| p.position)
            .max()
            .unwrap_or(0)
            + 1;
        let id = next_id(self.pitches.len())?;
        self.pitches.push(MemPitch {
            id,
            route_id,
            position,
            cotation: cotation.map(str::to_string),
            nb_bolts,
        });
        Ok(id)
    }

    fn counts(&mut self) -> anyhow::Result<EntityCounts> {
        Ok(EntityCounts {
            crags: i64::try_from(self.crags.len())?,
            sectors: i64::try_from(self.sectors.len())?,
            routes: i64::try_from(self.routes.len())?,
            pitches: i64::try_from(self.pitches.len())?,
        })
    }
}
