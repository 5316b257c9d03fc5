//! Carry-forward state of one sheet.
//!
//! Site, convention and sector cells are only filled on the first row of a block;
//! the following rows inherit them until a new value appears. Multi-pitch routes
//! span several rows, so the last created route is carried too.

use super::{
    label::ParsedLabel,
    row::{ImportRow, parse_convention},
};

/// Values inherited by the following rows of the same sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryState {
    /// Current crag name.
    pub site: Option<String>,
    /// Current access agreement flag.
    pub convention: Option<bool>,
    /// Current sector name.
    pub sector: Option<String>,
    /// Route that continuation rows attach to.
    pub route_id: Option<i32>,
}

impl CarryState {
    /// Fold one row's non-blank site/convention/sector cells into the state.
    ///
    /// A present but unrecognised convention marker resets the flag to `None`.
    pub fn absorb(self, row: &ImportRow) -> Self {
        Self {
            site: row.site.clone().or(self.site),
            convention: match &row.convention {
                Some(marker) => parse_convention(marker),
                None => self.convention,
            },
            sector: row.sector.clone().or(self.sector),
            route_id: self.route_id,
        }
    }

    /// Site and sector names, when both are known.
    pub fn context(&self) -> Option<(&str, &str)> {
        Some((self.site.as_deref()?, self.sector.as_deref()?))
    }

    /// Same state with a new current route.
    pub fn with_route(self, route_id: i32) -> Self {
        Self {
            route_id: Some(route_id),
            ..self
        }
    }
}

/// Where a labelled row's pitch goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTarget {
    /// Another pitch of the current route.
    Continuation(i32),
    /// A new route; the row is its first pitch.
    NewRoute {
        /// Topo number.
        number: i32,
        /// Route name.
        name: String,
    },
    /// Neither a name nor a route to continue.
    Unattributable,
}

impl RowTarget {
    /// Decide the target of a parsed label given the current route.
    ///
    /// A pitch marker (`L2`, non-zero) without a name continues the current route;
    /// any name opens a new route.
    pub fn classify(label: &ParsedLabel, current_route: Option<i32>) -> Self {
        let continues = label.pitch_number.is_some_and(|n| n > 0) && label.name.is_none();
        match (continues, current_route, &label.name) {
            (true, Some(route_id), _) => RowTarget::Continuation(route_id),
            (_, _, Some(name)) => RowTarget::NewRoute {
                number: label.number,
                name: name.clone(),
            },
            _ => RowTarget::Unattributable,
        }
    }
}
