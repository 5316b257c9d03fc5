//! Topo data access: listings, detail views, search, role-gated edits and reports.
//!
//! Read functions return `Ok(None)` for missing ids; write functions report them as
//! [`TopoError::NotFound`]. Every function borrows a connection and leaves transaction
//! scope to the caller, except the multi-row writes which open their own.

pub mod queries;
pub mod reports;
pub mod roles;
mod validate;
pub mod write;

use thiserror::Error;

pub use queries::{
    CragDetail, CragWithStats, PitchDetail, PitchWithReports, ReportWithReporter, RouteDetail,
    RouteOverview, SearchResult, SectorWithRoutes, crag_detail, list_crags, pitch_detail,
    route_detail, search_routes,
};
pub use reports::{
    ReportInput, ReportUpdate, create_report, delete_report, get_or_create_user, get_report,
    get_user_by_email, split_name, update_report,
};
pub use roles::{UserRole, ensure_can_edit};
pub use write::{
    NewCragInput, NewPitchInput, NewRouteInput, PitchUpdate, create_crag, create_route,
    create_sector, update_pitch,
};

/// Errors from the topo data layer.
#[derive(Debug, Error)]
pub enum TopoError {
    /// Referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Table name.
        entity: &'static str,
        /// Requested id.
        id: i32,
    },
    /// Input failed validation.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Human-readable rule.
        reason: String,
    },
    /// The acting user may not perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Database failure.
    #[error(transparent)]
    Db(#[from] diesel::result::Error),
}

/// Result alias for this module.
pub type TopoResult<T> = Result<T, TopoError>;
