//! User roles and the topo edit permission.

use std::fmt;

use serde::Serialize;

use super::{TopoError, TopoResult};
use crate::models::AppUser;

/// Role stored in `app_user.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Full access.
    Admin,
    /// Bolts and maintains routes; may edit the topo.
    RouteSetter,
    /// Files reports only.
    Contributor,
}

impl UserRole {
    /// Every role, most privileged first.
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::RouteSetter, UserRole::Contributor];

    /// Column value.
    pub fn as_db(self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::RouteSetter => "ROUTE_SETTER",
            UserRole::Contributor => "CONTRIBUTOR",
        }
    }

    /// Parse a column value; unknown codes are `None`.
    pub fn from_db(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_db() == code)
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::RouteSetter => "Ouvreur",
            UserRole::Contributor => "Contributeur",
        }
    }

    /// Whether the role may create crags, sectors, routes and edit pitches.
    pub fn can_edit_topo(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::RouteSetter)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl AppUser {
    /// Parsed [`AppUser::role`].
    pub fn user_role(&self) -> Option<UserRole> {
        UserRole::from_db(&self.role)
    }
}

/// `Ok` when `actor` exists and holds an editing role.
pub fn ensure_can_edit(actor: Option<&AppUser>, action: &str) -> TopoResult<()> {
    match actor.and_then(AppUser::user_role) {
        Some(role) if role.can_edit_topo() => Ok(()),
        _ => Err(TopoError::Forbidden(format!(
            "only route setters and admins can {action}"
        ))),
    }
}
