//! Team roles and the permission table guarding project routes.

use serde::{Deserialize, Serialize};

use crate::database::models::TeamMembership;
use crate::error::ApiError;
use crate::middleware::Session;

/// Role a user holds within a team. Ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Owner,
}

impl Role {
    pub fn level(&self) -> i32 {
        match self {
            Role::Member => 30,
            Role::Owner => 50,
        }
    }

    /// Maps a stored role level back to a role. Unknown levels above owner
    /// are treated as owner, anything lower as member.
    pub fn from_level(level: i32) -> Self {
        if level >= Role::Owner.level() {
            Role::Owner
        } else {
            Role::Member
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ProjectCreate,
    ProjectEdit,
    ProjectDelete,
    ProjectChangeStatus,
    ProjectAuditLog,
}

impl Permission {
    pub fn scope(&self) -> &'static str {
        match self {
            Permission::ProjectCreate => "project:create",
            Permission::ProjectEdit => "project:edit",
            Permission::ProjectDelete => "project:delete",
            Permission::ProjectChangeStatus => "project:change-status",
            Permission::ProjectAuditLog => "project:audit-log",
        }
    }

    pub fn minimum_role(&self) -> Role {
        match self {
            Permission::ProjectCreate
            | Permission::ProjectEdit
            | Permission::ProjectDelete
            | Permission::ProjectChangeStatus => Role::Owner,
            Permission::ProjectAuditLog => Role::Member,
        }
    }
}

/// Checks `permission` for the current session. Admins pass everything;
/// project tokens never carry team permissions.
pub fn needs_permission(
    session: &Session,
    membership: Option<&TeamMembership>,
    permission: Permission,
) -> Result<(), ApiError> {
    let user = match session {
        Session::User(user) => user,
        Session::Project { .. } => {
            return Err(ApiError::unauthorized("Project tokens cannot perform this action"))
        }
    };

    if user.admin {
        return Ok(());
    }

    match membership {
        Some(m) if m.role() >= permission.minimum_role() => Ok(()),
        _ => {
            tracing::debug!("User {} lacks {}", user.username, permission.scope());
            Err(ApiError::forbidden("unauthorized"))
        }
    }
}

/// Platform-wide operations (templates, stacks) are reserved for admins
pub fn needs_admin(session: &Session) -> Result<(), ApiError> {
    match session {
        Session::User(user) if user.admin => Ok(()),
        Session::User(_) => Err(ApiError::forbidden("unauthorized")),
        Session::Project { .. } => Err(ApiError::unauthorized("Project tokens cannot perform this action")),
    }
}
