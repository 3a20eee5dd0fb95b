/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Run state recorded for a project. The container driver reports the live
/// state separately; this is what the control plane last asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectState {
    Running,
    Suspended,
}

impl ProjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::Running => "running",
            ProjectState::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(ProjectState::Running),
            "suspended" => Some(ProjectState::Suspended),
            _ => None,
        }
    }
}

/// Lifecycle actions a team owner can request for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectAction {
    Start,
    Stop,
    Restart,
}

impl ProjectAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(ProjectAction::Start),
            "stop" => Some(ProjectAction::Stop),
            "restart" => Some(ProjectAction::Restart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectAction::Start => "start",
            ProjectAction::Stop => "stop",
            ProjectAction::Restart => "restart",
        }
    }

    /// State the project is left in once the action succeeds
    pub fn resulting_state(&self) -> ProjectState {
        match self {
            ProjectAction::Stop => ProjectState::Suspended,
            ProjectAction::Start | ProjectAction::Restart => ProjectState::Running,
        }
    }

    pub fn audit_event(&self) -> &'static str {
        match self {
            ProjectAction::Start => "project.started",
            ProjectAction::Stop => "project.stopped",
            ProjectAction::Restart => "project.restarted",
        }
    }
}

/// What an audit log entry is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEntity {
    Project(Uuid),
    Team(Uuid),
}

impl AuditEntity {
    pub fn entity_type(&self) -> &'static str {
        match self {
            AuditEntity::Project(_) => "project",
            AuditEntity::Team(_) => "team",
        }
    }

    pub fn entity_id(&self) -> String {
        match self {
            AuditEntity::Project(id) | AuditEntity::Team(id) => id.to_string(),
        }
    }
}
