use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{ProjectStack, ProjectTemplate, Team};
use crate::types::ProjectState;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub project_type: String,
    pub url: String,
    pub state: String,
    pub team_id: Uuid,
    pub stack_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn state(&self) -> ProjectState {
        ProjectState::parse(&self.state).unwrap_or(ProjectState::Running)
    }

    pub fn set_state(&mut self, state: ProjectState) {
        self.state = state.as_str().to_string();
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub team_id: Uuid,
    pub stack_id: Uuid,
    pub template_id: Uuid,
}

/// A project together with the records it references
#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub project: Project,
    pub team: Team,
    pub stack: Option<ProjectStack>,
    pub template: Option<ProjectTemplate>,
}
