use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;
use crate::permissions::Role;

/// Persistence seam for the control plane. `PgStore` is the production
/// implementation; `MemoryStore` backs tests and local development.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Users and teams
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn create_team(&self, team: NewTeam) -> Result<Team, DatabaseError>;
    async fn team_by_id(&self, id: Uuid) -> Result<Option<Team>, DatabaseError>;
    async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<TeamMembership, DatabaseError>;
    async fn team_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<TeamMembership>, DatabaseError>;

    // Stacks
    async fn create_stack(&self, stack: NewStack) -> Result<ProjectStack, DatabaseError>;
    async fn stack_by_id(&self, id: Uuid) -> Result<Option<ProjectStack>, DatabaseError>;
    async fn list_stacks(&self) -> Result<Vec<ProjectStack>, DatabaseError>;

    // Templates
    async fn create_template(&self, template: NewTemplate) -> Result<ProjectTemplate, DatabaseError>;
    async fn template_by_id(&self, id: Uuid) -> Result<Option<ProjectTemplate>, DatabaseError>;
    async fn list_templates(&self) -> Result<Vec<ProjectTemplate>, DatabaseError>;
    async fn update_template(&self, template: &ProjectTemplate) -> Result<ProjectTemplate, DatabaseError>;

    // Projects
    async fn create_project(&self, project: NewProject) -> Result<Project, DatabaseError>;
    async fn project_by_id(&self, id: Uuid) -> Result<Option<ProjectDetail>, DatabaseError>;
    async fn count_projects_by_name(&self, name: &str) -> Result<i64, DatabaseError>;
    async fn update_project(&self, project: &Project) -> Result<Project, DatabaseError>;
    async fn delete_project(&self, id: Uuid) -> Result<(), DatabaseError>;
    async fn project_setting(&self, project_id: Uuid, key: &str) -> Result<Option<Value>, DatabaseError>;
    async fn set_project_setting(
        &self,
        project_id: Uuid,
        key: &str,
        value: Value,
    ) -> Result<(), DatabaseError>;

    // Audit log
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, DatabaseError>;
    /// Newest-first entries for a project, strictly older than `before` when given
    async fn audit_for_project(
        &self,
        project_id: Uuid,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, DatabaseError>;
}
