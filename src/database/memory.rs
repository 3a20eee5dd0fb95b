use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;
use super::store::Store;
use crate::permissions::Role;
use crate::types::ProjectState;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    teams: HashMap<Uuid, Team>,
    members: HashMap<(Uuid, Uuid), TeamMembership>,
    stacks: HashMap<Uuid, ProjectStack>,
    templates: HashMap<Uuid, ProjectTemplate>,
    projects: HashMap<Uuid, Project>,
    settings: HashMap<(Uuid, String), Value>,
    audit: Vec<AuditLogEntry>,
}

/// In-process store with the same semantics as `PgStore`, including unique
/// names and cascading project settings.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict("user already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            name: user.name,
            email: user.email,
            admin: user.admin,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_team(&self, team: NewTeam) -> Result<Team, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.teams.values().any(|t| t.slug == team.slug) {
            return Err(DatabaseError::Conflict("team already exists".to_string()));
        }
        let team = Team {
            id: Uuid::new_v4(),
            name: team.name,
            slug: team.slug,
            created_at: Utc::now(),
        };
        tables.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn team_by_id(&self, id: Uuid) -> Result<Option<Team>, DatabaseError> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<TeamMembership, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&team_id) {
            return Err(DatabaseError::NotFound(format!("Team {} not found", team_id)));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound(format!("User {} not found", user_id)));
        }
        let membership = TeamMembership {
            user_id,
            team_id,
            role: role.level(),
        };
        tables.members.insert((team_id, user_id), membership.clone());
        Ok(membership)
    }

    async fn team_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<TeamMembership>, DatabaseError> {
        Ok(self.tables.read().await.members.get(&(team_id, user_id)).cloned())
    }

    async fn create_stack(&self, stack: NewStack) -> Result<ProjectStack, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.stacks.values().any(|s| s.name == stack.name) {
            return Err(DatabaseError::Conflict("stack already exists".to_string()));
        }
        let stack = ProjectStack {
            id: Uuid::new_v4(),
            name: stack.name,
            active: stack.active,
            properties: stack.properties,
        };
        tables.stacks.insert(stack.id, stack.clone());
        Ok(stack)
    }

    async fn stack_by_id(&self, id: Uuid) -> Result<Option<ProjectStack>, DatabaseError> {
        Ok(self.tables.read().await.stacks.get(&id).cloned())
    }

    async fn list_stacks(&self) -> Result<Vec<ProjectStack>, DatabaseError> {
        let mut stacks: Vec<ProjectStack> = self.tables.read().await.stacks.values().cloned().collect();
        stacks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stacks)
    }

    async fn create_template(&self, template: NewTemplate) -> Result<ProjectTemplate, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.templates.values().any(|t| t.name == template.name) {
            return Err(DatabaseError::Conflict("template already exists".to_string()));
        }
        let now = Utc::now();
        let template = ProjectTemplate {
            id: Uuid::new_v4(),
            name: template.name,
            active: template.active,
            description: template.description,
            settings: template.settings,
            policy: template.policy,
            owner_id: template.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn template_by_id(&self, id: Uuid) -> Result<Option<ProjectTemplate>, DatabaseError> {
        Ok(self.tables.read().await.templates.get(&id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<ProjectTemplate>, DatabaseError> {
        let mut templates: Vec<ProjectTemplate> =
            self.tables.read().await.templates.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn update_template(&self, template: &ProjectTemplate) -> Result<ProjectTemplate, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables
            .templates
            .values()
            .any(|t| t.id != template.id && t.name == template.name)
        {
            return Err(DatabaseError::Conflict("template already exists".to_string()));
        }
        let stored = tables
            .templates
            .get_mut(&template.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Template {} not found", template.id)))?;
        stored.name = template.name.clone();
        stored.active = template.active;
        stored.description = template.description.clone();
        stored.settings = template.settings.clone();
        stored.policy = template.policy.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.projects.values().any(|p| p.name == project.name) {
            return Err(DatabaseError::Conflict("name in use".to_string()));
        }
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: project.name,
            project_type: String::new(),
            url: String::new(),
            state: ProjectState::Running.as_str().to_string(),
            team_id: project.team_id,
            stack_id: Some(project.stack_id),
            template_id: Some(project.template_id),
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn project_by_id(&self, id: Uuid) -> Result<Option<ProjectDetail>, DatabaseError> {
        let tables = self.tables.read().await;
        let project = match tables.projects.get(&id) {
            Some(p) => p.clone(),
            None => return Ok(None),
        };
        let team = tables
            .teams
            .get(&project.team_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("Team {} not found", project.team_id)))?;
        let stack = project.stack_id.and_then(|id| tables.stacks.get(&id).cloned());
        let template = project.template_id.and_then(|id| tables.templates.get(&id).cloned());

        Ok(Some(ProjectDetail {
            project,
            team,
            stack,
            template,
        }))
    }

    async fn count_projects_by_name(&self, name: &str) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.values().filter(|p| p.name == name).count() as i64)
    }

    async fn update_project(&self, project: &Project) -> Result<Project, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables
            .projects
            .values()
            .any(|p| p.id != project.id && p.name == project.name)
        {
            return Err(DatabaseError::Conflict("name in use".to_string()));
        }
        let stored = tables
            .projects
            .get_mut(&project.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Project {} not found", project.id)))?;
        stored.name = project.name.clone();
        stored.url = project.url.clone();
        stored.state = project.state.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.projects.remove(&id).is_none() {
            return Err(DatabaseError::NotFound(format!("Project {} not found", id)));
        }
        tables.settings.retain(|(project_id, _), _| *project_id != id);
        Ok(())
    }

    async fn project_setting(&self, project_id: Uuid, key: &str) -> Result<Option<Value>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.settings.get(&(project_id, key.to_string())).cloned())
    }

    async fn set_project_setting(
        &self,
        project_id: Uuid,
        key: &str,
        value: Value,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(DatabaseError::NotFound(format!("Project {} not found", project_id)));
        }
        tables.settings.insert((project_id, key.to_string()), value);
        Ok(())
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, DatabaseError> {
        let mut tables = self.tables.write().await;
        let id = tables.audit.last().map(|e| e.id + 1).unwrap_or(1);
        let username = entry
            .user_id
            .and_then(|uid| tables.users.get(&uid).map(|u| u.username.clone()));
        let record = AuditLogEntry {
            id,
            entity_type: entry.entity.entity_type().to_string(),
            entity_id: entry.entity.entity_id(),
            user_id: entry.user_id,
            username,
            event: entry.event,
            body: entry.body,
            created_at: Utc::now(),
        };
        tables.audit.push(record.clone());
        Ok(record)
    }

    async fn audit_for_project(
        &self,
        project_id: Uuid,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, DatabaseError> {
        let tables = self.tables.read().await;
        let entity_id = project_id.to_string();
        Ok(tables
            .audit
            .iter()
            .rev()
            .filter(|e| e.entity_type == "project" && e.entity_id == entity_id)
            .filter(|e| before.map_or(true, |cursor| e.id < cursor))
            .take(limit)
            .cloned()
            .collect())
    }
}
