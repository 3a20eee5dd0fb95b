use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;
use super::store::Store;
use crate::permissions::Role;

const PROJECT_COLUMNS: &str =
    "id, name, type, url, state, team_id, stack_id, template_id, created_at, updated_at";
const TEMPLATE_COLUMNS: &str =
    "id, name, active, description, settings, policy, owner_id, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique-constraint failures surface as conflicts, everything else as-is
fn conflict_or(err: sqlx::Error, what: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Conflict(format!("{} already exists", what))
        }
        _ => DatabaseError::Sqlx(err),
    }
}

/// Project names are unique; a clash reads the same as the pre-insert check
fn name_in_use(err: sqlx::Error) -> DatabaseError {
    match conflict_or(err, "project") {
        DatabaseError::Conflict(_) => DatabaseError::Conflict("name in use".to_string()),
        other => other,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, name, email, admin)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, username, name, email, admin, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "user"))
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, name, email, admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_team(&self, team: NewTeam) -> Result<Team, DatabaseError> {
        sqlx::query_as::<_, Team>(
            "INSERT INTO teams (id, name, slug) VALUES ($1, $2, $3)
             RETURNING id, name, slug, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&team.name)
        .bind(&team.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "team"))
    }

    async fn team_by_id(&self, id: Uuid) -> Result<Option<Team>, DatabaseError> {
        let team = sqlx::query_as::<_, Team>("SELECT id, name, slug, created_at FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(team)
    }

    async fn add_team_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<TeamMembership, DatabaseError> {
        let membership = sqlx::query_as::<_, TeamMembership>(
            "INSERT INTO team_members (team_id, user_id, role) VALUES ($1, $2, $3)
             ON CONFLICT (team_id, user_id) DO UPDATE SET role = EXCLUDED.role
             RETURNING user_id, team_id, role",
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role.level())
        .fetch_one(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn team_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<TeamMembership>, DatabaseError> {
        let membership = sqlx::query_as::<_, TeamMembership>(
            "SELECT user_id, team_id, role FROM team_members WHERE user_id = $1 AND team_id = $2",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn create_stack(&self, stack: NewStack) -> Result<ProjectStack, DatabaseError> {
        sqlx::query_as::<_, ProjectStack>(
            "INSERT INTO project_stacks (id, name, active, properties) VALUES ($1, $2, $3, $4)
             RETURNING id, name, active, properties",
        )
        .bind(Uuid::new_v4())
        .bind(&stack.name)
        .bind(stack.active)
        .bind(&stack.properties)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "stack"))
    }

    async fn stack_by_id(&self, id: Uuid) -> Result<Option<ProjectStack>, DatabaseError> {
        let stack = sqlx::query_as::<_, ProjectStack>(
            "SELECT id, name, active, properties FROM project_stacks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stack)
    }

    async fn list_stacks(&self) -> Result<Vec<ProjectStack>, DatabaseError> {
        let stacks = sqlx::query_as::<_, ProjectStack>(
            "SELECT id, name, active, properties FROM project_stacks ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stacks)
    }

    async fn create_template(&self, template: NewTemplate) -> Result<ProjectTemplate, DatabaseError> {
        let sql = format!(
            "INSERT INTO project_templates (id, name, active, description, settings, policy, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TEMPLATE_COLUMNS
        );
        sqlx::query_as::<_, ProjectTemplate>(&sql)
            .bind(Uuid::new_v4())
            .bind(&template.name)
            .bind(template.active)
            .bind(&template.description)
            .bind(&template.settings)
            .bind(&template.policy)
            .bind(template.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "template"))
    }

    async fn template_by_id(&self, id: Uuid) -> Result<Option<ProjectTemplate>, DatabaseError> {
        let sql = format!("SELECT {} FROM project_templates WHERE id = $1", TEMPLATE_COLUMNS);
        let template = sqlx::query_as::<_, ProjectTemplate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(template)
    }

    async fn list_templates(&self) -> Result<Vec<ProjectTemplate>, DatabaseError> {
        let sql = format!("SELECT {} FROM project_templates ORDER BY name", TEMPLATE_COLUMNS);
        let templates = sqlx::query_as::<_, ProjectTemplate>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(templates)
    }

    async fn update_template(&self, template: &ProjectTemplate) -> Result<ProjectTemplate, DatabaseError> {
        let sql = format!(
            "UPDATE project_templates
             SET name = $2, active = $3, description = $4, settings = $5, policy = $6, updated_at = $7
             WHERE id = $1 RETURNING {}",
            TEMPLATE_COLUMNS
        );
        sqlx::query_as::<_, ProjectTemplate>(&sql)
            .bind(template.id)
            .bind(&template.name)
            .bind(template.active)
            .bind(&template.description)
            .bind(&template.settings)
            .bind(&template.policy)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "template"))?
            .ok_or_else(|| DatabaseError::NotFound(format!("Template {} not found", template.id)))
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, DatabaseError> {
        let sql = format!(
            "INSERT INTO projects (id, name, type, url, state, team_id, stack_id, template_id)
             VALUES ($1, $2, '', '', 'running', $3, $4, $5) RETURNING {}",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(&project.name)
            .bind(project.team_id)
            .bind(project.stack_id)
            .bind(project.template_id)
            .fetch_one(&self.pool)
            .await
            .map_err(name_in_use)
    }

    async fn project_by_id(&self, id: Uuid) -> Result<Option<ProjectDetail>, DatabaseError> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let project = match sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        {
            Some(p) => p,
            None => return Ok(None),
        };

        let team = self
            .team_by_id(project.team_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Team {} not found", project.team_id)))?;
        let stack = match project.stack_id {
            Some(stack_id) => self.stack_by_id(stack_id).await?,
            None => None,
        };
        let template = match project.template_id {
            Some(template_id) => self.template_by_id(template_id).await?,
            None => None,
        };

        Ok(Some(ProjectDetail {
            project,
            team,
            stack,
            template,
        }))
    }

    async fn count_projects_by_name(&self, name: &str) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn update_project(&self, project: &Project) -> Result<Project, DatabaseError> {
        let sql = format!(
            "UPDATE projects SET name = $2, url = $3, state = $4, updated_at = $5
             WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.url)
            .bind(&project.state)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(name_in_use)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Project {} not found", project.id)))
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Project {} not found", id)));
        }
        Ok(())
    }

    async fn project_setting(&self, project_id: Uuid, key: &str) -> Result<Option<Value>, DatabaseError> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT value FROM project_settings WHERE project_id = $1 AND key = $2")
                .bind(project_id)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_project_setting(
        &self,
        project_id: Uuid,
        key: &str,
        value: Value,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO project_settings (project_id, key, value) VALUES ($1, $2, $3)
             ON CONFLICT (project_id, key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(project_id)
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, DatabaseError> {
        let record = sqlx::query_as::<_, AuditLogEntry>(
            "WITH inserted AS (
                 INSERT INTO audit_log (entity_type, entity_id, user_id, event, body)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, entity_type, entity_id, user_id, event, body, created_at
             )
             SELECT i.id, i.entity_type, i.entity_id, i.user_id, u.username, i.event, i.body, i.created_at
             FROM inserted i LEFT JOIN users u ON u.id = i.user_id",
        )
        .bind(entry.entity.entity_type())
        .bind(entry.entity.entity_id())
        .bind(entry.user_id)
        .bind(&entry.event)
        .bind(&entry.body)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn audit_for_project(
        &self,
        project_id: Uuid,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, DatabaseError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT a.id, a.entity_type, a.entity_id, a.user_id, u.username, a.event, a.body, a.created_at
             FROM audit_log a LEFT JOIN users u ON u.id = a.user_id
             WHERE a.entity_type = 'project' AND a.entity_id = $1
               AND ($2::BIGINT IS NULL OR a.id < $2)
             ORDER BY a.id DESC
             LIMIT $3",
        )
        .bind(project_id.to_string())
        .bind(before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
