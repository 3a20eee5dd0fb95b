#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use flowforge_api::auth::{generate_jwt, Claims};
use flowforge_api::config::AppConfig;
use flowforge_api::containers::{ContainerDriver, StubDriver};
use flowforge_api::database::models::{
    NewStack, NewTeam, NewTemplate, NewUser, ProjectStack, ProjectTemplate, Team, User,
};
use flowforge_api::database::{MemoryStore, Store};
use flowforge_api::permissions::Role;
use flowforge_api::{router, AppState};

/// A router served on a free port, backed by the in-memory store and the
/// stub container driver, seeded with one team and four users.
pub struct TestApp {
    pub base_url: String,
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub driver: Arc<StubDriver>,
    pub admin: User,
    pub owner: User,
    pub member: User,
    pub outsider: User,
    pub team: Team,
    pub stack: ProjectStack,
    pub template: ProjectTemplate,
    client: reqwest::Client,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn user(store: &MemoryStore, username: &str, admin: bool) -> Result<User> {
    Ok(store
        .create_user(NewUser {
            username: username.to_string(),
            name: username.to_string(),
            email: format!("{}@example.com", username),
            admin,
        })
        .await?)
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_driver(None).await
    }

    /// Like `spawn`, but the router talks to `containers` instead of the stub
    pub async fn spawn_with_driver(containers: Option<Arc<dyn ContainerDriver>>) -> Result<Self> {
        init_tracing();

        let mut config = AppConfig::development();
        config.server.base_url = "http://forge.test".to_string();
        config.server.domain = "forge.test".to_string();
        config.pagination.max_limit = 50;

        let store = Arc::new(MemoryStore::new());
        let driver = Arc::new(StubDriver::new(config.server.domain.clone()));

        let admin = user(&store, "admin", true).await?;
        let owner = user(&store, "owner", false).await?;
        let member = user(&store, "member", false).await?;
        let outsider = user(&store, "outsider", false).await?;

        let team = store
            .create_team(NewTeam { name: "ATeam".to_string(), slug: "ateam".to_string() })
            .await?;
        store.add_team_member(team.id, owner.id, Role::Owner).await?;
        store.add_team_member(team.id, member.id, Role::Member).await?;

        let stack = store
            .create_stack(NewStack {
                name: "stack1".to_string(),
                active: true,
                properties: json!({ "nodered": "2.2.2", "memory": 256 }),
            })
            .await?;
        let template = store
            .create_template(NewTemplate {
                name: "template1".to_string(),
                description: "A template".to_string(),
                active: true,
                settings: json!({ "codeEditor": "ace", "palette": { "nodesExcludes": "exec.js" } }),
                policy: json!({ "httpAdminRoot": true, "palette": { "allowInstall": true } }),
                owner_id: Some(admin.id),
            })
            .await?;

        let containers = containers.unwrap_or_else(|| driver.clone() as Arc<dyn ContainerDriver>);
        let state = AppState::new(store.clone(), containers, config.clone());
        let app = router(state);

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            config,
            store,
            driver,
            admin,
            owner,
            member,
            outsider,
            team,
            stack,
            template,
            client: reqwest::Client::new(),
        })
    }

    pub fn token_for(&self, user: &User) -> String {
        generate_jwt(&Claims::for_user(user.id, &self.config.security), &self.config.security)
            .expect("sign user token")
    }

    pub fn project_token(&self, project_id: Uuid) -> String {
        generate_jwt(&Claims::for_project(project_id, &self.config.security), &self.config.security)
            .expect("sign project token")
    }

    /// Send a request and return the status plus the parsed JSON body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get_as(&self, user: &User, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, Some(&self.token_for(user)), None).await
    }

    pub fn project_body(&self, name: &str) -> Value {
        json!({
            "name": name,
            "team": self.team.id.to_string(),
            "stack": self.stack.id.to_string(),
            "template": self.template.id.to_string(),
            "options": {},
        })
    }

    /// Create a project as the team owner and return its id
    pub async fn create_project(&self, name: &str) -> Result<Uuid> {
        let (status, body) = self
            .send(Method::POST, "/api/v1/project", Some(&self.token_for(&self.owner)), Some(self.project_body(name)))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "create failed: {} {}", status, body);
        let id = body["data"]["id"].as_str().context("project id missing")?;
        Ok(Uuid::parse_str(id)?)
    }
}
