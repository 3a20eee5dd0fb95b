use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContainerDetails, ContainerDriver, ContainerError, CreateOptions, LogEntry};
use crate::database::models::Project;

const BASE_PORT: u16 = 12080;
/// Ports handed out cycle through `BASE_PORT..BASE_PORT + PORT_RANGE`
const PORT_RANGE: u16 = 20000;

struct StubContainer {
    name: String,
    state: &'static str,
    port: u16,
    logs: Vec<LogEntry>,
}

#[derive(Default)]
struct Inner {
    containers: HashMap<Uuid, StubContainer>,
    next_port: u16,
    last_ts: i64,
}

impl Inner {
    /// Millisecond timestamps, bumped so every entry gets a distinct `ts`
    fn next_ts(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_ts = now.max(self.last_ts + 1);
        self.last_ts.to_string()
    }

    fn log(&mut self, id: Uuid, level: &str, msg: String) {
        let ts = self.next_ts();
        if let Some(container) = self.containers.get_mut(&id) {
            container.logs.push(LogEntry {
                ts,
                level: level.to_string(),
                msg,
            });
        }
    }

    fn transition(&mut self, id: Uuid, state: &'static str, msg: &str) -> Result<(), ContainerError> {
        let container = self.containers.get_mut(&id).ok_or(ContainerError::NotFound(id))?;
        container.state = state;
        let line = format!("{} {}", msg, container.name);
        self.log(id, "info", line);
        Ok(())
    }
}

/// Keeps pretend containers in memory. Used for development and tests.
pub struct StubDriver {
    domain: String,
    inner: RwLock<Inner>,
}

impl StubDriver {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Append a line to a project's log buffer
    pub async fn push_log(&self, project_id: Uuid, level: &str, msg: impl Into<String>) {
        self.inner.write().await.log(project_id, level, msg.into());
    }
}

#[async_trait]
impl ContainerDriver for StubDriver {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn create(&self, project: &Project, _options: &CreateOptions) -> Result<Option<String>, ContainerError> {
        let mut inner = self.inner.write().await;
        let port = BASE_PORT + inner.next_port % PORT_RANGE;
        inner.next_port = inner.next_port.wrapping_add(1);
        inner.containers.insert(
            project.id,
            StubContainer {
                name: project.name.clone(),
                state: "running",
                port,
                logs: Vec::new(),
            },
        );
        inner.log(project.id, "info", format!("Created project {}", project.name));
        inner.log(project.id, "info", format!("Started project {} on port {}", project.name, port));
        tracing::debug!("stub: created container for {} on port {}", project.name, port);

        Ok(Some(format!("http://{}.{}", project.name, self.domain)))
    }

    async fn remove(&self, project: &Project) -> Result<(), ContainerError> {
        let mut inner = self.inner.write().await;
        inner
            .containers
            .remove(&project.id)
            .map(|_| ())
            .ok_or(ContainerError::NotFound(project.id))
    }

    async fn details(&self, project: &Project) -> Result<Option<ContainerDetails>, ContainerError> {
        let inner = self.inner.read().await;
        Ok(inner.containers.get(&project.id).map(|c| {
            let mut details = ContainerDetails::new(c.state);
            details.extra.insert("id".to_string(), json!(project.id));
            details.extra.insert("port".to_string(), json!(c.port));
            details
        }))
    }

    async fn settings(&self, project: &Project) -> Result<Map<String, Value>, ContainerError> {
        let inner = self.inner.read().await;
        let container = inner
            .containers
            .get(&project.id)
            .ok_or(ContainerError::NotFound(project.id))?;

        let mut settings = Map::new();
        settings.insert("projectID".to_string(), json!(project.id));
        settings.insert("port".to_string(), json!(container.port));
        Ok(settings)
    }

    async fn logs(&self, project: &Project) -> Result<Vec<LogEntry>, ContainerError> {
        let inner = self.inner.read().await;
        inner
            .containers
            .get(&project.id)
            .map(|c| c.logs.clone())
            .ok_or(ContainerError::NotFound(project.id))
    }

    async fn start(&self, project: &Project) -> Result<(), ContainerError> {
        self.inner.write().await.transition(project.id, "running", "Started project")
    }

    async fn stop(&self, project: &Project) -> Result<(), ContainerError> {
        self.inner.write().await.transition(project.id, "stopped", "Stopped project")
    }

    async fn restart(&self, project: &Project) -> Result<(), ContainerError> {
        self.inner.write().await.transition(project.id, "running", "Restarted project")
    }
}
