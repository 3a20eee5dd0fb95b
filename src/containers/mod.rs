//! Container service abstraction. The control plane never runs Node-RED
//! itself; it asks a driver to create, inspect and control the runtime of
//! each project.

pub mod launcher;
pub mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, DriverKind};
use crate::database::models::Project;

pub use launcher::LauncherDriver;
pub use stub::StubDriver;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no container for project {0}")]
    NotFound(Uuid),

    #[error("container service unavailable: {0}")]
    Unavailable(String),

    #[error("container service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// One line of a project's runtime log. `ts` is opaque and unique per
/// project; it doubles as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts: String,
    pub level: String,
    pub msg: String,
}

/// Live state reported by the driver, plus whatever else it knows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDetails {
    pub state: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerDetails {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            extra: Map::new(),
        }
    }

    pub fn unknown() -> Self {
        Self::new("unknown")
    }
}

/// What a driver is given when asked to create a project's container
#[derive(Debug, Clone, Serialize)]
pub struct CreateOptions {
    /// Token the runtime uses to call back into the control plane
    pub token: String,
    /// Caller supplied options from the create request
    pub options: Value,
}

#[async_trait]
pub trait ContainerDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Provision the container. Returns the URL the project is served on,
    /// if the driver assigns one.
    async fn create(&self, project: &Project, options: &CreateOptions) -> Result<Option<String>, ContainerError>;
    async fn remove(&self, project: &Project) -> Result<(), ContainerError>;
    /// `None` when the driver has nothing to report for this project
    async fn details(&self, project: &Project) -> Result<Option<ContainerDetails>, ContainerError>;
    /// Driver-specific runtime settings; the API layers its own keys on top
    async fn settings(&self, project: &Project) -> Result<Map<String, Value>, ContainerError>;
    /// The full log buffer, oldest first
    async fn logs(&self, project: &Project) -> Result<Vec<LogEntry>, ContainerError>;
    async fn start(&self, project: &Project) -> Result<(), ContainerError>;
    async fn stop(&self, project: &Project) -> Result<(), ContainerError>;
    async fn restart(&self, project: &Project) -> Result<(), ContainerError>;
}

/// Build the driver selected in configuration
pub fn build_driver(config: &AppConfig) -> anyhow::Result<Arc<dyn ContainerDriver>> {
    match config.containers.driver {
        DriverKind::Stub => {
            tracing::warn!("Using stub container driver; projects will not actually run");
            Ok(Arc::new(StubDriver::new(config.server.domain.clone())))
        }
        DriverKind::Launcher => {
            let url = config
                .containers
                .launcher_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("CONTAINER_LAUNCHER_URL is required for the launcher driver"))?;
            let timeout = Duration::from_secs(config.containers.request_timeout_secs);
            Ok(Arc::new(LauncherDriver::new(url, timeout)?))
        }
    }
}
