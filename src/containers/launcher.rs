use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;

use super::{ContainerDetails, ContainerDriver, ContainerError, CreateOptions, LogEntry};
use crate::database::models::Project;

/// Talks to a launcher service over HTTP:
///
/// | call | request |
/// |---|---|
/// | create | `POST /projects` |
/// | remove | `DELETE /projects/:id` |
/// | details | `GET /projects/:id` |
/// | settings | `GET /projects/:id/settings` |
/// | logs | `GET /projects/:id/logs` |
/// | start, stop, restart | `POST /projects/:id/actions/:action` |
pub struct LauncherDriver {
    client: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    url: Option<String>,
}

impl LauncherDriver {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        // Trailing slash so `join` appends instead of replacing the last segment
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ContainerError> {
        self.base
            .join(path)
            .map_err(|e| ContainerError::Unavailable(format!("bad launcher path {}: {}", path, e)))
    }

    fn project_endpoint(&self, project: &Project, suffix: &str) -> Result<Url, ContainerError> {
        self.endpoint(&format!("projects/{}{}", project.id, suffix))
    }

    async fn action(&self, project: &Project, action: &str) -> Result<(), ContainerError> {
        let url = self.project_endpoint(project, &format!("/actions/{}", action))?;
        let response = self.client.post(url).send().await.map_err(transport)?;
        check(project, response).await?;
        tracing::info!("launcher: {} {}", action, project.name);
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> ContainerError {
    if err.is_connect() || err.is_timeout() {
        ContainerError::Unavailable(err.to_string())
    } else {
        ContainerError::Http(err)
    }
}

async fn check(project: &Project, response: Response) -> Result<Response, ContainerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ContainerError::NotFound(project.id));
    }
    let message = response.text().await.unwrap_or_default();
    Err(ContainerError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ContainerDriver for LauncherDriver {
    fn name(&self) -> &'static str {
        "launcher"
    }

    async fn create(&self, project: &Project, options: &CreateOptions) -> Result<Option<String>, ContainerError> {
        let url = self.endpoint("projects")?;
        let body = json!({
            "id": project.id,
            "name": project.name,
            "token": options.token,
            "options": options.options,
        });
        let response = self.client.post(url).json(&body).send().await.map_err(transport)?;
        let created: CreateResponse = check(project, response).await?.json().await?;
        tracing::info!("launcher: created {}", project.name);
        Ok(created.url)
    }

    async fn remove(&self, project: &Project) -> Result<(), ContainerError> {
        let url = self.project_endpoint(project, "")?;
        let response = self.client.delete(url).send().await.map_err(transport)?;
        match check(project, response).await {
            // Already gone counts as removed
            Ok(_) | Err(ContainerError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn details(&self, project: &Project) -> Result<Option<ContainerDetails>, ContainerError> {
        let url = self.project_endpoint(project, "")?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        match check(project, response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(ContainerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn settings(&self, project: &Project) -> Result<Map<String, Value>, ContainerError> {
        let url = self.project_endpoint(project, "/settings")?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        Ok(check(project, response).await?.json().await?)
    }

    async fn logs(&self, project: &Project) -> Result<Vec<LogEntry>, ContainerError> {
        let url = self.project_endpoint(project, "/logs")?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        Ok(check(project, response).await?.json().await?)
    }

    async fn start(&self, project: &Project) -> Result<(), ContainerError> {
        self.action(project, "start").await
    }

    async fn stop(&self, project: &Project) -> Result<(), ContainerError> {
        self.action(project, "stop").await
    }

    async fn restart(&self, project: &Project) -> Result<(), ContainerError> {
        self.action(project, "restart").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path() {
        let driver = LauncherDriver::new("http://launcher.local:9000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            driver.endpoint("projects").unwrap().as_str(),
            "http://launcher.local:9000/api/projects"
        );
    }

    #[test]
    fn rejects_unparsable_base() {
        assert!(LauncherDriver::new("not a url", Duration::from_secs(1)).is_err());
    }
}
