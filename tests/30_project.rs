mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use common::TestApp;
use flowforge_api::containers::{
    ContainerDetails, ContainerDriver, ContainerError, CreateOptions, LogEntry, StubDriver,
};
use flowforge_api::database::models::Project;
use flowforge_api::database::Store;

/// Stub driver whose `create` fails while `down` is set
struct FlakyDriver {
    down: AtomicBool,
    stub: StubDriver,
}

#[async_trait]
impl ContainerDriver for FlakyDriver {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn create(&self, project: &Project, options: &CreateOptions) -> Result<Option<String>, ContainerError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ContainerError::Unavailable("launcher offline".to_string()));
        }
        self.stub.create(project, options).await
    }

    async fn remove(&self, project: &Project) -> Result<(), ContainerError> {
        self.stub.remove(project).await
    }

    async fn details(&self, project: &Project) -> Result<Option<ContainerDetails>, ContainerError> {
        self.stub.details(project).await
    }

    async fn settings(&self, project: &Project) -> Result<Map<String, Value>, ContainerError> {
        self.stub.settings(project).await
    }

    async fn logs(&self, project: &Project) -> Result<Vec<LogEntry>, ContainerError> {
        self.stub.logs(project).await
    }

    async fn start(&self, project: &Project) -> Result<(), ContainerError> {
        self.stub.start(project).await
    }

    async fn stop(&self, project: &Project) -> Result<(), ContainerError> {
        self.stub.stop(project).await
    }

    async fn restart(&self, project: &Project) -> Result<(), ContainerError> {
        self.stub.restart(project).await
    }
}

#[tokio::test]
async fn owner_creates_project() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.token_for(&app.owner);

    let (status, body) = app
        .send(Method::POST, "/api/v1/project", Some(&token), Some(app.project_body("pr1")))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let project = &body["data"];
    assert_eq!(project["name"], "pr1");
    assert_eq!(project["team"], app.team.id.to_string());
    assert_eq!(project["url"], "http://pr1.forge.test");
    assert_eq!(project["state"], "running");
    assert_eq!(project["stack"]["name"], "stack1");
    assert_eq!(project["template"]["name"], "template1");

    let id = Uuid::parse_str(project["id"].as_str().unwrap())?;
    let audit = app.store.audit_for_project(id, None, 10).await?;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].event, "project.created");
    assert_eq!(audit[0].username.as_deref(), Some("owner"));
    Ok(())
}

#[tokio::test]
async fn create_rejects_bad_requests() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.token_for(&app.owner);
    let create = |body| app.send(Method::POST, "/api/v1/project", Some(&token), Some(body));

    let (status, _) = create(json!({ "name": "x" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = app.project_body("bad-stack");
    body["stack"] = json!(Uuid::new_v4().to_string());
    let (status, response) = create(body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Invalid stack");

    let mut body = app.project_body("bad-template");
    body["template"] = json!("nope");
    let (status, response) = create(body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Invalid template");
    Ok(())
}

#[tokio::test]
async fn create_rejects_banned_and_taken_names() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.token_for(&app.owner);

    let (status, body) = app
        .send(Method::POST, "/api/v1/project", Some(&token), Some(app.project_body("forge")))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "name not allowed");

    app.create_project("taken").await?;
    let (status, body) = app
        .send(Method::POST, "/api/v1/project", Some(&token), Some(app.project_body("taken")))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "name in use");
    Ok(())
}

#[tokio::test]
async fn create_requires_owner_membership() -> Result<()> {
    let app = TestApp::spawn().await?;

    let outsider = app.token_for(&app.outsider);
    let (status, body) = app
        .send(Method::POST, "/api/v1/project", Some(&outsider), Some(app.project_body("p")))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], format!("Current user not in team {}", app.team.id));

    let member = app.token_for(&app.member);
    let (status, _) = app
        .send(Method::POST, "/api/v1/project", Some(&member), Some(app.project_body("p")))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn get_includes_container_meta() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("metaproj").await?;

    let (status, body) = app.get_as(&app.member, &format!("/api/v1/project/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["state"], "running");
    assert_eq!(body["data"]["team"]["slug"], "ateam");
    Ok(())
}

#[tokio::test]
async fn update_renames_and_stores_settings() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("before").await?;
    let token = app.token_for(&app.owner);
    let path = format!("/api/v1/project/{}", id);

    let (status, body) = app
        .send(
            Method::PUT,
            &path,
            Some(&token),
            Some(json!({ "name": "after", "settings": { "httpAdminRoot": "/editor", "unknown": 1 } })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "after");
    assert_eq!(body["data"]["team"]["name"], "ATeam");
    assert_eq!(body["data"]["meta"]["state"], "running");

    let stored = app.store.project_setting(id, "settings").await?;
    assert_eq!(stored, Some(json!({ "httpAdminRoot": "/editor" })));

    // Empty name leaves the name alone
    let (status, body) = app.send(Method::PUT, &path, Some(&token), Some(json!({ "name": "" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "after");
    Ok(())
}

#[tokio::test]
async fn failed_launch_leaves_no_project_behind() -> Result<()> {
    let driver = Arc::new(FlakyDriver {
        down: AtomicBool::new(true),
        stub: StubDriver::new("forge.test"),
    });
    let app = TestApp::spawn_with_driver(Some(driver.clone() as Arc<dyn ContainerDriver>)).await?;
    let token = app.token_for(&app.owner);

    let (status, _) = app
        .send(Method::POST, "/api/v1/project", Some(&token), Some(app.project_body("orphan")))
        .await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.store.count_projects_by_name("orphan").await?, 0);

    // Once the launcher is back the same name can be used
    driver.down.store(false, Ordering::SeqCst);
    let (status, body) = app
        .send(Method::POST, "/api/v1/project", Some(&token), Some(app.project_body("orphan")))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(app.store.count_projects_by_name("orphan").await?, 1);
    Ok(())
}

#[tokio::test]
async fn update_rename_checks_banned_and_taken_names() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_project("first").await?;
    let id = app.create_project("second").await?;
    let token = app.token_for(&app.owner);
    let path = format!("/api/v1/project/{}", id);

    let (status, body) = app.send(Method::PUT, &path, Some(&token), Some(json!({ "name": "forge" }))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "name not allowed");

    let (status, body) = app.send(Method::PUT, &path, Some(&token), Some(json!({ "name": "first" }))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "name in use");

    // Keeping the current name is not a clash with itself
    let (status, body) = app.send(Method::PUT, &path, Some(&token), Some(json!({ "name": "second" }))).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let project = app.store.project_by_id(id).await?.unwrap();
    assert_eq!(project.project.name, "second");
    Ok(())
}

#[tokio::test]
async fn update_rejects_locked_and_invalid_settings() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("locked").await?;
    let token = app.token_for(&app.owner);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/project/{}", id),
            Some(&token),
            Some(json!({ "name": "renamed", "settings": { "codeEditor": "monaco", "httpAdminRoot": "/a b" } })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["codeEditor"], "Setting is locked by the project template");
    assert_eq!(body["field_errors"]["httpAdminRoot"], "Must contain only 0-9 a-z _ - /");

    // Nothing was written
    let project = app.store.project_by_id(id).await?.unwrap();
    assert_eq!(project.project.name, "locked");
    Ok(())
}

#[tokio::test]
async fn update_and_delete_need_owner() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("guarded").await?;
    let member = app.token_for(&app.member);
    let path = format!("/api/v1/project/{}", id);

    let (status, _) = app.send(Method::PUT, &path, Some(&member), Some(json!({ "name": "x" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &path, Some(&member), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn delete_removes_project() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("doomed").await?;
    let token = app.token_for(&app.owner);
    let path = format!("/api/v1/project/{}", id);

    let (status, body) = app.send(Method::DELETE, &path, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "okay");

    let (status, _) = app.send(Method::GET, &path, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Audit entries outlive the project
    let audit = app.store.audit_for_project(id, None, 10).await?;
    assert_eq!(audit[0].event, "project.deleted");

    // The name is free again
    app.create_project("doomed").await?;
    Ok(())
}
