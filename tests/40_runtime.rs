mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;

fn stamps(body: &Value) -> Vec<String> {
    body["data"]["log"]
        .as_array()
        .map(|log| log.iter().filter_map(|e| e["ts"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn settings_combine_driver_urls_and_template() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("runtime").await?;
    let owner = app.token_for(&app.owner);

    app.send(
        Method::PUT,
        &format!("/api/v1/project/{}", id),
        Some(&owner),
        Some(json!({ "settings": { "httpAdminRoot": "/mine", "palette": { "allowInstall": false } } })),
    )
    .await?;

    let (status, body) = app
        .send(Method::GET, &format!("/api/v1/project/{}/settings", id), Some(&app.project_token(id)), None)
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let settings = &body["data"];
    assert_eq!(settings["projectID"], id.to_string());
    assert_eq!(settings["baseURL"], "http://runtime.forge.test");
    assert_eq!(settings["forgeURL"], "http://forge.test");
    assert_eq!(settings["storageURL"], "http://forge.test/storage");
    assert_eq!(settings["auditURL"], "http://forge.test/logging");
    assert_eq!(settings["state"], "running");
    assert_eq!(settings["stack"], json!({ "nodered": "2.2.2", "memory": 256 }));

    let runtime = &settings["settings"];
    assert_eq!(runtime["httpAdminRoot"], "/mine");
    assert_eq!(runtime["codeEditor"], "ace");
    assert_eq!(runtime["disableEditor"], false);
    assert_eq!(runtime["palette"]["allowInstall"], false);
    assert_eq!(runtime["palette"]["nodesExcludes"], "exec.js");
    assert_eq!(runtime["modules"]["allowInstall"], true);
    Ok(())
}

#[tokio::test]
async fn logs_page_in_both_directions() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("chatty").await?;
    for i in 0..8 {
        app.driver.push_log(id, "info", format!("line {}", i)).await;
    }
    let path = format!("/api/v1/project/{}/logs", id);

    let (_, all) = app.get_as(&app.member, &format!("{}?limit=abc", path)).await?;
    let all = stamps(&all);
    assert_eq!(all.len(), 10);

    let (status, newest) = app.get_as(&app.member, &format!("{}?limit=3", path)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stamps(&newest), all[7..].to_vec());
    assert_eq!(newest["data"]["meta"]["next_cursor"], all[9].as_str());
    let previous = newest["data"]["meta"]["previous_cursor"].as_str().unwrap().to_string();
    assert_eq!(previous, format!("-{}", all[7]));

    let (_, older) = app.get_as(&app.member, &format!("{}?limit=3&cursor={}", path, previous)).await?;
    assert_eq!(stamps(&older), all[4..7].to_vec());

    let (_, newer) = app.get_as(&app.member, &format!("{}?limit=3&cursor={}", path, all[1])).await?;
    assert_eq!(stamps(&newer), all[2..5].to_vec());

    let (_, head) = app.get_as(&app.member, &format!("{}?cursor=-{}", path, all[2])).await?;
    assert_eq!(stamps(&head), all[..2].to_vec());
    assert!(head["data"]["meta"].get("previous_cursor").is_none());

    let (_, missing) = app.get_as(&app.member, &format!("{}?cursor=nope", path)).await?;
    assert!(stamps(&missing).is_empty());
    Ok(())
}

#[tokio::test]
async fn actions_drive_state_and_audit() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("switch").await?;
    let owner = app.token_for(&app.owner);
    let action = |name: &str| format!("/api/v1/project/{}/actions/{}", id, name);

    let (status, body) = app.send(Method::POST, &action("stop"), Some(&owner), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "okay");

    let (_, project) = app.get_as(&app.owner, &format!("/api/v1/project/{}", id)).await?;
    assert_eq!(project["data"]["state"], "suspended");
    assert_eq!(project["data"]["meta"]["state"], "stopped");

    app.send(Method::POST, &action("start"), Some(&owner), None).await?;
    app.send(Method::POST, &action("restart"), Some(&owner), None).await?;
    let (_, project) = app.get_as(&app.owner, &format!("/api/v1/project/{}", id)).await?;
    assert_eq!(project["data"]["state"], "running");

    let (status, _) = app.send(Method::POST, &action("pause"), Some(&owner), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let member = app.token_for(&app.member);
    let (status, _) = app.send(Method::POST, &action("stop"), Some(&member), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn audit_log_pages_newest_first() -> Result<()> {
    let app = TestApp::spawn().await?;
    let id = app.create_project("audited").await?;
    let owner = app.token_for(&app.owner);
    for name in ["stop", "start", "restart"] {
        app.send(Method::POST, &format!("/api/v1/project/{}/actions/{}", id, name), Some(&owner), None)
            .await?;
    }
    let path = format!("/api/v1/project/{}/audit-log", id);
    let events = |body: &Value| -> Vec<String> {
        body["data"]["log"]
            .as_array()
            .map(|log| log.iter().filter_map(|e| e["event"].as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };

    let (status, first) = app.get_as(&app.member, &format!("{}?limit=2", path)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events(&first), ["project.restarted", "project.started"]);
    let cursor = first["data"]["meta"]["next_cursor"].as_str().unwrap().to_string();

    let (_, second) = app.get_as(&app.member, &format!("{}?limit=2&cursor={}", path, cursor)).await?;
    assert_eq!(events(&second), ["project.stopped", "project.created"]);
    let cursor = second["data"]["meta"]["next_cursor"].as_str().unwrap().to_string();

    let (_, last) = app.get_as(&app.member, &format!("{}?limit=2&cursor={}", path, cursor)).await?;
    assert!(events(&last).is_empty());
    assert!(last["data"]["meta"].get("next_cursor").is_none());

    let (status, _) = app.get_as(&app.member, &format!("{}?cursor=abc", path)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get_as(&app.outsider, &path).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
