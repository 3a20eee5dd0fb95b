//! Authentication and the project loader, driven through the router
//! directly with `oneshot`.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use flowforge_api::auth::{generate_jwt, Claims};
use flowforge_api::{router, AppState};

async fn call(app: &common::TestApp, path: &str, token: Option<String>) -> Result<(StatusCode, Value)> {
    let state = AppState::new(app.store.clone(), app.driver.clone(), app.config.clone());
    let mut request = Request::builder().uri(path);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = router(state).oneshot(request.body(Body::empty())?).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, body))
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let (status, body) = call(&app, "/api/v1/templates", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn garbage_and_foreign_tokens_are_rejected() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let (status, _) = call(&app, "/api/v1/templates", Some("not-a-jwt".to_string())).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut other = app.config.security.clone();
    other.jwt_secret = "some-other-secret".to_string();
    let forged = generate_jwt(&Claims::for_user(app.admin.id, &other), &other)?;
    let (status, _) = call(&app, "/api/v1/templates", Some(forged)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_unauthorized() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let token = generate_jwt(&Claims::for_user(Uuid::new_v4(), &app.config.security), &app.config.security)?;
    let (status, _) = call(&app, "/api/v1/templates", Some(token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn project_token_only_reaches_its_own_project() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let mine = app.create_project("mine").await?;
    let other = app.create_project("other").await?;

    let token = app.project_token(mine);
    let (status, body) = call(&app, &format!("/api/v1/project/{}/settings", mine), Some(token.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["baseURL"], "http://mine.forge.test");

    let (status, _) = call(&app, &format!("/api/v1/project/{}/settings", other), Some(token.clone())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Project tokens carry no team permissions
    let (status, _) = call(&app, &format!("/api/v1/project/{}/audit-log", mine), Some(token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn loader_hides_projects() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.create_project("hidden").await?;

    let outsider = app.token_for(&app.outsider);
    let (status, _) = call(&app, &format!("/api/v1/project/{}", id), Some(outsider.clone())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "/api/v1/project/not-a-uuid", Some(outsider.clone())).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, &format!("/api/v1/project/{}", Uuid::new_v4()), Some(outsider)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Admins see every project without a membership
    let (status, body) = call(&app, &format!("/api/v1/project/{}", id), Some(app.token_for(&app.admin))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "hidden");
    Ok(())
}
