use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::containers::ContainerDriver;
use crate::database::Store;
use crate::handlers::{project, root, stack, template};
use crate::middleware::{jwt_auth_middleware, load_project};

/// Shared handles every handler can reach
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub containers: Arc<dyn ContainerDriver>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, containers: Arc<dyn ContainerDriver>, config: AppConfig) -> Self {
        Self {
            store,
            containers,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/v1/project", project_routes(state.clone()))
        .nest("/api/v1/templates", template_routes())
        .nest("/api/v1/stacks", stack_routes())
        .layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(root::root))
        .route("/health", get(root::health))
        .merge(protected)
        // Global middleware
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn project_routes(state: AppState) -> Router<AppState> {
    // Everything addressing an existing project goes through the loader
    let existing = Router::new()
        .route(
            "/:project_id",
            get(project::project_get)
                .put(project::project_update)
                .delete(project::project_delete),
        )
        .route("/:project_id/settings", get(project::project_settings))
        .route("/:project_id/logs", get(project::project_logs))
        .route("/:project_id/audit-log", get(project::project_audit_log))
        .route("/:project_id/actions/:action", post(project::project_action))
        .route_layer(middleware::from_fn_with_state(state, load_project));

    Router::new().route("/", post(project::project_create)).merge(existing)
}

fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(template::list).post(template::post))
        .route("/:id", get(template::get).put(template::put))
}

fn stack_routes() -> Router<AppState> {
    Router::new().route("/", get(stack::list).post(stack::post))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    let origins: Vec<axum::http::HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
