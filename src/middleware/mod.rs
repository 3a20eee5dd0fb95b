pub mod auth;
pub mod project;
pub mod response;

pub use auth::{jwt_auth_middleware, Session};
pub use project::{load_project, ProjectContext};
pub use response::{ApiResponse, ApiResult};
