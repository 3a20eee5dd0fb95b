pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod containers;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod template;
pub mod types;

pub use app::{router, AppState};
