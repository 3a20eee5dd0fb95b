pub mod project;
pub mod seed;
pub mod server;
pub mod template;
pub mod token;
