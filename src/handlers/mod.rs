// Route handlers, grouped by resource. Routing lives in `app.rs`.
pub mod project;
pub mod root;
pub mod stack;
pub mod template;
