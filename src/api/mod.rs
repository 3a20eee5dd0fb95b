pub mod format;
pub mod pagination;

pub use format::{audit_log_view, project_view, project_with_meta, stack_view, team_view, template_view};
pub use pagination::{paginate_logs, LogPage, PageMeta, PageQuery, PaginationOptions};
