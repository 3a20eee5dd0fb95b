pub mod audit_log;
pub mod project;
pub mod stack;
pub mod team;
pub mod template;
pub mod user;

pub use audit_log::{AuditLogEntry, NewAuditEntry};
pub use project::{NewProject, Project, ProjectDetail};
pub use stack::{NewStack, ProjectStack};
pub use team::{NewTeam, Team, TeamMembership};
pub use template::{NewTemplate, ProjectTemplate};
pub use user::{NewUser, User};
