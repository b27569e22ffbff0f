//! Core chart-building and scheduling logic for hierarchical project/task
//! data. This crate is the single source of truth for chart projection and
//! date-propagation invariants.

pub mod access;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sanitize;
pub mod service;

pub use access::{AccessPolicy, AllowAll};
pub use logging::{default_log_level, init_logging};
pub use model::item::{Item, ItemId, ItemType, ParentRef};
pub use model::link::{Link, LinkId, LinkType, NewLink, TaskLink};
pub use model::project::{NewProject, Project, ProjectId};
pub use model::task::{NewTask, Task, TaskId, TaskUid};
pub use repo::link_repo::{LinkRepository, SqliteLinkRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskDetails, TaskRepository};
pub use sanitize::{BasicHtmlSanitizer, RichTextSanitizer};
pub use service::chart_service::{ChartError, ChartService, ProjectScope};
pub use service::item_mapper::{ItemMapper, MapError, ProjectPlacement, TaskTypeHint};
pub use service::schedule_service::{
    CreateTaskRequest, ScheduleError, ScheduleService, UpdateTaskRequest,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
