//! Project record model.
//!
//! # Responsibility
//! - Mirror the persisted project row consumed by the tree walk.
//!
//! # Invariants
//! - `parent_id = None` marks a root-level project.
//! - `percent_done` is expected in `0..=100`; out-of-range values are a
//!   data-integrity violation rejected at the mapping boundary.

use chrono::NaiveDateTime;

/// Numeric project identity.
pub type ProjectId = i64;

/// Persisted project record.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    /// Owning project. `None` means root-level project.
    pub parent_id: Option<ProjectId>,
    pub name: String,
    /// Rich-text body; sanitized only at projection time.
    pub content: Option<String>,
    pub comment: Option<String>,
    pub plan_start_date: Option<NaiveDateTime>,
    pub plan_end_date: Option<NaiveDateTime>,
    /// Completion percentage in `0..=100`.
    pub percent_done: i64,
    /// Included in the global ("all projects") chart when set.
    pub show_on_global_view: bool,
    pub is_template: bool,
    pub is_deleted: bool,
}

impl Project {
    /// Returns whether this project sits at the root of the hierarchy.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Insert payload for one project row.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub parent_id: Option<ProjectId>,
    pub name: String,
    pub content: Option<String>,
    pub comment: Option<String>,
    pub plan_start_date: Option<NaiveDateTime>,
    pub plan_end_date: Option<NaiveDateTime>,
    pub percent_done: i64,
    pub show_on_global_view: bool,
    pub is_template: bool,
    pub is_deleted: bool,
}
