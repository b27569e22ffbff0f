//! Task record model.
//!
//! # Responsibility
//! - Mirror the persisted task row consumed by mapping and scheduling.
//!
//! # Invariants
//! - `uuid` is stable, assigned at creation, and never reused; it is the
//!   only identity usable to address a task from outside its owning project.
//! - `parent_task_id = None` means the task hangs directly off its project.
//! - A milestone is a task with the `is_milestone` flag set, not a separate
//!   storage entity.

use crate::model::project::ProjectId;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Numeric task identity, local to the store.
pub type TaskId = i64;

/// Stable task identity used for cross-entity reference.
pub type TaskUid = Uuid;

/// Persisted task record.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub uuid: TaskUid,
    pub project_id: ProjectId,
    /// Parent task within the same or another project. `None` means direct
    /// child of the owning project.
    pub parent_task_id: Option<TaskId>,
    pub name: String,
    pub content: Option<String>,
    pub comment: Option<String>,
    pub plan_start_date: Option<NaiveDateTime>,
    pub plan_end_date: Option<NaiveDateTime>,
    pub planned_duration_minutes: i64,
    /// Completion percentage in `0..=100`.
    pub percent_done: i64,
    pub is_milestone: bool,
    pub is_template: bool,
}

impl Task {
    /// Returns whether this task is nested under another task.
    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }
}

/// Insert payload for one task row. The repository assigns the stable
/// `uuid` and the numeric id.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub parent_task_id: Option<TaskId>,
    pub name: String,
    pub content: Option<String>,
    pub comment: Option<String>,
    pub plan_start_date: Option<NaiveDateTime>,
    pub plan_end_date: Option<NaiveDateTime>,
    pub planned_duration_minutes: i64,
    pub percent_done: i64,
    pub is_milestone: bool,
    pub is_template: bool,
}
