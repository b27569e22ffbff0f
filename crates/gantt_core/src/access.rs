//! Instance-scoped permission predicates consulted by the read and write
//! paths.
//!
//! # Responsibility
//! - Define the narrow authorization seam the host application implements.
//! - Provide a permissive default for embedders without an access model.
//!
//! # Invariants
//! - Predicates must be side-effect free; they may be consulted repeatedly
//!   for the same record within one request.
//! - Denied view access on a project hides its entire subtree; the walk
//!   never emits a partial subtree.

use crate::model::project::Project;
use crate::model::task::Task;

/// Permission predicates for chart reads and schedule mutations.
///
/// Cascading operations consult the predicate only for the root record they
/// were invoked on; descendants ride on that decision (see
/// `ScheduleService::update_parent`).
pub trait AccessPolicy {
    /// Whether the viewer may see this project (and therefore its subtree).
    fn can_view_project(&self, project: &Project) -> bool;
    /// Whether the viewer may see this task.
    fn can_view_task(&self, task: &Task) -> bool;
    /// Whether the caller may create tasks.
    fn can_create_task(&self) -> bool;
    /// Whether the caller may update this task.
    fn can_update_task(&self, task: &Task) -> bool;
}

/// Policy granting every capability.
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_view_project(&self, _project: &Project) -> bool {
        true
    }

    fn can_view_task(&self, _task: &Task) -> bool {
        true
    }

    fn can_create_task(&self) -> bool {
        true
    }

    fn can_update_task(&self, _task: &Task) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessPolicy, AllowAll};
    use crate::model::project::Project;
    use crate::model::task::Task;
    use uuid::Uuid;

    fn sample_project() -> Project {
        Project {
            id: 1,
            parent_id: None,
            name: "P".to_string(),
            content: None,
            comment: None,
            plan_start_date: None,
            plan_end_date: None,
            percent_done: 0,
            show_on_global_view: true,
            is_template: false,
            is_deleted: false,
        }
    }

    fn sample_task() -> Task {
        Task {
            id: 1,
            uuid: Uuid::new_v4(),
            project_id: 1,
            parent_task_id: None,
            name: "T".to_string(),
            content: None,
            comment: None,
            plan_start_date: None,
            plan_end_date: None,
            planned_duration_minutes: 0,
            percent_done: 0,
            is_milestone: false,
            is_template: false,
        }
    }

    #[test]
    fn allow_all_grants_every_capability() {
        let policy = AllowAll;
        assert!(policy.can_view_project(&sample_project()));
        assert!(policy.can_view_task(&sample_task()));
        assert!(policy.can_create_task());
        assert!(policy.can_update_task(&sample_task()));
    }
}
