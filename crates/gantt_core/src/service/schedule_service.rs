//! Task scheduling use-case service.
//!
//! # Responsibility
//! - Own task mutation: create, update, one-hop date propagation, and
//!   subtree re-parenting.
//!
//! # Invariants
//! - Permission failures abort before any write.
//! - Date propagation crosses exactly one dependency hop per call;
//!   successors of successors are never recalculated here.
//! - Multi-record batches are best-effort: a failure after at least one
//!   successful write surfaces as `PartialBatch` carrying the completed ids,
//!   and nothing is rolled back.

use crate::access::AccessPolicy;
use crate::model::item::ParentRef;
use crate::model::link::TaskLink;
use crate::model::project::ProjectId;
use crate::model::task::{NewTask, Task, TaskId, TaskUid};
use crate::repo::link_repo::{LinkRepoError, LinkRepository};
use crate::repo::task_repo::{TaskDetails, TaskRepoError, TaskRepository};
use crate::service::chart_service::collect_subtask_records;
use chrono::{Duration, NaiveDateTime};
use log::warn;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors from schedule mutations.
#[derive(Debug)]
pub enum ScheduleError {
    /// Required capability check failed; nothing was written.
    PermissionDenied { action: &'static str },
    TaskNotFound(TaskId),
    TaskNotFoundByUuid(TaskUid),
    /// Create/re-parent requires a concrete project or task parent.
    ParentRequired,
    /// Re-parenting would make a task its own ancestor.
    WouldCreateCycle { task: TaskUid, parent: TaskUid },
    /// Progress input outside `[0.0, 1.0]`.
    ProgressOutOfRange(f64),
    /// Predecessor has no planned end to propagate from.
    UnscheduledPredecessor(TaskId),
    /// A batch write failed after earlier writes succeeded. Carries the ids
    /// already written so the caller can reconcile; no rollback is
    /// attempted.
    PartialBatch {
        completed: Vec<TaskId>,
        cause: Box<ScheduleError>,
    },
    /// Written record could not be read back.
    InconsistentState(&'static str),
    Tasks(TaskRepoError),
    Links(LinkRepoError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied { action } => write!(f, "not enough rights to {action}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskNotFoundByUuid(uuid) => write!(f, "task not found: {uuid}"),
            Self::ParentRequired => write!(f, "a project or task parent is required"),
            Self::WouldCreateCycle { task, parent } => write!(
                f,
                "moving task {task} under {parent} would create a parent cycle"
            ),
            Self::ProgressOutOfRange(value) => {
                write!(f, "progress {value} outside 0.0..=1.0")
            }
            Self::UnscheduledPredecessor(id) => {
                write!(f, "predecessor task {id} has no planned end date")
            }
            Self::PartialBatch { completed, cause } => write!(
                f,
                "batch stopped after {} completed record(s): {cause}",
                completed.len()
            ),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
            Self::Tasks(err) => write!(f, "{err}"),
            Self::Links(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PartialBatch { cause, .. } => Some(cause.as_ref()),
            Self::Tasks(err) => Some(err),
            Self::Links(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepoError> for ScheduleError {
    fn from(value: TaskRepoError) -> Self {
        match value {
            TaskRepoError::NotFound(id) => Self::TaskNotFound(id),
            TaskRepoError::NotFoundByUuid(uuid) => Self::TaskNotFoundByUuid(uuid),
            other => Self::Tasks(other),
        }
    }
}

impl From<LinkRepoError> for ScheduleError {
    fn from(value: LinkRepoError) -> Self {
        Self::Links(value)
    }
}

/// Request model for creating one task from chart input.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTaskRequest {
    /// Display label; becomes the task name.
    pub text: String,
    /// Target parent: a project, or a task whose project is inherited.
    pub parent: ParentRef,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// Completion ratio in `[0.0, 1.0]`.
    pub progress: f64,
    pub milestone: bool,
}

/// Request model for updating one task from chart input.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTaskRequest {
    pub id: TaskId,
    /// New name; `None` keeps the stored name.
    pub text: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// Completion ratio in `[0.0, 1.0]`.
    pub progress: f64,
    pub milestone: bool,
}

/// Scheduling facade over the task and link repositories.
pub struct ScheduleService<T, L, A>
where
    T: TaskRepository,
    L: LinkRepository,
    A: AccessPolicy,
{
    tasks: T,
    links: L,
    policy: A,
}

impl<T, L, A> ScheduleService<T, L, A>
where
    T: TaskRepository,
    L: LinkRepository,
    A: AccessPolicy,
{
    pub fn new(tasks: T, links: L, policy: A) -> Self {
        Self {
            tasks,
            links,
            policy,
        }
    }

    /// Creates one task under the requested parent.
    ///
    /// A task parent contributes both the parent link and the owning
    /// project; a project parent owns the task directly.
    pub fn create_task(&self, request: &CreateTaskRequest) -> ScheduleResult<Task> {
        if !self.policy.can_create_task() {
            return Err(ScheduleError::PermissionDenied {
                action: "create task",
            });
        }

        let (project_id, parent_task_id) = match request.parent {
            ParentRef::Task(parent_uuid) => {
                let parent = self.require_task_by_uuid(parent_uuid)?;
                (parent.project_id, Some(parent.id))
            }
            ParentRef::Project(project_id) if project_id > 0 => (project_id, None),
            ParentRef::Project(_) | ParentRef::None => return Err(ScheduleError::ParentRequired),
        };

        let task = self.tasks.create_task(&NewTask {
            project_id,
            parent_task_id,
            name: request.text.clone(),
            plan_start_date: request.start_date,
            plan_end_date: request.end_date,
            percent_done: progress_to_percent(request.progress)?,
            is_milestone: request.milestone,
            ..Default::default()
        })?;
        Ok(task)
    }

    /// Overwrites one task's dates, progress, name, and milestone flag.
    pub fn update_task(&self, request: &UpdateTaskRequest) -> ScheduleResult<Task> {
        let task = self.require_task(request.id)?;
        self.ensure_can_update(&task, "update task")?;

        let details = TaskDetails {
            name: request.text.clone().unwrap_or_else(|| task.name.clone()),
            plan_start_date: request.start_date,
            plan_end_date: request.end_date,
            percent_done: progress_to_percent(request.progress)?,
            is_milestone: request.milestone,
        };
        self.tasks.update_details(task.id, &details)?;

        self.tasks
            .get_task(task.id)?
            .ok_or(ScheduleError::InconsistentState(
                "updated task not found in read-back",
            ))
    }

    /// Recalculates the schedule of every direct dependency partner of one
    /// task and returns the updated successor records.
    ///
    /// Exactly one dependency hop is crossed per call; multi-hop chains must
    /// be driven by repeated mutations. There is no permission gate of its
    /// own; the caller's prior authorization is inherited.
    pub fn propagate_from_task(&self, task_id: TaskId) -> ScheduleResult<Vec<Task>> {
        let links = self.links.links_touching(&[task_id])?;

        let mut updated: Vec<Task> = Vec::new();
        for link in &links {
            let (prev_id, next_id) = link.orientation();
            match self.propagate_link(link, prev_id, next_id) {
                Ok(task) => updated.push(task),
                Err(cause) => return Err(batch_failure(task_ids(&updated), cause)),
            }
        }
        Ok(updated)
    }

    /// Moves one task (addressed by uuid) under a new parent.
    ///
    /// When the owning project changes, every descendant's project field is
    /// reassigned while descendant parent links stay untouched. Permission
    /// is checked on the moved task only; descendants ride on that decision
    /// by design.
    pub fn update_parent(&self, task_uuid: TaskUid, new_parent: ParentRef) -> ScheduleResult<Task> {
        let task = self.require_task_by_uuid(task_uuid)?;
        self.ensure_can_update(&task, "move task")?;

        match new_parent {
            ParentRef::Task(parent_uuid) => {
                let parent = self.require_task_by_uuid(parent_uuid)?;
                if self.would_create_cycle(&task, &parent)? {
                    return Err(ScheduleError::WouldCreateCycle {
                        task: task.uuid,
                        parent: parent.uuid,
                    });
                }

                let project_changed = parent.project_id != task.project_id;
                self.tasks
                    .reassign(task.id, parent.project_id, Some(parent.id))?;
                if project_changed {
                    self.cascade_project(&task, parent.project_id)?;
                }
            }
            ParentRef::Project(project_id) if project_id > 0 => {
                self.tasks.reassign(task.id, project_id, None)?;
                self.cascade_project(&task, project_id)?;
            }
            ParentRef::Project(_) | ParentRef::None => return Err(ScheduleError::ParentRequired),
        }

        self.tasks
            .get_task(task.id)?
            .ok_or(ScheduleError::InconsistentState(
                "moved task not found in read-back",
            ))
    }

    fn propagate_link(
        &self,
        link: &TaskLink,
        prev_id: TaskId,
        next_id: TaskId,
    ) -> ScheduleResult<Task> {
        let prev = self.require_task(prev_id)?;
        let mut next = self.require_task(next_id)?;

        let prev_end = prev
            .plan_end_date
            .ok_or(ScheduleError::UnscheduledPredecessor(prev.id))?;
        let new_start = prev_end + Duration::days(link.lag_days) - Duration::days(link.lead_days);
        let new_end = new_start + Duration::minutes(next.planned_duration_minutes);

        self.tasks.update_schedule(next.id, new_start, new_end)?;
        next.plan_start_date = Some(new_start);
        next.plan_end_date = Some(new_end);
        Ok(next)
    }

    /// Reassigns the whole subtree below `root` to `project_id`. The root's
    /// own reassignment must already have happened; its id leads the
    /// completed set reported on partial failure.
    fn cascade_project(&self, root: &Task, project_id: ProjectId) -> ScheduleResult<()> {
        let descendants =
            collect_subtask_records(&self.tasks, root.id).map_err(ScheduleError::from)?;

        let mut completed = vec![root.id];
        for task in &descendants {
            if let Err(err) = self.tasks.reassign_project(task.id, project_id) {
                return Err(batch_failure(completed, err.into()));
            }
            completed.push(task.id);
        }
        Ok(())
    }

    fn would_create_cycle(&self, task: &Task, parent: &Task) -> ScheduleResult<bool> {
        if parent.id == task.id {
            return Ok(true);
        }

        let mut visited = HashSet::new();
        let mut cursor = parent.parent_task_id;
        while let Some(current_id) = cursor {
            if current_id == task.id {
                return Ok(true);
            }
            if !visited.insert(current_id) {
                return Ok(true);
            }
            let current = self.require_task(current_id)?;
            cursor = current.parent_task_id;
        }
        Ok(false)
    }

    fn ensure_can_update(&self, task: &Task, action: &'static str) -> ScheduleResult<()> {
        if !self.policy.can_view_task(task) || !self.policy.can_update_task(task) {
            return Err(ScheduleError::PermissionDenied { action });
        }
        Ok(())
    }

    fn require_task(&self, id: TaskId) -> ScheduleResult<Task> {
        self.tasks
            .get_task(id)?
            .ok_or(ScheduleError::TaskNotFound(id))
    }

    fn require_task_by_uuid(&self, uuid: TaskUid) -> ScheduleResult<Task> {
        self.tasks
            .get_task_by_uuid(uuid)?
            .ok_or(ScheduleError::TaskNotFoundByUuid(uuid))
    }
}

fn batch_failure(completed: Vec<TaskId>, cause: ScheduleError) -> ScheduleError {
    if completed.is_empty() {
        return cause;
    }
    warn!(
        "event=schedule_batch module=schedule status=warn reason=partial_failure completed={} error={cause}",
        completed.len()
    );
    ScheduleError::PartialBatch {
        completed,
        cause: Box::new(cause),
    }
}

fn task_ids(tasks: &[Task]) -> Vec<TaskId> {
    tasks.iter().map(|task| task.id).collect()
}

fn progress_to_percent(progress: f64) -> ScheduleResult<i64> {
    if !(0.0..=1.0).contains(&progress) {
        return Err(ScheduleError::ProgressOutOfRange(progress));
    }
    Ok((progress * 100.0).round() as i64)
}
