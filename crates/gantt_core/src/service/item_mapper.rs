//! Record-to-item mapping.
//!
//! # Responsibility
//! - Convert one project or task record into a chart item.
//! - Derive type, stable identity, parent reference, date defaults, and
//!   progress.
//!
//! # Invariants
//! - A record flagged as milestone always maps to a milestone item,
//!   regardless of the caller's hint.
//! - Emitted items satisfy `end_date >= start_date` and
//!   `progress ∈ [0.0, 1.0]`; records violating either are rejected, never
//!   silently accepted.
//! - Mapping is deterministic for a fixed store state and reference time.

use crate::model::item::{Item, ItemId, ItemType, ParentRef};
use crate::model::project::Project;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{TaskRepoError, TaskRepository};
use crate::sanitize::RichTextSanitizer;
use chrono::{Duration, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Where a project sits in the traversal that is mapping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPlacement {
    /// Top of the requested tree; the item gets no parent reference.
    Root,
    /// Nested below another project.
    Nested,
}

/// Caller hint for mapping a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTypeHint {
    Task,
    Milestone,
}

pub type MapResult<T> = Result<T, MapError>;

/// Mapping-boundary failures.
#[derive(Debug)]
pub enum MapError {
    /// `percent_done` outside `0..=100`.
    PercentOutOfRange {
        entity: &'static str,
        id: i64,
        percent: i64,
    },
    /// Record carries an explicit end before its start.
    EndBeforeStart { entity: &'static str, id: i64 },
    /// Parent task reference does not resolve.
    ParentTaskNotFound(TaskId),
    /// Task lookup failed below the mapping layer.
    Tasks(TaskRepoError),
}

impl Display for MapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PercentOutOfRange {
                entity,
                id,
                percent,
            } => write!(f, "{entity} {id} has percent_done {percent} outside 0..=100"),
            Self::EndBeforeStart { entity, id } => {
                write!(f, "{entity} {id} has plan end before plan start")
            }
            Self::ParentTaskNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::Tasks(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tasks(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepoError> for MapError {
    fn from(value: TaskRepoError) -> Self {
        Self::Tasks(value)
    }
}

/// Maps records into chart items against a fixed reference time.
///
/// The reference time is injected by the caller; the mapper never reads
/// ambient clock state.
pub struct ItemMapper<'a, T: TaskRepository, S: RichTextSanitizer> {
    tasks: &'a T,
    sanitizer: &'a S,
    now: NaiveDateTime,
}

impl<'a, T: TaskRepository, S: RichTextSanitizer> ItemMapper<'a, T, S> {
    pub fn new(tasks: &'a T, sanitizer: &'a S, now: NaiveDateTime) -> Self {
        Self {
            tasks,
            sanitizer,
            now,
        }
    }

    /// Maps one project record.
    pub fn project_item(&self, project: &Project, placement: ProjectPlacement) -> MapResult<Item> {
        let (start_date, end_date) = self.item_dates(
            project.plan_start_date,
            project.plan_end_date,
            "project",
            project.id,
        )?;

        let parent = match placement {
            ProjectPlacement::Root => ParentRef::None,
            ProjectPlacement::Nested => project
                .parent_id
                .map(ParentRef::Project)
                .unwrap_or(ParentRef::None),
        };

        Ok(Item {
            id: ItemId::Project(project.id),
            kind: ItemType::Project,
            parent,
            start_date,
            end_date,
            text: project.name.clone(),
            content: self.sanitized_content(project.content.as_deref()),
            comment: project.comment.clone().unwrap_or_default(),
            progress: progress_ratio(project.percent_done, "project", project.id)?,
            link_task_id: None,
        })
    }

    /// Maps one task record.
    ///
    /// Resolves the parent task's uuid with one repository lookup when the
    /// record is nested under a task.
    pub fn task_item(&self, task: &Task, hint: TaskTypeHint) -> MapResult<Item> {
        let kind = if task.is_milestone {
            ItemType::Milestone
        } else {
            match hint {
                TaskTypeHint::Task => ItemType::Task,
                TaskTypeHint::Milestone => ItemType::Milestone,
            }
        };

        let parent = match task.parent_task_id {
            Some(parent_id) => {
                let parent = self
                    .tasks
                    .get_task(parent_id)?
                    .ok_or(MapError::ParentTaskNotFound(parent_id))?;
                ParentRef::Task(parent.uuid)
            }
            None => ParentRef::Project(task.project_id),
        };

        let (start_date, end_date) =
            self.item_dates(task.plan_start_date, task.plan_end_date, "task", task.id)?;

        Ok(Item {
            id: ItemId::Task(task.uuid),
            kind,
            parent,
            start_date,
            end_date,
            text: task.name.clone(),
            content: self.sanitized_content(task.content.as_deref()),
            comment: task.comment.clone().unwrap_or_default(),
            progress: progress_ratio(task.percent_done, "task", task.id)?,
            link_task_id: Some(task.id),
        })
    }

    fn item_dates(
        &self,
        plan_start: Option<NaiveDateTime>,
        plan_end: Option<NaiveDateTime>,
        entity: &'static str,
        id: i64,
    ) -> MapResult<(NaiveDateTime, NaiveDateTime)> {
        let start = plan_start.unwrap_or(self.now);
        let end = plan_end.unwrap_or_else(|| start + Duration::days(1));
        if end < start {
            return Err(MapError::EndBeforeStart { entity, id });
        }
        Ok((start, end))
    }

    fn sanitized_content(&self, content: Option<&str>) -> String {
        match content {
            Some(value) => self.sanitizer.sanitize(value),
            None => String::new(),
        }
    }
}

fn progress_ratio(percent_done: i64, entity: &'static str, id: i64) -> MapResult<f64> {
    if !(0..=100).contains(&percent_done) {
        return Err(MapError::PercentOutOfRange {
            entity,
            id,
            percent: percent_done,
        });
    }
    Ok(percent_done as f64 / 100.0)
}
