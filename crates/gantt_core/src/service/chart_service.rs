//! Chart materialization use-case service.
//!
//! # Responsibility
//! - Flatten the project/task hierarchy into the ordered item list consumed
//!   by the rendering layer.
//! - Resolve the dependency links touching one item set in a single batched
//!   fetch.
//!
//! # Invariants
//! - The project walk is pre-order: a node appears after its ancestor chain
//!   and before its own descendants.
//! - A project the policy denies view on is skipped silently together with
//!   its entire subtree; there is no partial emission.
//! - Walks run on an explicit worklist with a visited set; a repeated
//!   identity is logged and skipped instead of recursed, so a corrupted
//!   store cannot hang or overflow the walk.

use crate::access::AccessPolicy;
use crate::model::item::{Item, ItemId, ItemType};
use crate::model::link::Link;
use crate::model::project::{Project, ProjectId};
use crate::model::task::{Task, TaskId, TaskUid};
use crate::repo::link_repo::{LinkRepoError, LinkRepository};
use crate::repo::project_repo::{ProjectRepoError, ProjectRepository};
use crate::repo::task_repo::{TaskRepoError, TaskRepository};
use crate::sanitize::RichTextSanitizer;
use crate::service::item_mapper::{ItemMapper, MapError, ProjectPlacement, TaskTypeHint};
use chrono::NaiveDateTime;
use log::warn;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Requested extent of one chart build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Every root-level project eligible for the global view.
    All,
    /// One project and its subtree.
    Project(ProjectId),
}

pub type ChartResult<T> = Result<T, ChartError>;

/// Errors from chart materialization.
#[derive(Debug)]
pub enum ChartError {
    /// Directly requested project does not resolve.
    ProjectNotFound(ProjectId),
    /// Link endpoint does not resolve to a stored task.
    TaskNotFound(TaskId),
    /// Mapping-boundary rejection.
    Map(MapError),
    Projects(ProjectRepoError),
    Tasks(TaskRepoError),
    Links(LinkRepoError),
}

impl Display for ChartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Map(err) => write!(f, "{err}"),
            Self::Projects(err) => write!(f, "{err}"),
            Self::Tasks(err) => write!(f, "{err}"),
            Self::Links(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Map(err) => Some(err),
            Self::Projects(err) => Some(err),
            Self::Tasks(err) => Some(err),
            Self::Links(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MapError> for ChartError {
    fn from(value: MapError) -> Self {
        Self::Map(value)
    }
}

impl From<ProjectRepoError> for ChartError {
    fn from(value: ProjectRepoError) -> Self {
        Self::Projects(value)
    }
}

impl From<TaskRepoError> for ChartError {
    fn from(value: TaskRepoError) -> Self {
        Self::Tasks(value)
    }
}

impl From<LinkRepoError> for ChartError {
    fn from(value: LinkRepoError) -> Self {
        Self::Links(value)
    }
}

/// Chart-building facade over the repositories, the access policy, and the
/// rich-text sanitizer.
pub struct ChartService<P, T, L, A, S>
where
    P: ProjectRepository,
    T: TaskRepository,
    L: LinkRepository,
    A: AccessPolicy,
    S: RichTextSanitizer,
{
    projects: P,
    tasks: T,
    links: L,
    policy: A,
    sanitizer: S,
}

impl<P, T, L, A, S> ChartService<P, T, L, A, S>
where
    P: ProjectRepository,
    T: TaskRepository,
    L: LinkRepository,
    A: AccessPolicy,
    S: RichTextSanitizer,
{
    pub fn new(projects: P, tasks: T, links: L, policy: A, sanitizer: S) -> Self {
        Self {
            projects,
            tasks,
            links,
            policy,
            sanitizer,
        }
    }

    /// Builds the flat, pre-ordered item list for the requested scope.
    ///
    /// `now` is the reference time substituted for records without a planned
    /// start; injecting it keeps the build reproducible.
    pub fn build_for_project(
        &self,
        scope: ProjectScope,
        now: NaiveDateTime,
    ) -> ChartResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();

        match scope {
            ProjectScope::All => {
                for root in self.projects.list_root_projects()? {
                    self.walk_project(root, &mut items, &mut visited, now)?;
                }
            }
            ProjectScope::Project(id) => {
                let project = self
                    .projects
                    .get_project(id)?
                    .ok_or(ChartError::ProjectNotFound(id))?;
                self.walk_project(project, &mut items, &mut visited, now)?;
            }
        }

        Ok(items)
    }

    /// Builds items for every descendant of one task, children before their
    /// parent (post-order).
    ///
    /// Callers relying on parent-before-child ordering must re-sort; the
    /// re-parent cascade consumes this order as-is.
    pub fn build_subtasks_of(&self, task_id: TaskId, now: NaiveDateTime) -> ChartResult<Vec<Item>> {
        let mapper = ItemMapper::new(&self.tasks, &self.sanitizer, now);
        let mut items = Vec::new();
        for task in collect_subtask_records(&self.tasks, task_id)? {
            if task.is_template || !self.policy.can_view_task(&task) {
                continue;
            }
            items.push(mapper.task_item(&task, TaskTypeHint::Task)?);
        }
        Ok(items)
    }

    /// Fetches the dependency links touching the given item set.
    ///
    /// Returns an empty list without querying when the set holds no task
    /// items.
    pub fn links_for(&self, items: &[Item]) -> ChartResult<Vec<Link>> {
        let mut task_ids = Vec::new();
        let mut uuid_by_id: HashMap<TaskId, TaskUid> = HashMap::new();
        for item in items {
            if item.kind == ItemType::Project {
                continue;
            }
            let Some(task_id) = item.link_task_id else {
                continue;
            };
            task_ids.push(task_id);
            if let ItemId::Task(uuid) = item.id {
                uuid_by_id.insert(task_id, uuid);
            }
        }

        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut links = Vec::new();
        for row in self.links.links_touching(&task_ids)? {
            let source = self.task_uid(&mut uuid_by_id, row.source_task_id)?;
            let target = self.task_uid(&mut uuid_by_id, row.target_task_id)?;
            links.push(Link {
                id: row.id,
                source,
                target,
                kind: row.kind,
                lag: row.lag_days,
                lead: row.lead_days,
            });
        }
        Ok(links)
    }

    fn walk_project(
        &self,
        start: Project,
        items: &mut Vec<Item>,
        visited: &mut HashSet<ProjectId>,
        now: NaiveDateTime,
    ) -> ChartResult<()> {
        let mapper = ItemMapper::new(&self.tasks, &self.sanitizer, now);
        let mut stack = vec![(start, ProjectPlacement::Root)];

        while let Some((project, placement)) = stack.pop() {
            if !visited.insert(project.id) {
                warn!(
                    "event=tree_walk module=chart status=warn reason=cycle_detected project={}",
                    project.id
                );
                continue;
            }
            if !self.policy.can_view_project(&project) {
                continue;
            }

            items.push(mapper.project_item(&project, placement)?);

            for task in self.tasks.list_project_tasks(project.id)? {
                if task.is_template || !self.policy.can_view_task(&task) {
                    continue;
                }
                items.push(mapper.task_item(&task, TaskTypeHint::Task)?);
            }

            let subprojects = self.projects.list_subprojects(project.id)?;
            for subproject in subprojects.into_iter().rev() {
                stack.push((subproject, ProjectPlacement::Nested));
            }
        }

        Ok(())
    }

    fn task_uid(
        &self,
        known: &mut HashMap<TaskId, TaskUid>,
        task_id: TaskId,
    ) -> ChartResult<TaskUid> {
        if let Some(uuid) = known.get(&task_id) {
            return Ok(*uuid);
        }
        let task = self
            .tasks
            .get_task(task_id)?
            .ok_or(ChartError::TaskNotFound(task_id))?;
        known.insert(task_id, task.uuid);
        Ok(task.uuid)
    }
}

/// Collects every descendant task record of `task_id`, children before their
/// parent (post-order), without any visibility filtering.
///
/// Shared by the item projection above and the re-parent cascade in the
/// schedule service. Runs on an explicit worklist; a repeated id is logged
/// and skipped.
pub fn collect_subtask_records<T: TaskRepository>(
    tasks: &T,
    task_id: TaskId,
) -> Result<Vec<Task>, TaskRepoError> {
    enum Frame {
        Enter(Task),
        Emit(Task),
    }

    let mut visited = HashSet::from([task_id]);
    let mut collected = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for child in tasks.list_subtasks(task_id)?.into_iter().rev() {
        stack.push(Frame::Enter(child));
    }

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(task) => {
                if !visited.insert(task.id) {
                    warn!(
                        "event=subtask_walk module=chart status=warn reason=cycle_detected task={}",
                        task.id
                    );
                    continue;
                }
                let children = tasks.list_subtasks(task.id)?;
                stack.push(Frame::Emit(task));
                for child in children.into_iter().rev() {
                    stack.push(Frame::Enter(child));
                }
            }
            Frame::Emit(task) => collected.push(task),
        }
    }

    Ok(collected)
}
