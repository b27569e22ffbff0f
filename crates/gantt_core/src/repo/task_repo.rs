//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide task lookups by numeric id and stable uuid.
//! - Provide the per-project and per-parent listings the walks consume.
//! - Keep schedule/re-parent writes as narrow per-record statements.
//!
//! # Invariants
//! - The stable `uuid` is assigned on insert and never updated afterwards.
//! - Listings are deterministic: `id ASC` store order, no re-sort upstream.
//! - Write statements touching zero rows surface as `NotFound`.

use crate::db::DbError;
use crate::model::plan_date::{format_plan_date, parse_plan_date};
use crate::model::project::ProjectId;
use crate::model::task::{NewTask, Task, TaskId, TaskUid};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    uuid,
    project_id,
    parent_task_id,
    name,
    content,
    comment,
    plan_start_date,
    plan_end_date,
    planned_duration_minutes,
    percent_done,
    is_milestone,
    is_template
FROM project_tasks";

pub type TaskRepoResult<T> = Result<T, TaskRepoError>;

/// Errors from task persistence and query operations.
#[derive(Debug)]
pub enum TaskRepoError {
    Db(DbError),
    NotFound(TaskId),
    NotFoundByUuid(TaskUid),
    InvalidData(String),
}

impl Display for TaskRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::NotFoundByUuid(uuid) => write!(f, "task not found: {uuid}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for TaskRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::NotFoundByUuid(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for TaskRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TaskRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Detail fields overwritten by a task update.
#[derive(Debug, Clone)]
pub struct TaskDetails {
    pub name: String,
    pub plan_start_date: Option<NaiveDateTime>,
    pub plan_end_date: Option<NaiveDateTime>,
    pub percent_done: i64,
    pub is_milestone: bool,
}

/// Repository interface for task reads and narrow per-record writes.
pub trait TaskRepository {
    /// Inserts one task row, assigning its stable uuid, and returns the
    /// stored record.
    fn create_task(&self, task: &NewTask) -> TaskRepoResult<Task>;
    /// Loads one task by numeric id.
    fn get_task(&self, id: TaskId) -> TaskRepoResult<Option<Task>>;
    /// Loads one task by stable uuid.
    fn get_task_by_uuid(&self, uuid: TaskUid) -> TaskRepoResult<Option<Task>>;
    /// Lists every task of one project (all nesting levels) in store order.
    fn list_project_tasks(&self, project_id: ProjectId) -> TaskRepoResult<Vec<Task>>;
    /// Lists direct children of one task in store order.
    fn list_subtasks(&self, parent_task_id: TaskId) -> TaskRepoResult<Vec<Task>>;
    /// Overwrites name, plan dates, completion, and milestone flag.
    fn update_details(&self, id: TaskId, details: &TaskDetails) -> TaskRepoResult<()>;
    /// Overwrites only the planned schedule.
    fn update_schedule(
        &self,
        id: TaskId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> TaskRepoResult<()>;
    /// Moves one task to a project and optional parent task.
    fn reassign(
        &self,
        id: TaskId,
        project_id: ProjectId,
        parent_task_id: Option<TaskId>,
    ) -> TaskRepoResult<()>;
    /// Moves one task to another project, leaving its parent link untouched.
    fn reassign_project(&self, id: TaskId, project_id: ProjectId) -> TaskRepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> TaskRepoResult<Task> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO project_tasks (
                uuid,
                project_id,
                parent_task_id,
                name,
                content,
                comment,
                plan_start_date,
                plan_end_date,
                planned_duration_minutes,
                percent_done,
                is_milestone,
                is_template
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                uuid.to_string(),
                task.project_id,
                task.parent_task_id,
                task.name.as_str(),
                task.content.as_deref(),
                task.comment.as_deref(),
                task.plan_start_date.map(format_plan_date),
                task.plan_end_date.map(format_plan_date),
                task.planned_duration_minutes,
                task.percent_done,
                bool_to_int(task.is_milestone),
                bool_to_int(task.is_template),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.ok_or(TaskRepoError::NotFound(id))
    }

    fn get_task(&self, id: TaskId) -> TaskRepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn get_task_by_uuid(&self, uuid: TaskUid) -> TaskRepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_project_tasks(&self, project_id: ProjectId) -> TaskRepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} WHERE project_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn list_subtasks(&self, parent_task_id: TaskId) -> TaskRepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} WHERE parent_task_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([parent_task_id])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_details(&self, id: TaskId, details: &TaskDetails) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE project_tasks
             SET
                name = ?2,
                plan_start_date = ?3,
                plan_end_date = ?4,
                percent_done = ?5,
                is_milestone = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id,
                details.name.as_str(),
                details.plan_start_date.map(format_plan_date),
                details.plan_end_date.map(format_plan_date),
                details.percent_done,
                bool_to_int(details.is_milestone),
            ],
        )?;

        if changed == 0 {
            return Err(TaskRepoError::NotFound(id));
        }
        Ok(())
    }

    fn update_schedule(
        &self,
        id: TaskId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE project_tasks
             SET
                plan_start_date = ?2,
                plan_end_date = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, format_plan_date(start), format_plan_date(end)],
        )?;

        if changed == 0 {
            return Err(TaskRepoError::NotFound(id));
        }
        Ok(())
    }

    fn reassign(
        &self,
        id: TaskId,
        project_id: ProjectId,
        parent_task_id: Option<TaskId>,
    ) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE project_tasks
             SET
                project_id = ?2,
                parent_task_id = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, project_id, parent_task_id],
        )?;

        if changed == 0 {
            return Err(TaskRepoError::NotFound(id));
        }
        Ok(())
    }

    fn reassign_project(&self, id: TaskId, project_id: ProjectId) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE project_tasks
             SET
                project_id = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, project_id],
        )?;

        if changed == 0 {
            return Err(TaskRepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> TaskRepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        TaskRepoError::InvalidData(format!("invalid uuid `{uuid_text}` in project_tasks.uuid"))
    })?;

    Ok(Task {
        id: row.get("id")?,
        uuid,
        project_id: row.get("project_id")?,
        parent_task_id: row.get("parent_task_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        comment: row.get("comment")?,
        plan_start_date: parse_date_column(row, "plan_start_date")?,
        plan_end_date: parse_date_column(row, "plan_end_date")?,
        planned_duration_minutes: row.get("planned_duration_minutes")?,
        percent_done: row.get("percent_done")?,
        is_milestone: parse_flag(row, "is_milestone")?,
        is_template: parse_flag(row, "is_template")?,
    })
}

fn parse_date_column(row: &Row<'_>, column: &'static str) -> TaskRepoResult<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(column)? {
        None => Ok(None),
        Some(value) => parse_plan_date(&value).map(Some).map_err(|_| {
            TaskRepoError::InvalidData(format!(
                "invalid plan date `{value}` in project_tasks.{column}"
            ))
        }),
    }
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> TaskRepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TaskRepoError::InvalidData(format!(
            "invalid flag value `{other}` in project_tasks.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
