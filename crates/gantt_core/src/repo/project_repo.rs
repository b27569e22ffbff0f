//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide project lookups and the filtered listings the tree walk needs.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Root/global listings exclude templates and deleted projects.
//! - Direct id lookup applies no visibility filter; visibility is the
//!   caller's policy decision.

use crate::db::DbError;
use crate::model::plan_date::{format_plan_date, parse_plan_date};
use crate::model::project::{NewProject, Project, ProjectId};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    parent_id,
    name,
    content,
    comment,
    plan_start_date,
    plan_end_date,
    percent_done,
    show_on_global_view,
    is_template,
    is_deleted
FROM projects";

pub type ProjectRepoResult<T> = Result<T, ProjectRepoError>;

/// Errors from project persistence and query operations.
#[derive(Debug)]
pub enum ProjectRepoError {
    Db(DbError),
    NotFound(ProjectId),
    InvalidData(String),
}

impl Display for ProjectRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for ProjectRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for ProjectRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProjectRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for project reads used by the tree walk, plus the
/// create path used to seed a store.
pub trait ProjectRepository {
    /// Inserts one project row and returns the stored record.
    fn create_project(&self, project: &NewProject) -> ProjectRepoResult<Project>;
    /// Loads one project by numeric id, regardless of flags.
    fn get_project(&self, id: ProjectId) -> ProjectRepoResult<Option<Project>>;
    /// Lists root-level projects eligible for the global chart.
    fn list_root_projects(&self) -> ProjectRepoResult<Vec<Project>>;
    /// Lists direct, non-template, non-deleted sub-projects in store order.
    fn list_subprojects(&self, parent_id: ProjectId) -> ProjectRepoResult<Vec<Project>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &NewProject) -> ProjectRepoResult<Project> {
        self.conn.execute(
            "INSERT INTO projects (
                parent_id,
                name,
                content,
                comment,
                plan_start_date,
                plan_end_date,
                percent_done,
                show_on_global_view,
                is_template,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                project.parent_id,
                project.name.as_str(),
                project.content.as_deref(),
                project.comment.as_deref(),
                project.plan_start_date.map(format_plan_date),
                project.plan_end_date.map(format_plan_date),
                project.percent_done,
                bool_to_int(project.show_on_global_view),
                bool_to_int(project.is_template),
                bool_to_int(project.is_deleted),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_project(id)?.ok_or(ProjectRepoError::NotFound(id))
    }

    fn get_project(&self, id: ProjectId) -> ProjectRepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_root_projects(&self) -> ProjectRepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE parent_id IS NULL
               AND show_on_global_view = 1
               AND is_template = 0
               AND is_deleted = 0
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn list_subprojects(&self, parent_id: ProjectId) -> ProjectRepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE parent_id = ?1
               AND is_template = 0
               AND is_deleted = 0
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([parent_id])?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }
}

fn parse_project_row(row: &Row<'_>) -> ProjectRepoResult<Project> {
    Ok(Project {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        comment: row.get("comment")?,
        plan_start_date: parse_date_column(row, "plan_start_date")?,
        plan_end_date: parse_date_column(row, "plan_end_date")?,
        percent_done: row.get("percent_done")?,
        show_on_global_view: parse_flag(row, "show_on_global_view")?,
        is_template: parse_flag(row, "is_template")?,
        is_deleted: parse_flag(row, "is_deleted")?,
    })
}

fn parse_date_column(
    row: &Row<'_>,
    column: &'static str,
) -> ProjectRepoResult<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(column)? {
        None => Ok(None),
        Some(value) => parse_plan_date(&value).map(Some).map_err(|_| {
            ProjectRepoError::InvalidData(format!(
                "invalid plan date `{value}` in projects.{column}"
            ))
        }),
    }
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> ProjectRepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ProjectRepoError::InvalidData(format!(
            "invalid flag value `{other}` in projects.{column}"
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
