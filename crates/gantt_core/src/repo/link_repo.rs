//! Dependency link repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the single batched fetch of links touching a task set.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - An empty id set performs no query and returns an empty list.
//! - Listings are deterministic: `id ASC` store order.

use crate::db::DbError;
use crate::model::link::{LinkType, NewLink, TaskLink};
use crate::model::task::TaskId;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LINK_SELECT_SQL: &str = "SELECT
    id,
    source_task_id,
    target_task_id,
    link_type,
    lag_days,
    lead_days
FROM task_links";

pub type LinkRepoResult<T> = Result<T, LinkRepoError>;

/// Errors from link persistence and query operations.
#[derive(Debug)]
pub enum LinkRepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for LinkRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted link data: {message}"),
        }
    }
}

impl Error for LinkRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for LinkRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LinkRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for dependency links.
pub trait LinkRepository {
    /// Inserts one dependency edge and returns the stored record.
    fn create_link(&self, link: &NewLink) -> LinkRepoResult<TaskLink>;
    /// Fetches every link whose source or target falls into the id set, in
    /// one batched query.
    fn links_touching(&self, task_ids: &[TaskId]) -> LinkRepoResult<Vec<TaskLink>>;
}

/// SQLite-backed link repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn create_link(&self, link: &NewLink) -> LinkRepoResult<TaskLink> {
        self.conn.execute(
            "INSERT INTO task_links (
                source_task_id,
                target_task_id,
                link_type,
                lag_days,
                lead_days
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                link.source_task_id,
                link.target_task_id,
                link.kind.as_db(),
                link.lag_days,
                link.lead_days,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        let mut stmt = self
            .conn
            .prepare(&format!("{LINK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_link_row(row),
            None => Err(LinkRepoError::InvalidData(format!(
                "link {id} missing after insert"
            ))),
        }
    }

    fn links_touching(&self, task_ids: &[TaskId]) -> LinkRepoResult<Vec<TaskLink>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; task_ids.len()].join(", ");
        let sql = format!(
            "{LINK_SELECT_SQL}
             WHERE source_task_id IN ({placeholders})
                OR target_task_id IN ({placeholders})
             ORDER BY id ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(task_ids.iter().chain(task_ids.iter())))?;

        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row(row)?);
        }
        Ok(links)
    }
}

fn parse_link_row(row: &Row<'_>) -> LinkRepoResult<TaskLink> {
    let kind_value: i64 = row.get("link_type")?;
    let kind = LinkType::from_db(kind_value).ok_or_else(|| {
        LinkRepoError::InvalidData(format!(
            "invalid link type `{kind_value}` in task_links.link_type"
        ))
    })?;

    Ok(TaskLink {
        id: row.get("id")?,
        source_task_id: row.get("source_task_id")?,
        target_task_id: row.get("target_task_id")?,
        kind,
        lag_days: row.get("lag_days")?,
        lead_days: row.get("lead_days")?,
    })
}
