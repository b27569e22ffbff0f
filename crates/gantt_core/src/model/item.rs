//! Chart item projection.
//!
//! # Responsibility
//! - Define the flattened display node produced by the tree walk.
//! - Serialize the exact payload shape consumed by the rendering layer.
//!
//! # Invariants
//! - Items are rebuilt on every read and never persisted.
//! - `progress` stays within `[0.0, 1.0]`.
//! - `end_date >= start_date`, enforced at the mapping boundary.
//! - `parent` resolves to another item of the same traversal result or to a
//!   project id the caller recognizes.

use crate::model::project::ProjectId;
use crate::model::task::{TaskId, TaskUid};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Display node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Project,
    Task,
    Milestone,
}

/// Item identity: numeric for projects, stable UUID for tasks/milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemId {
    Project(ProjectId),
    Task(TaskUid),
}

impl Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Project(id) => serializer.serialize_i64(*id),
            Self::Task(uuid) => serializer.collect_str(uuid),
        }
    }
}

/// Typed parent reference replacing numeric/uuid value sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// No parent; serialized as `0` for chart consumers.
    None,
    Project(ProjectId),
    Task(TaskUid),
}

impl Serialize for ParentRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::None => serializer.serialize_i64(0),
            Self::Project(id) => serializer.serialize_i64(*id),
            Self::Task(uuid) => serializer.collect_str(uuid),
        }
    }
}

/// Flattened display node for one project, task, or milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub parent: ParentRef,
    #[serde(with = "crate::model::plan_date::as_plan_date")]
    pub start_date: NaiveDateTime,
    #[serde(with = "crate::model::plan_date::as_plan_date")]
    pub end_date: NaiveDateTime,
    pub text: String,
    /// Sanitized rich-text body; empty when the record has none.
    pub content: String,
    /// Free-text comment, passed through unsanitized.
    pub comment: String,
    /// Completion ratio in `[0.0, 1.0]`.
    pub progress: f64,
    /// Numeric task id backing link resolution; `None` for projects.
    /// Internal only, never serialized.
    #[serde(skip)]
    pub link_task_id: Option<TaskId>,
}
