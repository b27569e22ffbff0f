//! Dependency link model.
//!
//! # Responsibility
//! - Mirror the persisted task-to-task dependency row.
//! - Provide the chart-ready link projection with stable task identities.
//!
//! # Invariants
//! - `lag_days` pushes the successor later, `lead_days` pulls it earlier.
//! - Predecessor/successor orientation is derived from the link type, never
//!   stored separately.

use crate::model::task::{TaskId, TaskUid};
use serde::{Serialize, Serializer};

/// Numeric link identity.
pub type LinkId = i64;

/// Dependency kind between two tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkType {
    /// The source task must finish before the target task starts.
    #[default]
    FinishToStart,
    /// The target task must finish before the source task starts.
    StartToFinish,
}

impl LinkType {
    /// Stable numeric form used in storage and on the wire.
    pub fn as_db(self) -> i64 {
        match self {
            Self::FinishToStart => 0,
            Self::StartToFinish => 1,
        }
    }

    /// Parses the stable numeric form.
    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::FinishToStart),
            1 => Some(Self::StartToFinish),
            _ => None,
        }
    }
}

impl Serialize for LinkType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.as_db())
    }
}

/// Persisted dependency edge between two tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLink {
    pub id: LinkId,
    pub source_task_id: TaskId,
    pub target_task_id: TaskId,
    pub kind: LinkType,
    pub lag_days: i64,
    pub lead_days: i64,
}

impl TaskLink {
    /// Returns `(predecessor, successor)` task ids for date propagation.
    ///
    /// FinishToStart feeds the target from the source; StartToFinish
    /// reverses the roles.
    pub fn orientation(&self) -> (TaskId, TaskId) {
        match self.kind {
            LinkType::FinishToStart => (self.source_task_id, self.target_task_id),
            LinkType::StartToFinish => (self.target_task_id, self.source_task_id),
        }
    }
}

/// Insert payload for one dependency edge.
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub source_task_id: TaskId,
    pub target_task_id: TaskId,
    pub kind: LinkType,
    pub lag_days: i64,
    pub lead_days: i64,
}

/// Chart-ready link projection. Endpoints are task UUIDs so they resolve
/// against `Item` identities in the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub id: LinkId,
    pub source: TaskUid,
    pub target: TaskUid,
    #[serde(rename = "type")]
    pub kind: LinkType,
    pub lag: i64,
    pub lead: i64,
}

#[cfg(test)]
mod tests {
    use super::{LinkType, TaskLink};

    fn link(kind: LinkType) -> TaskLink {
        TaskLink {
            id: 1,
            source_task_id: 10,
            target_task_id: 20,
            kind,
            lag_days: 0,
            lead_days: 0,
        }
    }

    #[test]
    fn finish_to_start_feeds_target_from_source() {
        assert_eq!(link(LinkType::FinishToStart).orientation(), (10, 20));
    }

    #[test]
    fn start_to_finish_reverses_roles() {
        assert_eq!(link(LinkType::StartToFinish).orientation(), (20, 10));
    }

    #[test]
    fn numeric_codec_round_trips() {
        assert_eq!(LinkType::from_db(0), Some(LinkType::FinishToStart));
        assert_eq!(LinkType::from_db(1), Some(LinkType::StartToFinish));
        assert_eq!(LinkType::from_db(7), None);
        assert_eq!(LinkType::StartToFinish.as_db(), 1);
    }
}
