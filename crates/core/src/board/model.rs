//! Board layout definitions
//!
//! Columns and the derived per-column view of the task collection.

use serde::{Deserialize, Serialize};

use crate::reorder::ordered_group;
use crate::task::{Task, TaskStatus};

/// A column on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusList {
    #[serde(rename = "_id", alias = "id")]
    pub id: TaskStatus,
    pub name: String,
    #[serde(default)]
    pub position: u32,
}

impl StatusList {
    pub fn new(id: TaskStatus, name: impl Into<String>, position: u32) -> Self {
        Self {
            id,
            name: name.into(),
            position,
        }
    }

    /// The three-column layout: To Do, In Progress, Done
    pub fn defaults() -> Vec<Self> {
        TaskStatus::ALL
            .iter()
            .enumerate()
            .map(|(rank, status)| Self::new(*status, status.display_name(), rank as u32))
            .collect()
    }
}

/// One column of a snapshot, tasks in display order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub name: String,
    pub tasks: Vec<Task>,
}

/// Materialized board view.
///
/// Always derived from the flat task collection; never the source of truth.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub columns: Vec<BoardColumn>,
}

impl BoardSnapshot {
    /// Group tasks under the given columns, in column order
    pub fn from_tasks(lists: &[StatusList], tasks: &[Task]) -> Self {
        let mut lists = lists.to_vec();
        lists.sort_by_key(|l| l.position);

        let columns = lists
            .into_iter()
            .map(|list| BoardColumn {
                status: list.id,
                name: list.name,
                tasks: ordered_group(tasks, list.id).into_iter().cloned().collect(),
            })
            .collect();

        Self { columns }
    }

    /// Get a column by status
    pub fn column(&self, status: TaskStatus) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.status == status)
    }

    /// Total number of tasks on the board
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.task_count() == 0
    }
}
