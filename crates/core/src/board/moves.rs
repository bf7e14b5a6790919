//! Move descriptors
//!
//! `MoveEvent` is the loosely typed gesture as it arrives from the UI layer.
//! It is resolved once into a `MoveIntent` against the current tasks.

use serde::{Deserialize, Serialize};

use crate::reorder::{ordered_group, Location};
use crate::task::{Task, TaskPatch, TaskStatus};
use crate::{Error, Result};

/// A drag-and-drop gesture.
///
/// `dest_status` / `dest_index` are `None` when the task was dropped outside
/// any column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    pub task_id: String,
    pub source_status: String,
    pub source_index: usize,
    #[serde(default)]
    pub dest_status: Option<String>,
    #[serde(default)]
    pub dest_index: Option<usize>,
}

impl MoveEvent {
    /// Build a descriptor from typed locations
    pub fn new(task_id: impl Into<String>, source: Location, destination: Option<Location>) -> Self {
        Self {
            task_id: task_id.into(),
            source_status: source.status.as_str().to_string(),
            source_index: source.index,
            dest_status: destination.map(|d| d.status.as_str().to_string()),
            dest_index: destination.map(|d| d.index),
        }
    }

    /// Resolve against the current tasks.
    ///
    /// `Ok(None)` is a no-op: dropped outside, dropped where it started, or
    /// dropped past the end of a column. Unknown statuses or a task that is not
    /// at the source slot are validation errors.
    pub fn resolve(&self, tasks: &[Task]) -> Result<Option<MoveIntent>> {
        let (Some(dest_status), Some(dest_index)) = (&self.dest_status, self.dest_index) else {
            return Ok(None);
        };

        let source = Location::new(self.source_status.parse()?, self.source_index);
        let destination = Location::new(dest_status.parse()?, dest_index);
        if source == destination {
            return Ok(None);
        }

        let source_group = ordered_group(tasks, source.status);
        match source_group.get(source.index) {
            Some(task) if task.id == self.task_id => {}
            Some(_) | None if tasks.iter().any(|t| t.id == self.task_id) => {
                return Err(Error::Validation(format!(
                    "Task {} is not at {} #{}",
                    self.task_id, source.status, source.index
                )));
            }
            _ => {
                return Err(Error::Validation(format!(
                    "Unknown task {}",
                    self.task_id
                )));
            }
        }

        if source.status == destination.status {
            if destination.index >= source_group.len() {
                return Ok(None);
            }
            Ok(Some(MoveIntent::WithinStatus {
                task_id: self.task_id.clone(),
                status: source.status,
                from_index: source.index,
                to_index: destination.index,
            }))
        } else {
            if destination.index > ordered_group(tasks, destination.status).len() {
                return Ok(None);
            }
            Ok(Some(MoveIntent::AcrossStatus {
                task_id: self.task_id.clone(),
                from_status: source.status,
                from_index: source.index,
                to_status: destination.status,
                to_index: destination.index,
            }))
        }
    }
}

/// A validated move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveIntent {
    WithinStatus {
        task_id: String,
        status: TaskStatus,
        from_index: usize,
        to_index: usize,
    },
    AcrossStatus {
        task_id: String,
        from_status: TaskStatus,
        from_index: usize,
        to_status: TaskStatus,
        to_index: usize,
    },
}

impl MoveIntent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::WithinStatus { task_id, .. } | Self::AcrossStatus { task_id, .. } => task_id,
        }
    }

    pub fn source(&self) -> Location {
        match self {
            Self::WithinStatus {
                status, from_index, ..
            } => Location::new(*status, *from_index),
            Self::AcrossStatus {
                from_status,
                from_index,
                ..
            } => Location::new(*from_status, *from_index),
        }
    }

    pub fn destination(&self) -> Location {
        match self {
            Self::WithinStatus {
                status, to_index, ..
            } => Location::new(*status, *to_index),
            Self::AcrossStatus {
                to_status,
                to_index,
                ..
            } => Location::new(*to_status, *to_index),
        }
    }

    pub fn is_cross_status(&self) -> bool {
        matches!(self, Self::AcrossStatus { .. })
    }

    /// The update that persists this move
    pub fn patch(&self) -> TaskPatch {
        let destination = self.destination();
        let patch = TaskPatch::new(self.task_id()).with_position(destination.index as u32);
        if self.is_cross_status() {
            patch.with_status(destination.status)
        } else {
            patch
        }
    }
}
