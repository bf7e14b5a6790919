//! Drag-and-drop reordering
//!
//! Pure functions that compute a new task collection from a move. Nothing in
//! here reads the clock or touches I/O, so the same input always produces the
//! same output. Invalid input never errors; it degrades to returning the
//! collection unchanged.
//!
//! Positions are 0-based and dense within a status group after every move.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::StatusList;
use crate::task::{Task, TaskStatus};

/// A slot on the board: a column and a 0-based index within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub status: TaskStatus,
    pub index: usize,
}

impl Location {
    pub fn new(status: TaskStatus, index: usize) -> Self {
        Self { status, index }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.status, self.index)
    }
}

fn column_index(status: TaskStatus) -> usize {
    TaskStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or_default()
}

/// Tasks of one status in display order.
///
/// Sorted by position; the sort is stable so duplicate ranks keep their
/// collection order.
pub fn ordered_group(tasks: &[Task], status: TaskStatus) -> Vec<&Task> {
    let mut group: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
    group.sort_by_key(|t| t.position);
    group
}

/// Where a task currently sits on the board
pub fn locate(tasks: &[Task], task_id: &str) -> Option<Location> {
    tasks.iter().find(|t| t.id == task_id).and_then(|task| {
        ordered_group(tasks, task.status)
            .iter()
            .position(|t| t.id == task_id)
            .map(|index| Location::new(task.status, index))
    })
}

fn split(tasks: &[Task]) -> Vec<Vec<Task>> {
    TaskStatus::ALL
        .iter()
        .map(|status| ordered_group(tasks, *status).into_iter().cloned().collect())
        .collect()
}

fn rerank(group: &mut [Task]) {
    for (rank, task) in group.iter_mut().enumerate() {
        task.position = rank as u32;
    }
}

fn join(groups: Vec<Vec<Task>>) -> Vec<Task> {
    groups.into_iter().flatten().collect()
}

/// Apply a drag-and-drop move.
///
/// A missing destination, an identical source and destination, or an index
/// outside its group all return the input unchanged.
pub fn apply_move(tasks: &[Task], source: Location, destination: Option<Location>) -> Vec<Task> {
    let Some(destination) = destination else {
        return tasks.to_vec();
    };
    if source == destination {
        return tasks.to_vec();
    }

    let mut groups = split(tasks);
    let from = column_index(source.status);
    let to = column_index(destination.status);

    if source.index >= groups[from].len() {
        return tasks.to_vec();
    }

    if from == to {
        let group = &mut groups[from];
        // the group shrinks by one before the insert
        if destination.index >= group.len() {
            return tasks.to_vec();
        }
        let moved = group.remove(source.index);
        group.insert(destination.index, moved);
        rerank(group);
    } else {
        if destination.index > groups[to].len() {
            return tasks.to_vec();
        }
        let mut moved = groups[from].remove(source.index);
        moved.status = destination.status;
        groups[to].insert(destination.index, moved);
        rerank(&mut groups[from]);
        rerank(&mut groups[to]);
    }

    join(groups)
}

/// Move a task by id to a status and index.
///
/// The index is clamped to the end of the target group. Unknown ids leave the
/// collection unchanged.
pub fn relocate(tasks: &[Task], task_id: &str, status: TaskStatus, index: usize) -> Vec<Task> {
    let Some(source) = locate(tasks, task_id) else {
        return tasks.to_vec();
    };

    let mut groups = split(tasks);
    let from = column_index(source.status);
    let to = column_index(status);

    let mut moved = groups[from].remove(source.index);
    moved.status = status;
    let index = index.min(groups[to].len());
    groups[to].insert(index, moved);

    rerank(&mut groups[from]);
    if from != to {
        rerank(&mut groups[to]);
    }

    join(groups)
}

/// Re-rank every group densely, keeping display order
pub fn normalize(tasks: &[Task]) -> Vec<Task> {
    let mut groups = split(tasks);
    for group in groups.iter_mut() {
        rerank(group);
    }
    join(groups)
}

/// Move a column from one index to another, re-ranking all columns
pub fn reorder_columns(lists: &[StatusList], from: usize, to: usize) -> Vec<StatusList> {
    let mut ordered = lists.to_vec();
    ordered.sort_by_key(|l| l.position);

    if from == to || from >= ordered.len() || to >= ordered.len() {
        return ordered;
    }

    let moved = ordered.remove(from);
    ordered.insert(to, moved);
    for (rank, list) in ordered.iter_mut().enumerate() {
        list.position = rank as u32;
    }
    ordered
}
