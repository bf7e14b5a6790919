//! Client-side task cache
//!
//! Holds the in-memory copy of the board's tasks for a session. Every mutation
//! replaces or patches the collection in one step and bumps `version`.

use crate::board::{BoardSnapshot, StatusList};
use crate::reorder::{normalize, ordered_group};
use crate::task::{Task, TaskStatus};
use crate::view::{filter_and_sort, SortMode};

/// In-memory task collection
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    version: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks, version: 0 }
    }

    /// Bulk-set from a fresh fetch
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.bump();
    }

    /// Set a precomputed collection without contacting the backend
    pub fn apply_local(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.bump();
    }

    /// Insert or replace a task by id
    pub fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        self.bump();
    }

    /// Remove a task; the remaining tasks of its column close the gap
    pub fn remove(&mut self, task_id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        let removed = self.tasks.remove(index);
        self.tasks = normalize(&self.tasks);
        self.bump();
        Some(removed)
    }

    /// Drop every task
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.bump();
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Mutation counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Tasks of one column sorted by position
    pub fn select_by_status(&self, status: TaskStatus) -> StatusView<'_> {
        StatusView {
            status,
            tasks: ordered_group(&self.tasks, status),
        }
    }

    /// Filtered and sorted list for presentation
    pub fn select(&self, filter: &str, sort: SortMode) -> Vec<&Task> {
        filter_and_sort(&self.tasks, filter, sort)
    }

    /// Derive the per-column view
    pub fn snapshot(&self, lists: &[StatusList]) -> BoardSnapshot {
        BoardSnapshot::from_tasks(lists, &self.tasks)
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// Read-only projection of one column.
///
/// Iterating does not consume the view; `iter` can be called any number of
/// times.
#[derive(Debug, Clone)]
pub struct StatusView<'a> {
    status: TaskStatus,
    tasks: Vec<&'a Task>,
}

impl<'a> StatusView<'a> {
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.tasks.iter().copied()
    }

    pub fn get(&self, index: usize) -> Option<&'a Task> {
        self.tasks.get(index).copied()
    }

    /// Index of a task within the column
    pub fn index_of(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<'a, 'v> IntoIterator for &'v StatusView<'a> {
    type Item = &'a Task;
    type IntoIter = std::iter::Copied<std::slice::Iter<'v, &'a Task>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter().copied()
    }
}
