//! File-based task storage implementation
//!
//! Stores the board's tasks as JSON in a file on disk, in board order. This is
//! the durable side of the gateway: the reference server persists through it
//! and tests use it as an in-process backend.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::model::{validate_title, Task, TaskPatch, TaskStatus};
use crate::gateway::BackendGateway;
use crate::reorder::{locate, normalize, ordered_group, relocate};
use crate::view::{filter_and_sort, ListQuery};
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of tasks
    cache: RwLock<Vec<Task>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tasks: Vec<Task> = serde_json::from_str(&content)?;
            normalize(&tasks)
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Write `tasks` to disk.
    ///
    /// Callers hold the cache write guard until this returns so snapshots
    /// reach the file in mutation order.
    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_string_pretty(tasks)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error(e))?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.storage_error(e))?;
        Ok(())
    }

    fn storage_error(&self, err: std::io::Error) -> Error {
        Error::Storage(format!("Failed to write {}: {}", self.path.display(), err))
    }

    /// Number of stored tasks
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

#[async_trait]
impl BackendGateway for FileTaskStore {
    async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        let filter = query.search_text().unwrap_or_default();
        Ok(filter_and_sort(cache.iter(), filter, query.sort)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let cache = self.cache.read().await;
        cache
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    async fn create_task(&self, title: &str, description: &str) -> Result<Task> {
        validate_title(title)?;

        let mut cache = self.cache.write().await;
        let position = ordered_group(&cache, TaskStatus::Todo).len() as u32;
        let task = Task::new(Task::generate_id(), title.trim())
            .with_description(description)
            .with_position(position);
        cache.push(task.clone());
        *cache = normalize(&cache);

        self.persist(&cache).await?;
        Ok(task)
    }

    async fn update_task(&self, patch: TaskPatch) -> Result<Task> {
        let mut cache = self.cache.write().await;
        let Some(current) = locate(&cache, &patch.id) else {
            return Err(Error::TaskNotFound(patch.id.clone()));
        };

        if let Some(task) = cache.iter_mut().find(|t| t.id == patch.id) {
            patch.apply_fields(task)?;
            task.updated_at = Some(Utc::now());
        }

        if patch.moves_task() {
            let status = patch.status.unwrap_or(current.status);
            let index = patch
                .position
                .map(|p| p as usize)
                .unwrap_or(current.index);
            *cache = relocate(&cache, &patch.id, status, index);
        }

        let updated = cache
            .iter()
            .find(|t| t.id == patch.id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(patch.id.clone()))?;

        self.persist(&cache).await?;
        Ok(updated)
    }

    async fn delete_task(&self, id: &str) -> Result<String> {
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|t| t.id != id);
        if cache.len() == before {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        *cache = normalize(&cache);

        self.persist(&cache).await?;
        Ok(id.to_string())
    }
}
