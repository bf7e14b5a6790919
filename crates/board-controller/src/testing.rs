//! Scriptable in-memory backend for controller tests

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use tb_core::gateway::BackendGateway;
use tb_core::reorder::{locate, normalize, ordered_group, relocate};
use tb_core::task::{Task, TaskPatch, TaskStatus};
use tb_core::view::{filter_and_sort, ListQuery};
use tb_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ListQuery),
    Get(String),
    Create(String),
    Update(TaskPatch),
    Delete(String),
}

pub fn task(id: &str, status: TaskStatus, position: u32) -> Task {
    let created_at: DateTime<Utc> = "2024-03-01T09:00:00Z".parse().unwrap();
    Task::new(id, id)
        .with_status(status)
        .with_position(position)
        .with_created_at(created_at)
}

/// A and B in To Do, C in Done
pub fn seeded() -> Vec<Task> {
    vec![
        task("A", TaskStatus::Todo, 0),
        task("B", TaskStatus::Todo, 1),
        task("C", TaskStatus::Done, 0),
    ]
}

/// Backend double that records calls and replays queued delays and failures.
///
/// Results are computed when the call arrives; the queued delay only holds
/// back the answer.
#[derive(Default)]
pub struct MockGateway {
    tasks: Mutex<Vec<Task>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Op, VecDeque<Error>>>,
    delays: Mutex<HashMap<Op, VecDeque<Duration>>>,
}

impl MockGateway {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub async fn fail_next(&self, op: Op, error: Error) {
        self.failures
            .lock()
            .await
            .entry(op)
            .or_default()
            .push_back(error);
    }

    pub async fn delay_next(&self, op: Op, delay: Duration) {
        self.delays.lock().await.entry(op).or_default().push_back(delay);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn server_tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    pub async fn set_server_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.lock().await = tasks;
    }

    async fn enter(&self, op: Op, call: Call) -> (Option<Duration>, Option<Error>) {
        self.calls.lock().await.push(call);
        let delay = self
            .delays
            .lock()
            .await
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        let failure = self
            .failures
            .lock()
            .await
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        (delay, failure)
    }

    async fn answer<T>(delay: Option<Duration>, result: Result<T>) -> Result<T> {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>> {
        let (delay, failure) = self.enter(Op::List, Call::List(query.clone())).await;
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let tasks = self.tasks.lock().await;
                let filter = query.search_text().unwrap_or_default();
                Ok(filter_and_sort(tasks.iter(), filter, query.sort)
                    .into_iter()
                    .cloned()
                    .collect())
            }
        };
        Self::answer(delay, result).await
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let (delay, failure) = self.enter(Op::Get, Call::Get(id.to_string())).await;
        let result = match failure {
            Some(err) => Err(err),
            None => self
                .tasks
                .lock()
                .await
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("Task {} not found", id))),
        };
        Self::answer(delay, result).await
    }

    async fn create_task(&self, title: &str, description: &str) -> Result<Task> {
        let (delay, failure) = self.enter(Op::Create, Call::Create(title.to_string())).await;
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let mut tasks = self.tasks.lock().await;
                let position = ordered_group(&tasks, TaskStatus::Todo).len() as u32;
                let created = Task::new(format!("new-{}", tasks.len()), title)
                    .with_description(description)
                    .with_position(position);
                tasks.push(created.clone());
                Ok(created)
            }
        };
        Self::answer(delay, result).await
    }

    async fn update_task(&self, patch: TaskPatch) -> Result<Task> {
        let (delay, failure) = self.enter(Op::Update, Call::Update(patch.clone())).await;
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let mut tasks = self.tasks.lock().await;
                match locate(&tasks, &patch.id) {
                    None => Err(Error::NotFound(format!("Task {} not found", patch.id))),
                    Some(current) => {
                        if let Some(task) = tasks.iter_mut().find(|t| t.id == patch.id) {
                            patch.apply_fields(task)?;
                        }
                        if patch.moves_task() {
                            let status = patch.status.unwrap_or(current.status);
                            let index = patch.position.map_or(current.index, |p| p as usize);
                            *tasks = relocate(&tasks, &patch.id, status, index);
                        }
                        tasks
                            .iter()
                            .find(|t| t.id == patch.id)
                            .cloned()
                            .ok_or_else(|| Error::NotFound(patch.id.clone()))
                    }
                }
            }
        };
        Self::answer(delay, result).await
    }

    async fn delete_task(&self, id: &str) -> Result<String> {
        let (delay, failure) = self.enter(Op::Delete, Call::Delete(id.to_string())).await;
        let result = match failure {
            Some(err) => Err(err),
            None => {
                let mut tasks = self.tasks.lock().await;
                let before = tasks.len();
                tasks.retain(|t| t.id != id);
                if tasks.len() == before {
                    Err(Error::NotFound(format!("Task {} not found", id)))
                } else {
                    *tasks = normalize(&tasks);
                    Ok(id.to_string())
                }
            }
        };
        Self::answer(delay, result).await
    }
}
