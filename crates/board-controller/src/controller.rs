//! Board controller
//!
//! Owns the client-side task cache and mediates every change to it. Moves are
//! applied to the cache first and persisted in the background; the outcome of
//! each persistence call is reconciled against the latest move of that task.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tb_core::board::{BoardSnapshot, MoveEvent, MoveIntent, StatusList};
use tb_core::gateway::{BackendGateway, SessionHandle};
use tb_core::reorder::{apply_move, reorder_columns};
use tb_core::store::TaskStore;
use tb_core::task::{validate_title, Task, TaskPatch, TaskStatus};
use tb_core::view::{ListQuery, SortMode};
use tb_core::{Error, Result};

use crate::config::{ClientConfig, FailurePolicy};
use crate::event::BoardEvent;
use crate::lifecycle::{MoveState, MoveTicket, MoveTracker};
use crate::notify::{Notification, NotificationCenter, NotificationLevel};
use crate::search::FetchGuard;

const EVENT_CAPACITY: usize = 256;

/// Result of handing a drag-and-drop gesture to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped outside any column or back where it started
    Ignored,
    /// Applied locally; persistence is in flight under `ticket`
    Applied { ticket: MoveTicket, intent: MoveIntent },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer fetch superseded this one; its result was dropped
    Stale,
}

struct Inner {
    gateway: Arc<dyn BackendGateway>,
    session: SessionHandle,
    config: ClientConfig,
    store: RwLock<TaskStore>,
    lists: RwLock<Vec<StatusList>>,
    selected: RwLock<Option<Task>>,
    tracker: Mutex<MoveTracker>,
    notifications: Mutex<NotificationCenter>,
    fetch_guard: FetchGuard,
    pending: Mutex<Vec<JoinHandle<()>>>,
    events: broadcast::Sender<BoardEvent>,
}

/// Cloneable handle to one board session
#[derive(Clone)]
pub struct BoardController {
    inner: Arc<Inner>,
}

impl BoardController {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        session: SessionHandle,
        config: ClientConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let notifications = NotificationCenter::new(config.notification_ttl);

        Self {
            inner: Arc::new(Inner {
                gateway,
                session,
                config,
                store: RwLock::new(TaskStore::new()),
                lists: RwLock::new(StatusList::defaults()),
                selected: RwLock::new(None),
                tracker: Mutex::new(MoveTracker::new()),
                notifications: Mutex::new(notifications),
                fetch_guard: FetchGuard::new(),
                pending: Mutex::new(Vec::new()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    pub fn fetch_guard(&self) -> &FetchGuard {
        &self.inner.fetch_guard
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: BoardEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    async fn notify(&self, level: NotificationLevel, message: impl Into<String>, task_id: Option<&str>) {
        let notification = self
            .inner
            .notifications
            .lock()
            .await
            .push(level, message, task_id);
        self.emit(BoardEvent::Notified { notification });
    }

    async fn expire_session(&self) {
        warn!("Session rejected; signing out");
        self.inner.session.clear().await;
        self.emit(BoardEvent::SessionExpired);
    }

    /// Surface a gateway failure to the user
    async fn report_failure(&self, context: &str, task_id: Option<&str>, err: &Error) {
        warn!("{}: {}", context, err);
        self.notify(NotificationLevel::Error, format!("{}: {}", context, err), task_id)
            .await;
        if err.is_auth() {
            self.expire_session().await;
        }
    }

    // ---- fetching ----

    /// Fetch the whole board
    pub async fn load(&self) -> Result<RefreshOutcome> {
        self.refresh(ListQuery::default()).await
    }

    /// Fetch with a search/sort query, replacing the cached tasks
    pub async fn refresh(&self, query: ListQuery) -> Result<RefreshOutcome> {
        let generation = self.inner.fetch_guard.begin();
        self.fetch_for(generation, query).await
    }

    pub(crate) async fn fetch_for(&self, generation: u64, query: ListQuery) -> Result<RefreshOutcome> {
        let result = self.inner.gateway.list_tasks(&query).await;

        let count = {
            let mut store = self.inner.store.write().await;
            if !self.inner.fetch_guard.is_current(generation) {
                debug!("Dropping result of superseded fetch {}", generation);
                return Ok(RefreshOutcome::Stale);
            }
            match result {
                Ok(tasks) => {
                    let count = tasks.len();
                    store.replace_all(tasks);
                    count
                }
                Err(err) => {
                    drop(store);
                    self.report_failure("Error while loading tasks", None, &err).await;
                    return Err(err);
                }
            }
        };

        debug!("Loaded {} tasks", count);
        self.emit(BoardEvent::TasksRefreshed { count });
        Ok(RefreshOutcome::Applied { count })
    }

    // ---- moves ----

    /// Handle a drag-and-drop gesture.
    ///
    /// The cache is updated before any network call; the returned ticket
    /// identifies the background persistence of this move.
    pub async fn move_task(&self, event: MoveEvent) -> Result<MoveOutcome> {
        let (intent, ticket, previous, applied_version) = {
            let mut store = self.inner.store.write().await;
            let Some(intent) = event.resolve(store.tasks())? else {
                debug!("Ignoring move of {}: no valid destination", event.task_id);
                return Ok(MoveOutcome::Ignored);
            };

            let previous = store.tasks().to_vec();
            store.apply_local(apply_move(&previous, intent.source(), Some(intent.destination())));
            let ticket = self.inner.tracker.lock().await.begin(intent.task_id());
            (intent, ticket, previous, store.version())
        };

        info!(
            "Moved task {} from {} to {} (ticket {})",
            intent.task_id(),
            intent.source(),
            intent.destination(),
            ticket
        );
        self.emit(BoardEvent::MoveApplied {
            ticket,
            task_id: intent.task_id().to_string(),
        });

        let controller = self.clone();
        let persisted = intent.clone();
        let handle = tokio::spawn(async move {
            controller
                .persist_move(persisted, ticket, previous, applied_version)
                .await;
        });

        let mut pending = self.inner.pending.lock().await;
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);

        Ok(MoveOutcome::Applied { ticket, intent })
    }

    async fn persist_move(
        self,
        intent: MoveIntent,
        ticket: MoveTicket,
        previous: Vec<Task>,
        applied_version: u64,
    ) {
        let task_id = intent.task_id().to_string();

        match self.inner.gateway.update_task(intent.patch()).await {
            Ok(_) => {
                if self.inner.tracker.lock().await.confirm(&task_id, ticket) {
                    debug!("Move {} of task {} confirmed", ticket, task_id);
                } else {
                    debug!("Move {} of task {} confirmed after a newer move", ticket, task_id);
                }
                self.emit(BoardEvent::MoveConfirmed { ticket, task_id });
            }
            Err(err) => {
                self.inner
                    .tracker
                    .lock()
                    .await
                    .fail(&task_id, ticket, err.to_string());
                self.emit(BoardEvent::MoveFailed {
                    ticket,
                    task_id: task_id.clone(),
                    message: err.to_string(),
                });
                self.report_failure("Error while updating task", Some(&task_id), &err)
                    .await;
                self.reconcile_failed_move(&task_id, ticket, previous, applied_version, &err)
                    .await;
            }
        }
    }

    async fn reconcile_failed_move(
        &self,
        task_id: &str,
        ticket: MoveTicket,
        previous: Vec<Task>,
        applied_version: u64,
        err: &Error,
    ) {
        match self.inner.config.failure_policy {
            FailurePolicy::Retain => {
                debug!("Keeping optimistic position of task {}", task_id);
            }
            FailurePolicy::Rollback => {
                let mut store = self.inner.store.write().await;
                // Restoring over a later change would lose it
                if store.version() != applied_version {
                    warn!(
                        "Board changed since move {} of task {}; not rolling back",
                        ticket, task_id
                    );
                    return;
                }
                store.apply_local(previous);
                drop(store);
                info!("Rolled back move {} of task {}", ticket, task_id);
                self.emit(BoardEvent::MoveRolledBack {
                    ticket,
                    task_id: task_id.to_string(),
                });
            }
            FailurePolicy::Refresh => {
                if err.is_auth() {
                    debug!("Not refreshing after move {}: signed out", ticket);
                    return;
                }
                if let Err(e) = self.load().await {
                    warn!("Refresh after failed move {} did not complete: {}", ticket, e);
                }
            }
        }
    }

    /// Wait for every in-flight move to be persisted or rejected
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.pending.lock().await);
            if handles.is_empty() {
                return;
            }
            for joined in join_all(handles).await {
                if let Err(e) = joined {
                    error!("Move persistence task failed: {}", e);
                }
            }
        }
    }

    pub async fn move_state(&self, task_id: &str) -> MoveState {
        self.inner.tracker.lock().await.state(task_id)
    }

    /// Dismiss a failed move; returns false if the task was not errored
    pub async fn acknowledge(&self, task_id: &str) -> bool {
        let acknowledged = self.inner.tracker.lock().await.acknowledge(task_id);
        if acknowledged {
            self.inner
                .notifications
                .lock()
                .await
                .dismiss_for_task(task_id);
        }
        acknowledged
    }

    // ---- task CRUD ----

    pub async fn create_task(&self, title: &str, description: &str) -> Result<Task> {
        validate_title(title)?;

        match self.inner.gateway.create_task(title.trim(), description).await {
            Ok(task) => {
                info!("Created task {}", task.id);
                self.inner.store.write().await.upsert(task.clone());
                self.notify(NotificationLevel::Success, "Task created", Some(&task.id))
                    .await;
                self.emit(BoardEvent::TaskCreated {
                    task_id: task.id.clone(),
                });
                Ok(task)
            }
            Err(err) => {
                self.report_failure("Error while creating task", None, &err).await;
                Err(err)
            }
        }
    }

    /// Edit title or description; position changes go through `move_task`
    pub async fn update_task(&self, patch: TaskPatch) -> Result<Task> {
        if patch.moves_task() {
            return Err(Error::Validation(
                "Status and position are changed by moving the task".to_string(),
            ));
        }
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }

        let task_id = patch.id.clone();
        let remote = match self.inner.gateway.update_task(patch).await {
            Ok(task) => task,
            Err(err) => {
                if err.is_not_found() {
                    self.forget(&task_id).await;
                }
                self.report_failure("Error while updating task", Some(&task_id), &err)
                    .await;
                return Err(err);
            }
        };

        // Keep the local column and position; they may be ahead of the server
        let merged = {
            let mut store = self.inner.store.write().await;
            let merged = match store.get(&task_id) {
                Some(local) => Task {
                    title: remote.title.clone(),
                    description: remote.description.clone(),
                    updated_at: remote.updated_at,
                    ..local.clone()
                },
                None => remote,
            };
            store.upsert(merged.clone());
            merged
        };

        let mut selected = self.inner.selected.write().await;
        if selected.as_ref().is_some_and(|t| t.id == task_id) {
            *selected = Some(merged.clone());
        }
        drop(selected);

        self.notify(NotificationLevel::Success, "Task updated", Some(&task_id))
            .await;
        self.emit(BoardEvent::TaskUpdated { task_id });
        Ok(merged)
    }

    /// Delete a task. A task the backend no longer knows is removed locally.
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        match self.inner.gateway.delete_task(task_id).await {
            Ok(_) => {
                info!("Deleted task {}", task_id);
                self.forget(task_id).await;
                self.notify(NotificationLevel::Success, "Task deleted", None)
                    .await;
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!("Task {} was already deleted on the server", task_id);
                self.forget(task_id).await;
                Ok(())
            }
            Err(err) => {
                self.report_failure("Error while deleting task", Some(task_id), &err)
                    .await;
                Err(err)
            }
        }
    }

    async fn forget(&self, task_id: &str) {
        let removed = self.inner.store.write().await.remove(task_id).is_some();

        let mut selected = self.inner.selected.write().await;
        if selected.as_ref().is_some_and(|t| t.id == task_id) {
            *selected = None;
        }
        drop(selected);

        if removed {
            self.emit(BoardEvent::TaskDeleted {
                task_id: task_id.to_string(),
            });
        }
    }

    // ---- selection ----

    /// Fetch a task and hold it as the selected task
    pub async fn select_task(&self, task_id: &str) -> Result<Task> {
        match self.inner.gateway.get_task(task_id).await {
            Ok(task) => {
                *self.inner.selected.write().await = Some(task.clone());
                Ok(task)
            }
            Err(err) => {
                *self.inner.selected.write().await = None;
                if err.is_not_found() {
                    self.forget(task_id).await;
                }
                self.report_failure("Error while loading task", Some(task_id), &err)
                    .await;
                Err(err)
            }
        }
    }

    pub async fn selected_task(&self) -> Option<Task> {
        self.inner.selected.read().await.clone()
    }

    pub async fn clear_selection(&self) {
        *self.inner.selected.write().await = None;
    }

    // ---- columns ----

    pub async fn status_lists(&self) -> Vec<StatusList> {
        self.inner.lists.read().await.clone()
    }

    /// Move a column; local only
    pub async fn reorder_columns(&self, from: usize, to: usize) -> Vec<StatusList> {
        let mut lists = self.inner.lists.write().await;
        let reordered = reorder_columns(&lists, from, to);
        let changed = *lists != reordered;
        *lists = reordered.clone();
        drop(lists);

        if changed {
            self.emit(BoardEvent::ColumnsReordered);
        }
        reordered
    }

    // ---- views ----

    pub async fn snapshot(&self) -> BoardSnapshot {
        let lists = self.inner.lists.read().await;
        self.inner.store.read().await.snapshot(&lists)
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.store.read().await.tasks().to_vec()
    }

    pub async fn task(&self, task_id: &str) -> Option<Task> {
        self.inner.store.read().await.get(task_id).cloned()
    }

    /// One column in position order
    pub async fn column(&self, status: TaskStatus) -> Vec<Task> {
        let store = self.inner.store.read().await;
        store.select_by_status(status).iter().cloned().collect()
    }

    /// Cached tasks filtered by text and sorted for display
    pub async fn search(&self, filter: &str, sort: SortMode) -> Vec<Task> {
        let store = self.inner.store.read().await;
        store.select(filter, sort).into_iter().cloned().collect()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.notifications.lock().await.active()
    }

    pub async fn dismiss_notification(&self, id: u64) -> bool {
        self.inner.notifications.lock().await.dismiss(id)
    }

    /// Drop all board state, e.g. on sign-out. In-flight fetches are discarded.
    pub async fn clear(&self) {
        self.inner.fetch_guard.begin();
        self.inner.store.write().await.clear();
        *self.inner.selected.write().await = None;
        self.inner.tracker.lock().await.clear();
        self.inner.notifications.lock().await.clear();
        debug!("Board state cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded, task, Call, MockGateway, Op};
    use std::time::Duration;
    use tb_core::reorder::Location;

    async fn controller_with(policy: FailurePolicy) -> (BoardController, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::with_tasks(seeded()));
        let controller = BoardController::new(
            gateway.clone(),
            SessionHandle::with_token("token"),
            ClientConfig::default().with_failure_policy(policy),
        );
        controller.load().await.unwrap();
        (controller, gateway)
    }

    fn drag(task_id: &str, from: (TaskStatus, usize), to: (TaskStatus, usize)) -> MoveEvent {
        MoveEvent::new(
            task_id,
            Location::new(from.0, from.1),
            Some(Location::new(to.0, to.1)),
        )
    }

    async fn column_ids(controller: &BoardController, status: TaskStatus) -> Vec<String> {
        controller
            .column(status)
            .await
            .into_iter()
            .map(|t| t.id)
            .collect()
    }

    fn updates(calls: &[Call]) -> Vec<TaskPatch> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::Update(patch) => Some(patch.clone()),
                _ => None,
            })
            .collect()
    }

    fn drain(events: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    #[tokio::test]
    async fn test_network_failure_keeps_optimistic_state() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        let mut events = controller.subscribe();
        gateway
            .fail_next(Op::Update, Error::Network("connection reset".to_string()))
            .await;

        let outcome = controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 0)))
            .await
            .unwrap();
        assert!(matches!(outcome, MoveOutcome::Applied { .. }));
        // visible before the backend answered
        assert_eq!(column_ids(&controller, TaskStatus::Done).await, ["A", "C"]);
        assert_eq!(controller.move_state("A").await, MoveState::OptimisticallyMoved);

        controller.settle().await;

        assert_eq!(column_ids(&controller, TaskStatus::Done).await, ["A", "C"]);
        assert_eq!(column_ids(&controller, TaskStatus::Todo).await, ["B"]);
        assert!(controller.move_state("A").await.is_errored());

        let notifications = controller.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert_eq!(notifications[0].task_id.as_deref(), Some("A"));

        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, BoardEvent::MoveFailed { task_id, .. } if task_id == "A")));

        // the next move is not blocked
        controller
            .move_task(drag("B", (TaskStatus::Todo, 0), (TaskStatus::InProgress, 0)))
            .await
            .unwrap();
        controller.settle().await;

        assert_eq!(controller.move_state("B").await, MoveState::Idle);
        let sent = updates(&gateway.calls().await);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].id, "B");
        assert_eq!(sent[1].status, Some(TaskStatus::InProgress));
        assert_eq!(sent[1].position, Some(0));
    }

    #[tokio::test]
    async fn test_within_status_move_sends_position_only() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        let mut events = controller.subscribe();

        controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Todo, 1)))
            .await
            .unwrap();
        assert_eq!(column_ids(&controller, TaskStatus::Todo).await, ["B", "A"]);
        controller.settle().await;

        let sent = updates(&gateway.calls().await);
        assert_eq!(sent, vec![TaskPatch::new("A").with_position(1)]);
        assert_eq!(controller.move_state("A").await, MoveState::Idle);

        let server: Vec<(String, u32)> = gateway
            .server_tasks()
            .await
            .into_iter()
            .filter(|t| t.status == TaskStatus::Todo)
            .map(|t| (t.id, t.position))
            .collect();
        assert!(server.contains(&("A".to_string(), 1)));
        assert!(server.contains(&("B".to_string(), 0)));

        let kinds: Vec<BoardEvent> = drain(&mut events);
        assert!(matches!(kinds[0], BoardEvent::MoveApplied { .. }));
        assert!(matches!(kinds[1], BoardEvent::MoveConfirmed { .. }));
    }

    #[tokio::test]
    async fn test_noop_moves_are_ignored() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        let before = controller.tasks().await;

        let outside = MoveEvent::new("A", Location::new(TaskStatus::Todo, 0), None);
        assert_eq!(controller.move_task(outside).await.unwrap(), MoveOutcome::Ignored);

        let same_slot = drag("B", (TaskStatus::Todo, 1), (TaskStatus::Todo, 1));
        assert_eq!(controller.move_task(same_slot).await.unwrap(), MoveOutcome::Ignored);

        let past_end = drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 5));
        assert_eq!(controller.move_task(past_end).await.unwrap(), MoveOutcome::Ignored);

        let past_end_within = drag("A", (TaskStatus::Todo, 0), (TaskStatus::Todo, 2));
        assert_eq!(
            controller.move_task(past_end_within).await.unwrap(),
            MoveOutcome::Ignored
        );

        controller.settle().await;
        assert_eq!(controller.tasks().await, before);
        assert!(updates(&gateway.calls().await).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_moves_are_rejected() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        let before = controller.tasks().await;

        let unknown_status = MoveEvent {
            task_id: "A".to_string(),
            source_status: "todo".to_string(),
            source_index: 0,
            dest_status: Some("archived".to_string()),
            dest_index: Some(0),
        };
        let wrong_source = drag("A", (TaskStatus::Todo, 1), (TaskStatus::Done, 0));
        let unknown_task = drag("Z", (TaskStatus::Todo, 0), (TaskStatus::Done, 0));

        for event in [unknown_status, wrong_source, unknown_task] {
            let result = controller.move_task(event).await;
            assert!(matches!(result, Err(Error::Validation(_))));
        }

        assert_eq!(controller.tasks().await, before);
        assert!(updates(&gateway.calls().await).is_empty());
    }

    #[tokio::test]
    async fn test_rollback_policy_restores_board() {
        let (controller, gateway) = controller_with(FailurePolicy::Rollback).await;
        let before = controller.tasks().await;
        gateway
            .fail_next(Op::Update, Error::Network("offline".to_string()))
            .await;

        controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 1)))
            .await
            .unwrap();
        controller.settle().await;

        assert_eq!(controller.tasks().await, before);
        assert!(controller.move_state("A").await.is_errored());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollback_skipped_after_later_move() {
        let (controller, gateway) = controller_with(FailurePolicy::Rollback).await;
        gateway.delay_next(Op::Update, Duration::from_millis(100)).await;
        gateway
            .fail_next(Op::Update, Error::Network("offline".to_string()))
            .await;

        controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 0)))
            .await
            .unwrap();
        controller
            .move_task(drag("B", (TaskStatus::Todo, 0), (TaskStatus::InProgress, 0)))
            .await
            .unwrap();
        controller.settle().await;

        assert_eq!(column_ids(&controller, TaskStatus::Done).await, ["A", "C"]);
        assert_eq!(column_ids(&controller, TaskStatus::InProgress).await, ["B"]);
        assert!(controller.move_state("A").await.is_errored());
        assert_eq!(controller.move_state("B").await, MoveState::Idle);
    }

    #[tokio::test]
    async fn test_refresh_policy_refetches_board() {
        let (controller, gateway) = controller_with(FailurePolicy::Refresh).await;
        gateway
            .fail_next(Op::Update, Error::Network("offline".to_string()))
            .await;

        controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 0)))
            .await
            .unwrap();
        controller.settle().await;

        assert_eq!(column_ids(&controller, TaskStatus::Todo).await, ["A", "B"]);
        assert_eq!(column_ids(&controller, TaskStatus::Done).await, ["C"]);
    }

    #[tokio::test]
    async fn test_auth_failure_expires_session() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        let mut events = controller.subscribe();
        gateway
            .fail_next(Op::Update, Error::Auth("token expired".to_string()))
            .await;

        controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 0)))
            .await
            .unwrap();
        controller.settle().await;

        assert!(!controller.session().is_authenticated().await);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, BoardEvent::SessionExpired)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_failure_does_not_override_newer_move() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        gateway.delay_next(Op::Update, Duration::from_millis(100)).await;
        gateway
            .fail_next(Op::Update, Error::Network("offline".to_string()))
            .await;

        let first = controller
            .move_task(drag("A", (TaskStatus::Todo, 0), (TaskStatus::Done, 0)))
            .await
            .unwrap();
        let second = controller
            .move_task(drag("A", (TaskStatus::Done, 0), (TaskStatus::InProgress, 0)))
            .await
            .unwrap();
        match (first, second) {
            (MoveOutcome::Applied { ticket: a, .. }, MoveOutcome::Applied { ticket: b, .. }) => {
                assert!(b > a)
            }
            other => panic!("Expected two applied moves, got {:?}", other),
        }
        controller.settle().await;

        assert_eq!(controller.move_state("A").await, MoveState::Idle);
        assert_eq!(column_ids(&controller, TaskStatus::InProgress).await, ["A"]);
        // the failure is still reported
        assert_eq!(controller.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn test_acknowledge_clears_error() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        gateway
            .fail_next(Op::Update, Error::Network("offline".to_string()))
            .await;
        controller
            .move_task(drag("C", (TaskStatus::Done, 0), (TaskStatus::Todo, 0)))
            .await
            .unwrap();
        controller.settle().await;

        assert!(controller.acknowledge("C").await);
        assert_eq!(controller.move_state("C").await, MoveState::Idle);
        assert!(controller.notifications().await.is_empty());
        assert!(!controller.acknowledge("C").await);
    }

    #[tokio::test]
    async fn test_create_task() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;

        let created = controller.create_task("  Write tests ", "cover moves").await.unwrap();
        assert_eq!(created.title, "Write tests");
        assert_eq!(created.position, 2);
        assert_eq!(
            column_ids(&controller, TaskStatus::Todo).await,
            ["A", "B", created.id.as_str()]
        );

        let blank = controller.create_task("   ", "").await;
        assert!(matches!(blank, Err(Error::Validation(_))));
        let creates = gateway
            .calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn test_update_task_edits_fields_only() {
        let (controller, _gateway) = controller_with(FailurePolicy::Retain).await;
        controller.select_task("B").await.unwrap();

        let updated = controller
            .update_task(TaskPatch::new("B").with_title("Renamed").with_description("new"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.position, 1);
        assert_eq!(controller.task("B").await.unwrap().title, "Renamed");
        assert_eq!(controller.selected_task().await.unwrap().description, "new");

        let moving = controller
            .update_task(TaskPatch::new("B").with_status(TaskStatus::Done))
            .await;
        assert!(matches!(moving, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_task() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;

        controller.delete_task("A").await.unwrap();
        assert_eq!(column_ids(&controller, TaskStatus::Todo).await, ["B"]);
        assert_eq!(controller.task("B").await.unwrap().position, 0);
        assert_eq!(gateway.server_tasks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_of_task_gone_on_server_removes_local_copy() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        gateway
            .set_server_tasks(vec![task("B", TaskStatus::Todo, 0), task("C", TaskStatus::Done, 0)])
            .await;

        controller.delete_task("A").await.unwrap();
        assert!(controller.task("A").await.is_none());
        assert_eq!(controller.tasks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_task() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        gateway
            .fail_next(Op::Delete, Error::Network("offline".to_string()))
            .await;

        assert!(controller.delete_task("A").await.is_err());
        assert!(controller.task("A").await.is_some());
        assert_eq!(controller.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn test_select_task() {
        let (controller, _gateway) = controller_with(FailurePolicy::Retain).await;

        let selected = controller.select_task("C").await.unwrap();
        assert_eq!(selected.status, TaskStatus::Done);
        assert_eq!(controller.selected_task().await.unwrap().id, "C");

        assert!(controller.select_task("missing").await.is_err());
        assert!(controller.selected_task().await.is_none());

        controller.select_task("C").await.unwrap();
        controller.clear_selection().await;
        assert!(controller.selected_task().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_dropped() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        gateway.delay_next(Op::List, Duration::from_secs(1)).await;

        let (slow, fast) = tokio::join!(controller.load(), async {
            gateway
                .set_server_tasks(vec![task("D", TaskStatus::Todo, 0)])
                .await;
            controller.load().await
        });

        assert_eq!(fast.unwrap(), RefreshOutcome::Applied { count: 1 });
        assert_eq!(slow.unwrap(), RefreshOutcome::Stale);
        assert_eq!(column_ids(&controller, TaskStatus::Todo).await, ["D"]);
    }

    #[tokio::test]
    async fn test_search_filters_cache() {
        let (controller, _gateway) = controller_with(FailurePolicy::Retain).await;
        controller
            .update_task(TaskPatch::new("C").with_description("ship the release"))
            .await
            .unwrap();

        let found = controller.search("RELEASE", SortMode::Default).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "C");
        assert_eq!(controller.search("", SortMode::Default).await.len(), 3);
    }

    #[tokio::test]
    async fn test_reorder_columns_and_snapshot() {
        let (controller, _gateway) = controller_with(FailurePolicy::Retain).await;

        let lists = controller.reorder_columns(2, 0).await;
        assert_eq!(lists[0].id, TaskStatus::Done);

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.columns[0].status, TaskStatus::Done);
        assert_eq!(snapshot.task_count(), 3);
    }

    #[tokio::test]
    async fn test_clear_drops_state() {
        let (controller, gateway) = controller_with(FailurePolicy::Retain).await;
        gateway
            .fail_next(Op::Get, Error::Network("offline".to_string()))
            .await;
        let _ = controller.select_task("A").await;

        controller.clear().await;
        assert!(controller.tasks().await.is_empty());
        assert!(controller.notifications().await.is_empty());
        assert!(controller.selected_task().await.is_none());
    }
}
