//! Per-task move lifecycle
//!
//! `Idle -> OptimisticallyMoved -> Confirmed | Errored`. Confirmed settles
//! straight back to `Idle`; `Errored` waits for the error to be acknowledged.

use serde::Serialize;
use std::collections::HashMap;

/// Sequence number of a move; later moves get larger tickets
pub type MoveTicket = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MoveState {
    Idle,
    OptimisticallyMoved,
    Confirmed,
    Errored { message: String },
}

impl MoveState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::OptimisticallyMoved)
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored { .. })
    }
}

/// Tracks the latest move of every task.
///
/// Completions carry the ticket they were issued with; a completion for a
/// ticket that is no longer the task's latest does not change its state.
#[derive(Debug, Default)]
pub struct MoveTracker {
    last_ticket: MoveTicket,
    entries: HashMap<String, (MoveTicket, MoveState)>,
}

impl MoveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an optimistic move and issue its ticket
    pub fn begin(&mut self, task_id: &str) -> MoveTicket {
        self.last_ticket += 1;
        self.entries.insert(
            task_id.to_string(),
            (self.last_ticket, MoveState::OptimisticallyMoved),
        );
        self.last_ticket
    }

    pub fn is_latest(&self, task_id: &str, ticket: MoveTicket) -> bool {
        self.entries
            .get(task_id)
            .is_some_and(|(latest, _)| *latest == ticket)
    }

    /// Server confirmed the move; returns false for superseded tickets
    pub fn confirm(&mut self, task_id: &str, ticket: MoveTicket) -> bool {
        if !self.is_latest(task_id, ticket) {
            return false;
        }
        // Confirmed settles to Idle immediately
        self.entries.remove(task_id);
        true
    }

    /// Persisting the move failed; returns false for superseded tickets
    pub fn fail(&mut self, task_id: &str, ticket: MoveTicket, message: impl Into<String>) -> bool {
        if !self.is_latest(task_id, ticket) {
            return false;
        }
        self.entries.insert(
            task_id.to_string(),
            (
                ticket,
                MoveState::Errored {
                    message: message.into(),
                },
            ),
        );
        true
    }

    /// Dismiss an error; returns true if the task was errored
    pub fn acknowledge(&mut self, task_id: &str) -> bool {
        match self.entries.get(task_id) {
            Some((_, MoveState::Errored { .. })) => {
                self.entries.remove(task_id);
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, task_id: &str) -> MoveState {
        self.entries
            .get(task_id)
            .map(|(_, state)| state.clone())
            .unwrap_or(MoveState::Idle)
    }

    /// Number of moves still waiting for the server
    pub fn in_flight(&self) -> usize {
        self.entries
            .values()
            .filter(|(_, state)| state.is_pending())
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
