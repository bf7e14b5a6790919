//! Events broadcast by the board controller

use serde::Serialize;

use crate::lifecycle::MoveTicket;
use crate::notify::Notification;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    /// Optimistic move applied to the local store
    MoveApplied { ticket: MoveTicket, task_id: String },
    /// Backend accepted the move
    MoveConfirmed { ticket: MoveTicket, task_id: String },
    MoveFailed {
        ticket: MoveTicket,
        task_id: String,
        message: String,
    },
    /// Local state restored after a failed move
    MoveRolledBack { ticket: MoveTicket, task_id: String },
    TasksRefreshed { count: usize },
    TaskCreated { task_id: String },
    TaskUpdated { task_id: String },
    TaskDeleted { task_id: String },
    ColumnsReordered,
    /// Credential rejected; the session was cleared
    SessionExpired,
    Notified { notification: Notification },
}

impl BoardEvent {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::MoveApplied { task_id, .. }
            | Self::MoveConfirmed { task_id, .. }
            | Self::MoveFailed { task_id, .. }
            | Self::MoveRolledBack { task_id, .. }
            | Self::TaskCreated { task_id }
            | Self::TaskUpdated { task_id }
            | Self::TaskDeleted { task_id } => Some(task_id),
            Self::Notified { notification } => notification.task_id.as_deref(),
            Self::TasksRefreshed { .. } | Self::ColumnsReordered | Self::SessionExpired => None,
        }
    }
}
