//! Transient user-facing notifications

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast-style message that expires after the center's TTL
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    /// Task the message is about, if any
    pub task_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub expires_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    last_id: u64,
    items: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_id: 0,
            items: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        task_id: Option<&str>,
    ) -> Notification {
        self.last_id += 1;
        let notification = Notification {
            id: self.last_id,
            level,
            message: message.into(),
            task_id: task_id.map(str::to_string),
            created_at: Utc::now(),
            expires_at: Instant::now() + self.ttl,
        };
        self.items.push(notification.clone());
        notification
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop every notification about a task
    pub fn dismiss_for_task(&mut self, task_id: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|n| n.task_id.as_deref() != Some(task_id));
        before - self.items.len()
    }

    /// Unexpired notifications, oldest first
    pub fn active(&mut self) -> Vec<Notification> {
        let now = Instant::now();
        self.items.retain(|n| !n.is_expired(now));
        self.items.clone()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
