//! Board Controller - client-side board state for the task board
//!
//! This crate provides the controller that applies drag-and-drop moves
//! optimistically, persists them in the background and reconciles the
//! outcome, together with debounced search, notifications and the route
//! guard used by the client shell.

mod config;
mod controller;
mod event;
mod lifecycle;
mod notify;
mod routes;
mod search;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, FailurePolicy};
pub use controller::{BoardController, MoveOutcome, RefreshOutcome};
pub use event::BoardEvent;
pub use lifecycle::{MoveState, MoveTicket, MoveTracker};
pub use notify::{Notification, NotificationCenter, NotificationLevel};
pub use routes::{guard, Route};
pub use search::{FetchGuard, SearchDebouncer};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the fmt subscriber, filtered by `RUST_LOG` or `default_filter`.
///
/// Returns false when a global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
