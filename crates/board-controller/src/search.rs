//! Debounced search and the stale-response guard

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use tb_core::view::ListQuery;
use tb_core::Result;

use crate::controller::{BoardController, RefreshOutcome};

/// Generation counter shared by every full fetch.
///
/// A fetch takes a generation when it starts and may only apply its result
/// while that generation is still the latest.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard {
    generation: Arc<AtomicU64>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding all earlier ones
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Turns search keystrokes into at most one fetch per quiet period
#[derive(Clone)]
pub struct SearchDebouncer {
    controller: BoardController,
    delay: Duration,
}

impl SearchDebouncer {
    pub fn new(controller: BoardController) -> Self {
        let delay = controller.config().search_debounce;
        Self { controller, delay }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a keystroke.
    ///
    /// The returned task resolves to `Stale` when a newer keystroke or fetch
    /// superseded this one, whether before or after the request went out.
    pub fn input(&self, query: ListQuery) -> JoinHandle<Result<RefreshOutcome>> {
        let generation = self.controller.fetch_guard().begin();
        let controller = self.controller.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !controller.fetch_guard().is_current(generation) {
                debug!("Search {:?} superseded before fetching", query.search_text());
                return Ok(RefreshOutcome::Stale);
            }
            controller.fetch_for(generation, query).await
        })
    }
}
