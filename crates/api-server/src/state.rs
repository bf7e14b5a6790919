//! Application state

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tb_core::task::FileTaskStore;

use crate::auth::{AuthStore, TokenIssuer};
use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    data_dir: PathBuf,
    task_store: FileTaskStore,
    auth_store: AuthStore,
    tokens: TokenIssuer,
}

impl AppState {
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let task_store = FileTaskStore::new(config.data_dir.join("tasks.json"))
            .await
            .context("Failed to load task store")?;
        let auth_store = AuthStore::new(config.data_dir.join("auth"))
            .await
            .context("Failed to load auth store")?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                data_dir: config.data_dir.clone(),
                task_store,
                auth_store,
                tokens: TokenIssuer::new(config.jwt_secret.clone(), config.token_ttl_hours),
            }),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }

    pub fn task_store(&self) -> &FileTaskStore {
        &self.inner.task_store
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.inner.auth_store
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }
}
