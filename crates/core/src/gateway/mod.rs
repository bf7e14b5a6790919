//! Backend gateway
//!
//! Defines the interface to remote task persistence and the credential
//! service, plus the shared REST wire types.

mod http;
mod session;
mod wire;

use async_trait::async_trait;

use crate::task::{Task, TaskPatch};
use crate::view::ListQuery;
use crate::Result;

pub use http::HttpGateway;
pub use session::SessionHandle;
pub use wire::{ApiEnvelope, DeleteTaskRequest, DeletedTask, ErrorBody, LoginRequest, NewTaskRequest, SignupRequest, TokenPayload};

/// Remote task persistence
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// List tasks, optionally filtered and sorted
    async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>>;

    /// Get a task by ID
    async fn get_task(&self, id: &str) -> Result<Task>;

    /// Create a task; the backend assigns id, status and position
    async fn create_task(&self, title: &str, description: &str) -> Result<Task>;

    /// Apply a partial update
    async fn update_task(&self, patch: TaskPatch) -> Result<Task>;

    /// Delete a task, returning its id
    async fn delete_task(&self, id: &str) -> Result<String>;
}

/// Session issuance
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in and keep the issued token in the session
    async fn login(&self, email: &str, password: &str) -> Result<String>;

    /// Register an account; does not sign in
    async fn signup(&self, request: &SignupRequest) -> Result<String>;

    /// Sign out; the local session is cleared even if the call fails
    async fn logout(&self) -> Result<()>;
}
