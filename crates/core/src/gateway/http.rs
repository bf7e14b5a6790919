//! REST gateway over HTTP
//!
//! Talks to the task API with a bearer token taken from the shared session.
//! A 401 from the server clears the session.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::session::SessionHandle;
use super::wire::{
    ApiEnvelope, DeleteTaskRequest, DeletedTask, ErrorBody, LoginRequest, NewTaskRequest,
    SignupRequest, TokenPayload,
};
use super::{AuthService, BackendGateway};
use crate::task::{Task, TaskPatch};
use crate::view::{ListQuery, SortMode};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the task API
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: SessionHandle,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, session: SessionHandle) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT, session)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration, session: SessionHandle) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|err| {
            warn!(
                "Failed to build HTTP client with a {:?} timeout, falling back to defaults: {}",
                timeout, err
            );
            Client::new()
        });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn bearer(&self) -> Result<String> {
        self.session
            .token()
            .await
            .ok_or_else(|| Error::Auth("Not signed in".to_string()))
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.bearer().await?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            let envelope: ApiEnvelope<T> = response
                .json()
                .await
                .map_err(|e| Error::Network(format!("Failed to parse response: {}", e)))?;
            return Ok(envelope.data);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.to_string());

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("Session rejected by server; clearing credential");
                self.session.clear().await;
                Err(Error::Auth(message))
            }
            StatusCode::NOT_FOUND => Err(Error::NotFound(message)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(Error::Validation(message))
            }
            _ => Err(Error::Network(format!("HTTP {}: {}", status, message))),
        }
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Network(format!("Request timed out: {}", err))
    } else {
        Error::Network(format!("Request failed: {}", err))
    }
}

fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(search) = query.search_text() {
        params.push(("search", search.to_string()));
    }
    if query.sort != SortMode::Default {
        params.push(("sort", query.sort.as_str().to_string()));
    }
    params
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn list_tasks(&self, query: &ListQuery) -> Result<Vec<Task>> {
        debug!("GET /tasks {:?}", query);
        let request = self
            .authorized(self.client.get(self.url("/tasks")))
            .await?
            .query(&list_params(query));
        self.send(request).await
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let path = format!("/board/get-task-by-id/{}", urlencoding::encode(id));
        let request = self.authorized(self.client.get(self.url(&path))).await?;
        self.send(request).await
    }

    async fn create_task(&self, title: &str, description: &str) -> Result<Task> {
        let body = NewTaskRequest {
            title: title.to_string(),
            description: description.to_string(),
        };
        let request = self
            .authorized(self.client.post(self.url("/board/add-task")))
            .await?
            .json(&body);
        self.send(request).await
    }

    async fn update_task(&self, patch: TaskPatch) -> Result<Task> {
        debug!("POST /board/update-task {:?}", patch);
        let request = self
            .authorized(self.client.post(self.url("/board/update-task")))
            .await?
            .json(&patch);
        self.send(request).await
    }

    async fn delete_task(&self, id: &str) -> Result<String> {
        let body = DeleteTaskRequest {
            task_id: id.to_string(),
        };
        let request = self
            .authorized(self.client.post(self.url("/board/delete-task")))
            .await?
            .json(&body);
        let deleted: DeletedTask = self.send(request).await?;
        Ok(deleted.task_id)
    }
}

#[async_trait]
impl AuthService for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.client.post(self.url("/auth/login")).json(&body);
        let payload: TokenPayload = self.send(request).await?;
        self.session.set(payload.token.clone()).await;
        Ok(payload.token)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<String> {
        let request = self.client.post(self.url("/auth/signup")).json(request);
        let payload: TokenPayload = self.send(request).await?;
        Ok(payload.token)
    }

    async fn logout(&self) -> Result<()> {
        let mut request = self.client.get(self.url("/auth/logout"));
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        let result = self.send::<serde_json::Value>(request).await;
        self.session.clear().await;
        result.map(|_| ())
    }
}
