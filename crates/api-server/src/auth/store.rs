//! User accounts persisted as JSON under the data directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use tb_core::gateway::SignupRequest;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

/// Public view of an account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredUsers {
    users: Vec<User>,
}

#[derive(Clone)]
pub struct AuthStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    file_path: PathBuf,
}

impl AuthStore {
    pub async fn new(base_dir: PathBuf) -> Result<Self, AuthError> {
        tokio::fs::create_dir_all(&base_dir).await.map_err(|err| {
            AuthError::Storage(format!("Failed to create auth directory: {}", err))
        })?;

        let file_path = base_dir.join("users.json");
        let users = load_users(&file_path).await?;

        Ok(Self {
            users: Arc::new(RwLock::new(users)),
            file_path,
        })
    }

    /// Register an account
    pub async fn signup(&self, request: &SignupRequest) -> Result<UserSummary, AuthError> {
        let email = normalize_email(&request.email)?;
        let first_name = required("First name", &request.first_name)?;
        let last_name = required("Last name", &request.last_name)?;
        validate_password(&request.password)?;

        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == email) {
            return Err(AuthError::Conflict(format!("User '{}' already exists", email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            password_hash: hash_password(&request.password),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        persist_users(&self.file_path, &users).await?;
        info!("Registered user {}", user.email);

        Ok(UserSummary::from(&user))
    }

    /// Check credentials
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserSummary, AuthError> {
        let email = normalize_email(email)?;
        let users = self.users.read().await;
        users
            .values()
            .find(|user| user.email == email)
            .filter(|user| verify_password(&user.password_hash, password))
            .map(UserSummary::from)
            .ok_or_else(|| AuthError::Unauthorized("Invalid email or password".to_string()))
    }

    pub async fn get_user(&self, id: Uuid) -> Option<UserSummary> {
        self.users.read().await.get(&id).map(UserSummary::from)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

async fn load_users(path: &Path) -> Result<HashMap<Uuid, User>, AuthError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AuthError::Storage(format!("Failed to read users: {}", err)))?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let stored: StoredUsers = serde_json::from_str(&content)
        .map_err(|err| AuthError::Storage(format!("Failed to parse users: {}", err)))?;
    Ok(stored.users.into_iter().map(|user| (user.id, user)).collect())
}

async fn persist_users(path: &Path, users: &HashMap<Uuid, User>) -> Result<(), AuthError> {
    let stored = StoredUsers {
        users: users.values().cloned().collect(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AuthError::Storage(format!("Failed to serialize users: {}", err)))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|err| AuthError::Storage(format!("Failed to write users: {}", err)))
}

fn required(field: &str, value: &str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return Err(AuthError::InvalidInput("Invalid email".to_string()));
    }
    Ok(normalized)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    format!(
        "v1${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest(&salt, password))
    )
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let mut parts = stored_hash.split('$');
    let (Some("v1"), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    match (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(expected)) {
        (Ok(salt), Ok(expected)) => digest(&salt, password) == expected,
        _ => false,
    }
}
