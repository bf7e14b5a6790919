//! Session credential shared between the gateway and its callers

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared holder for the bearer token.
///
/// Cloning yields another handle to the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that is already signed in
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Invalidate the session
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = SessionHandle::new();
        let other = session.clone();
        assert!(!other.is_authenticated().await);

        session.set("abc").await;
        assert_eq!(other.token().await.as_deref(), Some("abc"));

        other.clear().await;
        assert!(!session.is_authenticated().await);
    }
}
