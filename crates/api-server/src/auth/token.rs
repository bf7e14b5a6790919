//! Session tokens (HS256 JWTs)

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{AuthError, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    /// Token id, used for revocation on logout
    pub jti: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::Unauthorized("Invalid token subject".to_string()))
    }
}

/// Issues and verifies tokens; revoked token ids are kept in memory
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_hours: i64,
    revoked: Arc<RwLock<HashSet<String>>>,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
            revoked: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn issue(&self, user: &UserSummary) -> Result<String, AuthError> {
        let exp = (Utc::now() + Duration::hours(self.ttl_hours)).timestamp();
        let exp = usize::try_from(exp)
            .map_err(|_| AuthError::Storage("Failed to encode token expiration".to_string()))?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| AuthError::Storage(format!("Failed to encode JWT: {}", err)))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|decoded| decoded.claims)
        .map_err(|err| AuthError::Unauthorized(format!("Invalid token: {}", err)))
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if self.revoked.read().await.contains(&claims.jti) {
            return Err(AuthError::Unauthorized("Token has been revoked".to_string()));
        }
        Ok(claims)
    }

    /// Invalidate a token for the rest of the process lifetime
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.decode(token)?;
        self.revoked.write().await.insert(claims.jti);
        Ok(())
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AuthError::Unauthorized("Invalid Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::Unauthorized("Authorization must be Bearer token".to_string()))
}
