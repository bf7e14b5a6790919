//! Account endpoints: signup, login, logout

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tb_core::gateway::{ApiEnvelope, LoginRequest, SignupRequest, TokenPayload};
use tracing::{debug, info};

use super::response::{auth_error, ok, ApiResult, RouteError};
use crate::auth::extract_bearer_token;
use crate::state::AppState;

/// POST /auth/signup - Register; the issued token is returned but not required
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<TokenPayload>>), RouteError> {
    let user = state.auth_store().signup(&req).await.map_err(auth_error)?;
    let token = state.tokens().issue(&user).map_err(auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope {
            status: StatusCode::CREATED.as_u16(),
            message: "User registered successfully".to_string(),
            data: TokenPayload { token },
        }),
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<TokenPayload> {
    let user = state
        .auth_store()
        .authenticate(&req.email, &req.password)
        .await
        .map_err(auth_error)?;
    let token = state.tokens().issue(&user).map_err(auth_error)?;
    info!("User {} signed in", user.email);

    ok("Logged in successfully", TokenPayload { token })
}

/// GET /auth/logout - Revoke the presented token, if any
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    if let Ok(token) = extract_bearer_token(&headers) {
        if let Err(err) = state.tokens().revoke(token).await {
            debug!("Logout with unusable token: {}", err);
        }
    }
    ok("Logged out successfully", ())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
}
