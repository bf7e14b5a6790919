//! Response envelopes and error mapping shared by the route handlers

use axum::{http::StatusCode, Json};
use tb_core::gateway::{ApiEnvelope, ErrorBody};
use tracing::error;

use crate::auth::AuthError;

pub type RouteError = (StatusCode, Json<ErrorBody>);
pub type ApiResult<T> = Result<Json<ApiEnvelope<T>>, RouteError>;

pub fn ok<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiEnvelope::ok(message, data)))
}

pub fn route_error(status: StatusCode, message: impl Into<String>) -> RouteError {
    (
        status,
        Json(ErrorBody {
            status: status.as_u16(),
            message: message.into(),
        }),
    )
}

pub fn auth_error(err: AuthError) -> RouteError {
    match err {
        AuthError::InvalidInput(message) => route_error(StatusCode::BAD_REQUEST, message),
        AuthError::Unauthorized(message) => route_error(StatusCode::UNAUTHORIZED, message),
        AuthError::Conflict(message) => route_error(StatusCode::CONFLICT, message),
        AuthError::Storage(message) => {
            error!("Auth storage failure: {}", message);
            route_error(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

pub fn task_error(err: tb_core::Error) -> RouteError {
    use tb_core::Error;

    match err {
        Error::Validation(message) => route_error(StatusCode::BAD_REQUEST, message),
        Error::Auth(message) => route_error(StatusCode::UNAUTHORIZED, message),
        Error::TaskNotFound(id) => {
            route_error(StatusCode::NOT_FOUND, format!("Task {} not found", id))
        }
        Error::NotFound(message) => route_error(StatusCode::NOT_FOUND, message),
        other => {
            error!("Task store failure: {}", other);
            route_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}
