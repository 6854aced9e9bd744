//! API error type
//!
//! Handlers return [`ApiResult`]; every failure renders as the unified
//! `{code, msg}` envelope with a matching HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::response::{ApiResponse, error_codes};
use crate::error::CoreError;

/// Handler result: status plus wrapped payload on success
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 Created with `data`
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn missing_auth() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            error_codes::MISSING_AUTH,
            "Missing Authorization header",
        )
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &e {
            CoreError::InvalidInput(_) => error_codes::INVALID_PARAMETER,
            CoreError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            CoreError::InvalidTransition(_) => error_codes::INVALID_TRANSITION,
            CoreError::InvalidState(_) => error_codes::INVALID_STATE,
            CoreError::DuplicateCredit => error_codes::DUPLICATE_CREDIT,
            CoreError::DuplicateReview => error_codes::DUPLICATE_REVIEW,
            CoreError::Unauthorized => error_codes::AUTH_FAILED,
            CoreError::Forbidden => error_codes::FORBIDDEN,
            CoreError::NotFound(_) => error_codes::NOT_FOUND,
            CoreError::Database(_) => error_codes::DATABASE_ERROR,
            CoreError::System(_) => error_codes::INTERNAL_ERROR,
        };

        // Internal details stay in the logs
        let msg = match &e {
            CoreError::Database(_) | CoreError::System(_) => {
                tracing::error!(error = %e, code = e.code(), "Request failed");
                "Internal server error".to_string()
            }
            _ => e.to_string(),
        };
        Self::new(status, code, msg)
    }
}
