//! HTTP API error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::event::EventValidationError;
use crate::onboarding::{OnboardingError, TransitionError, ValidationError};

pub type ApiResult<T> = Result<T, ApiError>;

/// API errors mapped onto the response taxonomy: validation 400, identity
/// 401, not-creator 403, missing record 404, terminal re-submission 409,
/// infrastructure 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Internal(source) => {
                // Storage details stay in the log; the response is generic.
                error!("internal error: {source:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code,
        });

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSubject => ApiError::BadRequest(err.to_string()),
            AuthError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<EventValidationError> for ApiError {
    fn from(err: EventValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::Transition(TransitionError::AlreadyComplete) => {
                ApiError::Conflict(TransitionError::AlreadyComplete.to_string())
            }
            OnboardingError::Transition(out_of_order) => {
                ApiError::BadRequest(out_of_order.to_string())
            }
            OnboardingError::UserNotFound => ApiError::NotFound(
                "user record not found; identity sync may not have run yet".to_string(),
            ),
            OnboardingError::Storage(source) => ApiError::Internal(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::OnboardingStep;

    #[test]
    fn test_onboarding_error_mapping() {
        let err: ApiError = OnboardingError::Transition(TransitionError::AlreadyComplete).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = OnboardingError::Transition(TransitionError::OutOfOrder {
            expected: OnboardingStep::Name,
            submitted: OnboardingStep::About,
        })
        .into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = OnboardingError::UserNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
