//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::appointment::{AppointmentError, BookingError};
use crate::authorization::{GateOutcome, RoleSet};
use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::identity::IdentityError;
use crate::portal::PortalError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<RoleSet>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Sign in to continue")]
    LoginRequired { login_path: String, return_to: String },
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Access denied")]
    AccessDenied,
    #[error("Insufficient permissions")]
    InsufficientPermissions { required: RoleSet },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Authentication state not resolved")]
    AuthPending,
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Maps a refused gate decision. `Allow` has no error form.
    pub fn from_gate(outcome: GateOutcome) -> Option<Self> {
        match outcome {
            GateOutcome::Allow => None,
            GateOutcome::Loading => Some(Self::AuthPending),
            GateOutcome::RedirectToLogin {
                login_path,
                return_to,
            } => Some(Self::LoginRequired {
                login_path,
                return_to,
            }),
            GateOutcome::AccessDenied => Some(Self::AccessDenied),
            GateOutcome::InsufficientPermissions { required } => {
                Some(Self::InsufficientPermissions { required })
            }
        }
    }

    fn detail(code: &'static str, message: impl Into<String>) -> ErrorDetail {
        ErrorDetail {
            code,
            message: message.into(),
            login_path: None,
            return_to: None,
            required_roles: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Self::detail("AUTH_REQUIRED", "Authentication required"),
            ),
            ApiError::LoginRequired {
                login_path,
                return_to,
            } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    login_path: Some(login_path.clone()),
                    return_to: Some(return_to.clone()),
                    ..Self::detail("AUTH_REQUIRED", "Sign in to continue")
                },
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Self::detail("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            ApiError::AccessDenied => (
                StatusCode::FORBIDDEN,
                Self::detail(
                    "ACCESS_DENIED",
                    "You don't have permission to access the admin panel",
                ),
            ),
            ApiError::InsufficientPermissions { required } => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    required_roles: Some(*required),
                    ..Self::detail(
                        "INSUFFICIENT_PERMISSIONS",
                        "You don't have the required role to view this page",
                    )
                },
            ),
            ApiError::Forbidden(detail) => {
                (StatusCode::FORBIDDEN, Self::detail("FORBIDDEN", detail.clone()))
            }
            ApiError::AuthPending => (
                StatusCode::SERVICE_UNAVAILABLE,
                Self::detail("AUTH_PENDING", "Authentication state not resolved"),
            ),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                Self::detail(
                    "RATE_LIMITED",
                    format!("Rate limit exceeded. Retry after {retry_after}s"),
                ),
            ),
            ApiError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, Self::detail("NOT_FOUND", detail.clone()))
            }
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Self::detail("BAD_REQUEST", detail.clone()))
            }
            ApiError::Conflict(detail) => {
                (StatusCode::CONFLICT, Self::detail("CONFLICT", detail.clone()))
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Self::detail("INTERNAL", "An internal error occurred"),
                )
            }
        };

        let mut response = (status, Json(ErrorBody { error: detail })).into_response();
        // Add retry-after header for rate limited responses
        if let ApiError::RateLimited { retry_after } = &self {
            if let Ok(val) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

// ─── Conversions ──────────────────────────────────────────────────────────────

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DatabaseError::ConstraintViolation(message) => ApiError::Conflict(message),
            DatabaseError::InvalidEnum { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotTaken { .. } => ApiError::Conflict(err.to_string()),
            BookingError::Database(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<AppointmentError> for ApiError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AppointmentError::InvalidDuration(_) => ApiError::BadRequest(err.to_string()),
            AppointmentError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            AppointmentError::Database(e) => e.into(),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => ApiError::InvalidCredentials,
            IdentityError::UnknownUser(_) => ApiError::NotFound(err.to_string()),
            IdentityError::Database(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::NoPatientAccount => ApiError::Forbidden(err.to_string()),
            PortalError::AppointmentNotFound(_) => ApiError::NotFound(err.to_string()),
            PortalError::Identity(e) => e.into(),
            PortalError::Database(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}
