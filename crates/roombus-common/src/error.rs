//! Centralized error taxonomy for the room bus core.
//!
//! Uses `thiserror` for ergonomic error definitions. Bus request replies and
//! the minimal HTTP health façade both convert through this type so the
//! error classes in spec §7 (validation / authorization / not-found /
//! external / transient) stay consistent everywhere.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Core error type threaded through every room bus component.
#[derive(Debug, thiserror::Error)]
pub enum RoomBusError {
    // === Authentication / authorization ===
    #[error("Invalid token")]
    InvalidToken,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    // === Validation ===
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // === Not-found ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    // === Capacity / conflict ===
    #[error("Room is full")]
    RoomFull,

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    // === Transient (bounded poll exhausted, still not fatal to the caller) ===
    #[error("{what} not yet available")]
    Transient { what: String },

    // === External collaborators ===
    #[error("SFU error: {0}")]
    Sfu(String),

    #[error("Child process error: {0}")]
    Process(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body sent over the bus reply and the HTTP façade.
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
    message: String,
}

impl RoomBusError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RoomFull | Self::AlreadyExists { .. } => StatusCode::CONFLICT,
            Self::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Sfu(_) | Self::Process(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Transient { .. } => "TRANSIENT",
            Self::Sfu(_) => "SFU_ERROR",
            Self::Process(_) => "PROCESS_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The `{error}` string a bus reply callback sends on failure (§4.2, §7).
    pub fn reply_message(&self) -> String {
        match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                "An internal error occurred".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RoomBusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.reply_message();
        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.error_code().to_string(),
            message,
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Convenience alias for `Result`s using [`RoomBusError`].
pub type RoomBusResult<T> = Result<T, RoomBusError>;
