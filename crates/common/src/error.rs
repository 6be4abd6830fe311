//! Error types for reelvote.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Every failure a decision-session operation can report is a variant here;
/// handlers never let a bare panic or a generic exception escape the state
/// machine.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Session state machine errors ===
    #[error("Operation not valid in phase {0}")]
    WrongPhase(String),

    #[error("{0}")]
    LimitExceeded(String),

    #[error("At least one genre is required")]
    EmptySelection,

    #[error("Genre not nominated: {0}")]
    NotNominated(String),

    #[error("Vote limit reached ({0})")]
    VoteLimitReached(usize),

    #[error("Veto already used")]
    AlreadyUsed,

    #[error("Already in an active group: {0}")]
    AlreadyMember(String),

    #[error("Group has been disbanded")]
    Disbanded,

    #[error("No active candidate")]
    NoCandidate,

    // === Server Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::EmptySelection => {
                StatusCode::BAD_REQUEST
            }
            Self::NotNominated(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_)
            | Self::WrongPhase(_)
            | Self::LimitExceeded(_)
            | Self::VoteLimitReached(_)
            | Self::AlreadyUsed
            | Self::AlreadyMember(_)
            | Self::NoCandidate => StatusCode::CONFLICT,
            Self::Disbanded => StatusCode::GONE,

            // 5xx Server Errors
            Self::ExternalService(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::WrongPhase(_) => "WRONG_PHASE",
            Self::LimitExceeded(_) => "LIMIT_EXCEEDED",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::NotNominated(_) => "NOT_NOMINATED",
            Self::VoteLimitReached(_) => "VOTE_LIMIT_REACHED",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::AlreadyMember(_) => "ALREADY_MEMBER",
            Self::Disbanded => "GROUP_DISBANDED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
