use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("At least 2 options are required")]
    TooFewOptions,
    #[error("Option text cannot be empty")]
    EmptyOption,
    #[error("Deadline must be in the future")]
    DeadlineNotFuture,
    #[error("Option does not belong to this poll")]
    OptionNotInPoll,
    #[error("Poll not found")]
    PollNotFound,
    #[error("Poll is not active")]
    PollNotActive,
    #[error("Poll has expired")]
    PollExpired,
    #[error("This address has already voted on this poll")]
    AlreadyVoted,
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl PollError {
    /// Stable discriminant the boundary switches on; clients match this
    /// string, never the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::EmptyTitle
            | PollError::TooFewOptions
            | PollError::EmptyOption
            | PollError::DeadlineNotFuture
            | PollError::OptionNotInPoll => "ValidationError",
            PollError::PollNotFound => "NotFound",
            PollError::PollNotActive => "PollNotActive",
            PollError::PollExpired => "PollExpired",
            PollError::AlreadyVoted => "AlreadyVoted",
            PollError::Database(_) => "ServerError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            PollError::EmptyTitle
            | PollError::TooFewOptions
            | PollError::EmptyOption
            | PollError::DeadlineNotFuture
            | PollError::OptionNotInPoll => StatusCode::BAD_REQUEST,
            PollError::PollNotFound => StatusCode::NOT_FOUND,
            PollError::PollNotActive | PollError::PollExpired | PollError::AlreadyVoted => {
                StatusCode::FORBIDDEN
            }
            PollError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        // Storage failures are logged here and surfaced as a generic
        // message; the underlying sqlx detail never reaches the client.
        let message = match &self {
            PollError::Database(e) => {
                error!("database failure: {e}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message
        }));

        (self.status(), body).into_response()
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired, log in again")]
    TokenExpired,
    #[error("Invalid password")]
    InvalidPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = match &self {
            AuthError::TokenExpired => "TokenExpired",
            AuthError::InvalidPassword => "InvalidPassword",
            AuthError::MissingToken | AuthError::InvalidToken => "Unauthorized",
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string()
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}
