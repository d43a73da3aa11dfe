use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Window closed: {0}")]
    WindowClosed(String),

    #[error("Already completed: {0}")]
    AlreadyCompleted(String),

    #[error("Attempt not active: {0}")]
    AttemptNotActive(String),

    #[error("Duplicate answer: {0}")]
    DuplicateAnswer(String),

    #[error("Time exhausted: {0}")]
    TimeExhausted(String),

    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),

    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidWindow(_) => "INVALID_WINDOW",
            AppError::WindowClosed(_) => "WINDOW_CLOSED",
            AppError::AlreadyCompleted(_) => "ALREADY_COMPLETED",
            AppError::AttemptNotActive(_) => "ATTEMPT_NOT_ACTIVE",
            AppError::DuplicateAnswer(_) => "DUPLICATE_ANSWER",
            AppError::TimeExhausted(_) => "TIME_EXHAUSTED",
            AppError::InvalidQuiz(_) => "INVALID_QUIZ",
            AppError::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
            AppError::WindowClosed(_) => StatusCode::CONFLICT,
            AppError::AlreadyCompleted(_) => StatusCode::CONFLICT,
            AppError::AttemptNotActive(_) => StatusCode::CONFLICT,
            AppError::DuplicateAnswer(_) => StatusCode::CONFLICT,
            AppError::TimeExhausted(_) => StatusCode::GONE,
            AppError::InvalidQuiz(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
            status: self.status_code().as_u16(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_errors_map_to_conflict() {
        assert_eq!(
            AppError::WindowClosed("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::AlreadyCompleted("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::AttemptNotActive("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DuplicateAnswer("test".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn creation_and_gateway_errors_map_to_expected_statuses() {
        assert_eq!(
            AppError::InvalidWindow("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidQuiz("test".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::GatewayUnavailable("test".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::TimeExhausted("test".into()).status_code(),
            StatusCode::GONE
        );
    }

    #[test]
    fn error_messages_carry_context() {
        let err = AppError::WindowClosed("assignment 'midterm'".into());
        assert_eq!(err.to_string(), "Window closed: assignment 'midterm'");
        assert_eq!(err.error_code(), "WINDOW_CLOSED");
    }
}
