use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

/// Closed taxonomy of application failures.
///
/// Every error that reaches the pipeline boundary is one of these kinds; no
/// stage constructs ad hoc error shapes. The kind string is stable and suitable
/// for programmatic branching by API consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    TooManyRequests,
    InvalidCredentials,
    SessionExpired,
    ValidationError,
    Storage,
    ServerError,
    ServiceUnavailable,
}

impl ErrorKind {
    /// Fixed kind -> HTTP status table.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::SessionExpired => StatusCode::UNAUTHORIZED,
            ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable wire identifier for the JSON error envelope.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::SessionExpired => "SESSION_EXPIRED",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// User-facing default message, used when a constructor supplies none.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Invalid request",
            ErrorKind::Unauthorized => "Authentication required",
            ErrorKind::Forbidden => "Access denied",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Conflict => "Conflict with the current state of the resource",
            ErrorKind::TooManyRequests => "Too many requests, please try again later",
            ErrorKind::InvalidCredentials => "Invalid email or password",
            ErrorKind::SessionExpired => "Your session has expired, please log in again",
            ErrorKind::ValidationError => "Invalid data",
            ErrorKind::Storage => "A storage error occurred",
            ErrorKind::ServerError => "An internal server error occurred",
            ErrorKind::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

/// The canonical error representation propagated to the boundary.
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, message: kind.default_message().to_string(), details: None }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::BadRequest, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::ValidationError, message)
    }

    pub fn not_found(entity: &str) -> Self {
        Self::with_message(ErrorKind::NotFound, format!("{} not found", entity))
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self.kind, ErrorKind::Storage | ErrorKind::ServerError) {
            let error_id = uuid::Uuid::new_v4();
            tracing::error!("{} (error id {})", self, error_id);
        }

        let mut body = json!({
            "error": self.kind.as_str(),
            "message": self.message,
        });
        if let Some(details) = &self.details {
            body["details"] = details.clone();
        }

        let mut res = (self.status(), Json(body)).into_response();
        // The error boundary re-presents this according to route class and
        // the production flag.
        res.extensions_mut().insert(self);
        res
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::with_message(ErrorKind::ServerError, err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::new(ErrorKind::NotFound),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => AppError::with_message(
                    ErrorKind::Conflict,
                    "A resource with this data already exists",
                ),
                sqlx::error::ErrorKind::ForeignKeyViolation => AppError::with_message(
                    ErrorKind::BadRequest,
                    "Reference to a nonexistent resource",
                ),
                _ => AppError::with_message(ErrorKind::Storage, db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => AppError::new(ErrorKind::ServiceUnavailable),
            _ => AppError::with_message(ErrorKind::Storage, err.to_string()),
        }
    }
}

/// Render an error for the client. API routes receive the JSON envelope;
/// page routes get a generic plain body. In production, `details` and the
/// raw message of internal kinds are withheld.
pub fn present(err: &AppError, is_api_route: bool, production: bool) -> Response {
    if !is_api_route {
        return (err.status(), err.kind.default_message()).into_response();
    }

    let internal = matches!(err.kind, ErrorKind::Storage | ErrorKind::ServerError);
    let message = if production && internal {
        err.kind.default_message()
    } else {
        err.message.as_str()
    };
    let mut body = json!({
        "error": err.kind.as_str(),
        "message": message,
    });
    if !production {
        if let Some(details) = &err.details {
            body["details"] = details.clone();
        }
    }
    (err.status(), Json(body)).into_response()
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait converting `Option` lookups into `NOT_FOUND` errors.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(entity))
    }
}
