/// Error Handling Module
///
/// One error type for the whole service. It covers:
/// 1. Domain-specific error enums (validation, database, auth, config)
/// 2. A closed `ErrorKind` classification callers match on by value
/// 3. Operation context (`service.auth.login: ...`) that keeps the kind intact
/// 4. HTTP response mapping with structured logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    NoFieldsToUpdate,
    InvalidRow(String),
    ConnectionPool(String),
    QueryExecution(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::NoFieldsToUpdate => write!(f, "no fields to update"),
            DatabaseError::InvalidRow(msg) => write!(f, "Invalid row: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and token lifecycle errors
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    UserNotFound,
    UserExists,
    EmailNotFound,
    InvalidCredentials,
    AccountBlocked,
    TokenExpired,
    TokenMalformed,
    TokenRevoked,
    ClaimNotFound(String),
    MissingToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UserNotFound => write!(f, "user not found"),
            AuthError::UserExists => write!(f, "user already exists"),
            AuthError::EmailNotFound => write!(f, "email not found"),
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::AccountBlocked => write!(f, "account is blocked"),
            AuthError::TokenExpired => write!(f, "token is expired"),
            AuthError::TokenMalformed => write!(f, "token is malformed"),
            AuthError::TokenRevoked => write!(f, "token revoked"),
            AuthError::ClaimNotFound(claim) => write!(f, "claim not found: {}", claim),
            AuthError::MissingToken => write!(f, "missing authentication token"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. CLASSIFICATION
/// ============================================================================

/// Closed classification of every failure the service can report.
///
/// Transport code picks the user-facing answer from this value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    InvalidCredentials,
    AccountBlocked,
    TokenExpired,
    TokenMalformed,
    TokenRevoked,
    NoFieldsToUpdate,
    DependencyUnavailable,
    Timeout,
    Internal,
}

/// ============================================================================
/// 3. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    /// Revocation cache I/O failure
    Cache(String),
    /// Notification channel I/O failure
    Broker(String),
    Hashing(String),
    Signing(String),
    Timeout(Duration),
    Internal(String),
    Operation {
        op: &'static str,
        source: Box<AppError>,
    },
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::InvalidInput,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => ErrorKind::Conflict,
                DatabaseError::NotFound(_) => ErrorKind::NotFound,
                DatabaseError::NoFieldsToUpdate => ErrorKind::NoFieldsToUpdate,
                DatabaseError::InvalidRow(_) => ErrorKind::Internal,
                DatabaseError::ConnectionPool(_) | DatabaseError::QueryExecution(_) => {
                    ErrorKind::DependencyUnavailable
                }
            },
            AppError::Auth(e) => match e {
                AuthError::UserNotFound | AuthError::EmailNotFound => ErrorKind::NotFound,
                AuthError::UserExists => ErrorKind::Conflict,
                AuthError::InvalidCredentials | AuthError::MissingToken => {
                    ErrorKind::InvalidCredentials
                }
                AuthError::AccountBlocked => ErrorKind::AccountBlocked,
                AuthError::TokenExpired => ErrorKind::TokenExpired,
                AuthError::TokenMalformed | AuthError::ClaimNotFound(_) => {
                    ErrorKind::TokenMalformed
                }
                AuthError::TokenRevoked => ErrorKind::TokenRevoked,
            },
            AppError::Cache(_) | AppError::Broker(_) => ErrorKind::DependencyUnavailable,
            AppError::Hashing(_) | AppError::Signing(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::Operation { source, .. } => source.kind(),
        }
    }

    /// Innermost error, skipping operation wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn with_op(self, op: &'static str) -> Self {
        AppError::Operation {
            op,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Cache(msg) => write!(f, "Revocation cache error: {}", msg),
            AppError::Broker(msg) => write!(f, "Notification channel error: {}", msg),
            AppError::Hashing(msg) => write!(f, "Password hashing failed: {}", msg),
            AppError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
            AppError::Timeout(after) => {
                write!(f, "operation timed out after {}ms", after.as_millis())
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Operation { op, source } => write!(f, "{}: {}", op, source),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Operation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Attach the failing operation's name to an error result.
pub trait WithOp<T> {
    fn with_op(self, op: &'static str) -> Result<T, AppError>;
}

impl<T, E> WithOp<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn with_op(self, op: &'static str) -> Result<T, AppError> {
        self.map_err(|e| e.into().with_op(op))
    }
}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let db_error = match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                DatabaseError::UniqueConstraintViolation(db_err.message().to_string())
            }
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::InvalidRow(err.to_string())
            }
            _ => DatabaseError::QueryExecution(err.to_string()),
        };
        AppError::Database(db_error)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

// ============================================================================
// 4. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput | ErrorKind::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidCredentials
            | ErrorKind::TokenExpired
            | ErrorKind::TokenMalformed
            | ErrorKind::TokenRevoked => StatusCode::UNAUTHORIZED,
            ErrorKind::AccountBlocked => StatusCode::FORBIDDEN,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::DependencyUnavailable | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::AccountBlocked => "ACCOUNT_BLOCKED",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::TokenMalformed => "TOKEN_INVALID",
            ErrorKind::TokenRevoked => "TOKEN_REVOKED",
            ErrorKind::NoFieldsToUpdate => "NO_FIELDS_TO_UPDATE",
            ErrorKind::DependencyUnavailable | ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
        }
    }
}

impl AppError {
    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        let root = self.root();
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::NotFound | ErrorKind::Conflict => {
                root.to_string()
            }
            ErrorKind::InvalidCredentials => match root {
                AppError::Auth(AuthError::MissingToken) => root.to_string(),
                _ => "invalid username or password".to_string(),
            },
            ErrorKind::AccountBlocked => "account is blocked".to_string(),
            ErrorKind::TokenExpired => "token is expired".to_string(),
            ErrorKind::TokenMalformed => "invalid token".to_string(),
            ErrorKind::TokenRevoked => "token revoked".to_string(),
            ErrorKind::NoFieldsToUpdate => "no fields to update".to_string(),
            ErrorKind::Timeout => "request timed out".to_string(),
            ErrorKind::DependencyUnavailable | ErrorKind::Internal => {
                "internal error".to_string()
            }
        }
    }

    fn log_error(&self, error_id: &str) {
        let kind = self.kind();
        match kind {
            ErrorKind::DependencyUnavailable | ErrorKind::Internal | ErrorKind::Timeout => {
                tracing::error!(
                    error_id = error_id,
                    kind = ?kind,
                    error = %self,
                    "Request failed"
                );
            }
            ErrorKind::TokenRevoked => {
                tracing::warn!(
                    error_id = error_id,
                    error = %self,
                    "Replay of a consumed refresh token"
                );
            }
            _ => {
                tracing::warn!(
                    error_id = error_id,
                    kind = ?kind,
                    error = %self,
                    "Request rejected"
                );
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let kind = self.kind();
        let status = kind.status_code();
        let body = ErrorResponse::new(
            error_id,
            self.public_message(),
            kind.code().to_string(),
            status.as_u16(),
        );

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}
