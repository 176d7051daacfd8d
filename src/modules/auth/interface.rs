use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;

use super::model::{User, UserStatus};
use crate::services::hashing::HashingError;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Persistent store of user aggregates. `save` is an upsert that writes the
/// user and its email verification record together.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email_and_status(
        &self,
        email: &str,
        status: UserStatus,
    ) -> std::result::Result<Option<User>, DataAccessError>;
    async fn find_by_id(&self, id: &str) -> std::result::Result<Option<User>, DataAccessError>;
    async fn save(&self, user: User) -> std::result::Result<User, DataAccessError>;
}

pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw: &str) -> std::result::Result<String, HashingError>;
    fn matches(&self, raw: &str, encoded: &str) -> std::result::Result<bool, HashingError>;
}

// =============================================================================
// SERVICE RESULT TYPES
// =============================================================================

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug)]
pub struct LoginResult {
    pub user: User,
    pub tokens: TokenPair,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataAccessError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceErrorType {
    ValidationFailed,
    AuthenticationFailed,
    ServiceFailure,
}

impl ServiceErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::ServiceFailure => "SERVICE_FAILURE",
        }
    }
}

/// Failure surfaced by the service layer. Internal causes are logged where
/// the error is created and never carried to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    ValidationFailed(String),

    #[error("Invalid email or password")]
    AuthenticationFailed,

    #[error("Request could not be processed")]
    Failure,
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    pub(crate) fn failure(context: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{}", context);
        Self::Failure
    }

    pub fn kind(&self) -> ServiceErrorType {
        match self {
            Self::ValidationFailed(_) => ServiceErrorType::ValidationFailed,
            Self::AuthenticationFailed => ServiceErrorType::AuthenticationFailed,
            Self::Failure => ServiceErrorType::ServiceFailure,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::Failure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DataAccessError> for ServiceError {
    fn from(err: DataAccessError) -> Self {
        Self::failure("User directory access failed", err)
    }
}

impl From<HashingError> for ServiceError {
    fn from(err: HashingError) -> Self {
        Self::failure("Password hashing failed", err)
    }
}
