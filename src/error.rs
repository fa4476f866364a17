//! Error kinds surfaced by the repository.
//!
//! Authentication failures (bad password, bad digest response) are never an
//! error: verification returns `Ok(None)` so callers cannot tell an unknown
//! account from wrong credentials. Everything here is a genuine fault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Required identity fields missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Another identity already owns this username. Carries the value.
    #[error("Username already exists: {0}")]
    DuplicateUserName(String),

    /// Another identity already owns this email. Carries the value.
    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    /// Lookup target absent where the caller required it to exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required tables absent and auto-creation disabled. Fatal, raised at
    /// store construction.
    #[error("Store configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
