//! Core Error Types
//!
//! One error taxonomy shared by the booking, wallet and ranking services.
//! Every kind is reported to the route layer; only notification delivery
//! failures are logged and dropped (see [`crate::notification`]).

use thiserror::Error;

/// Core error kinds
///
/// Error codes are stable strings used by the gateway for API responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // === Lookup / Permission ===
    #[error("{0} not found")]
    NotFound(String),

    #[error("Actor is not permitted to perform this operation")]
    Forbidden,

    #[error("Actor not authenticated")]
    Unauthorized,

    // === State Machine ===
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // === Ledger ===
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Ledger entry already recorded for this reference")]
    DuplicateCredit,

    // === Reviews ===
    #[error("Booking has already been reviewed")]
    DuplicateReview,

    // === Validation ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === System Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal system error: {0}")]
    System(String),
}

impl CoreError {
    /// Shorthand for a missing booking
    pub fn booking_not_found(id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("Booking {}", id))
    }

    /// Shorthand for a missing withdrawal request
    pub fn withdrawal_not_found(id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("Withdrawal request {}", id))
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Forbidden => "FORBIDDEN",
            CoreError::Unauthorized => "UNAUTHORIZED",
            CoreError::InvalidTransition(_) => "INVALID_TRANSITION",
            CoreError::InvalidState(_) => "INVALID_STATE",
            CoreError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            CoreError::DuplicateCredit => "DUPLICATE_CREDIT",
            CoreError::DuplicateReview => "DUPLICATE_REVIEW",
            CoreError::InvalidInput(_) => "INVALID_INPUT",
            CoreError::Database(_) => "DATABASE_ERROR",
            CoreError::System(_) => "SYSTEM_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::InvalidInput(_) => 400,
            CoreError::Unauthorized => 401,
            CoreError::Forbidden => 403,
            CoreError::NotFound(_) => 404,
            CoreError::InvalidTransition(_)
            | CoreError::InvalidState(_)
            | CoreError::DuplicateCredit
            | CoreError::DuplicateReview => 409,
            CoreError::InsufficientBalance => 422,
            CoreError::Database(_) | CoreError::System(_) => 500,
        }
    }

    /// True for errors the caller may retry unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Database(_) | CoreError::System(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        CoreError::Database(e.to_string())
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        CoreError::System(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
