use std::fmt::Display;

use adlink_shared::ParseStatusError;

pub mod identity;
pub mod repository;

pub use identity::Caller;
pub use repository::{Access, MarketStore, Transaction};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn transition(entity: &'static str, from: impl Display, to: impl Display) -> Self {
        Self::InvalidStateTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Stable machine-readable code carried in error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ValidationError(_) => "validation_error",
            CoreError::NotFound { .. } => "not_found",
            CoreError::Forbidden(_) => "forbidden",
            CoreError::Conflict(_) => "conflict",
            CoreError::InvalidStateTransition { .. } => "invalid_state_transition",
            CoreError::InternalError(_) => "internal_error",
        }
    }
}

impl From<ParseStatusError> for CoreError {
    fn from(err: ParseStatusError) -> Self {
        CoreError::InternalError(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
