//! # Service Error Types
//!
//! Every failure a request can produce. Errors are not returned to the
//! transport: they become an [`Outcome`] pushed to the requester's log.

use thiserror::Error;
use tictac_core::MoveError;
use tictac_shared::{Code, Outcome};

/// Errors produced by request handlers and the subscription gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Referenced entity is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate name, already in a lobby, already in a game.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Credential mismatch or rejected caller key.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Bad move, wrong turn, finished game, identical players.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No player is signed in on the client.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The request is valid but blocked by the player's current state.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Id allocation exhausted or a broken cross-reference.
    #[error("internal: {0}")]
    Internal(String),

    /// The stream or request was cancelled.
    #[error("canceled: {0}")]
    Canceled(String),
}

impl ServiceError {
    /// Wire status code.
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::NotFound(_) => Code::NotFound,
            Self::AlreadyExists(_) => Code::AlreadyExists,
            Self::PermissionDenied(_) => Code::PermissionDenied,
            Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::Unauthenticated(_) => Code::Unauthenticated,
            Self::FailedPrecondition(_) => Code::FailedPrecondition,
            Self::Internal(_) => Code::Internal,
            Self::Canceled(_) => Code::Canceled,
        }
    }

    /// The message without the code prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::AlreadyExists(message)
            | Self::PermissionDenied(message)
            | Self::InvalidArgument(message)
            | Self::Unauthenticated(message)
            | Self::FailedPrecondition(message)
            | Self::Internal(message)
            | Self::Canceled(message) => message,
        }
    }

    /// The failed outcome delivered to the requester.
    #[must_use]
    pub fn to_outcome(&self) -> Outcome {
        Outcome::error(self.code(), self.message())
    }
}

impl From<MoveError> for ServiceError {
    fn from(err: MoveError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<StreamError> for ServiceError {
    fn from(err: StreamError) -> Self {
        Self::Canceled(err.to_string())
    }
}

/// Result type for request handlers.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Transport write failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The receiving side is gone.
    #[error("stream closed")]
    Closed,
}
