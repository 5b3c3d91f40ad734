//! Request outcomes.

use serde::{Deserialize, Serialize};

/// Status code of a request. Values follow the gRPC status codes.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    /// Success.
    Ok = 0,
    /// Cancelled by the caller.
    Canceled = 1,
    /// Bad move, wrong turn, finished game, identical players, empty name.
    InvalidArgument = 3,
    /// Referenced entity is absent.
    NotFound = 5,
    /// Uniqueness violation.
    AlreadyExists = 6,
    /// Credential mismatch or access-control rejection.
    PermissionDenied = 7,
    /// A blocking condition, e.g. signing out mid-game.
    FailedPrecondition = 9,
    /// Broken invariant or id-generation exhaustion.
    Internal = 13,
    /// No player is signed in on this client.
    Unauthenticated = 16,
}

impl Code {
    /// Numeric value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// What happened to a request, delivered to the requester only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// True on success.
    pub ok: bool,
    /// Status code, [`Code::Ok`] on success.
    pub code: Code,
    /// Human readable reason, empty on success.
    pub message: String,
}

impl Outcome {
    /// Successful outcome.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            ok: true,
            code: Code::Ok,
            message: String::new(),
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn error(code: Code, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code,
            message: message.into(),
        }
    }
}
