//! # Id Generation
//!
//! Entity ids are opaque strings. Collisions are treated as negligible but
//! still checked: an allocation retries a bounded number of times and then
//! fails with an internal error.

use tracing::warn;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Source of fresh opaque ids.
pub trait IdGenerator: Send + Sync {
    /// Returns a new id. Uniqueness is checked by the caller.
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Draws ids from `ids` until one is not `taken`.
///
/// `taken` is evaluated under whatever guard the caller holds, so the check
/// and the insertion that follows form one critical section.
///
/// # Errors
///
/// `Internal` after `attempts` collisions.
pub fn allocate<I>(
    ids: &dyn IdGenerator,
    attempts: u32,
    kind: &str,
    taken: impl Fn(&I) -> bool,
) -> ServiceResult<I>
where
    I: From<String>,
{
    for attempt in 1..=attempts {
        let id = I::from(ids.next_id());
        if !taken(&id) {
            return Ok(id);
        }
        warn!(kind, attempt, "id collision");
    }
    Err(ServiceError::Internal(format!("unable to allocate a {kind} id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tictac_core::GameId;

    struct Repeating {
        calls: AtomicU32,
    }

    impl IdGenerator for Repeating {
        fn next_id(&self) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            "same".to_owned()
        }
    }

    #[test]
    fn test_uuid_ids_differ() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn test_allocate_first_free() {
        let id: GameId = allocate(&UuidGenerator, 3, "game", |_| false).unwrap();
        assert!(!id.as_str().is_empty());
    }

    #[test]
    fn test_allocate_gives_up_after_attempts() {
        let ids = Repeating {
            calls: AtomicU32::new(0),
        };
        let err = allocate::<GameId>(&ids, 3, "game", |id| id.as_str() == "same").unwrap_err();
        assert_eq!(err, ServiceError::Internal("unable to allocate a game id".into()));
        assert_eq!(ids.calls.load(Ordering::SeqCst), 3);
    }
}
