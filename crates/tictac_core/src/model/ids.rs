//! Opaque identifiers.
//!
//! Every id is a string newtype so that a player id can never be passed where
//! a lobby id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw id string.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the raw id string.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// Connection-scoped identity, independent of authentication.
    ClientId
);

define_id!(
    /// Stable, globally unique player identity.
    PlayerId
);

define_id!(
    /// Lobby identity.
    LobbyId
);

define_id!(
    /// Lobby-scoped member identity exposed to other members instead of the player id.
    MemberId
);

define_id!(
    /// Game identity.
    GameId
);

define_id!(
    /// Rematch negotiation identity.
    RematchId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversion() {
        let id = PlayerId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
        assert_eq!(PlayerId::new(String::from("abc")), id);
    }
}
