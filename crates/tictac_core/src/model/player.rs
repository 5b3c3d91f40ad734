//! Clients and players.

use super::ids::{ClientId, PlayerId};

/// An opaque connection identity, created on first contact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Client {
    /// Client id.
    pub id: ClientId,
}

impl Client {
    /// Creates a client record.
    #[must_use]
    pub fn new(id: ClientId) -> Self {
        Self { id }
    }
}

/// A persistent authenticated identity.
///
/// Players are never destroyed; `name` is globally unique and immutable,
/// `display_name` is what other players see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    /// Player id.
    pub id: PlayerId,
    /// Unique sign-in name.
    pub name: String,
    /// Sign-in secret.
    pub secret: String,
    /// Mutable display name.
    pub display_name: String,
}

impl Player {
    /// Creates a player.
    #[must_use]
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        secret: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            secret: secret.into(),
            display_name: display_name.into(),
        }
    }

    /// Returns true if `secret` matches this player's secret.
    #[must_use]
    pub fn verify_secret(&self, secret: &str) -> bool {
        self.secret == secret
    }
}
