//! # Client / Player Bindings
//!
//! The bidirectional client <-> player index. Both directions live behind a
//! single lock so they can never disagree.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::{ClientId, PlayerId};

#[derive(Default)]
struct BindingTable {
    client_player: HashMap<ClientId, PlayerId>,
    player_client: HashMap<PlayerId, ClientId>,
}

/// Which client a player is signed in from, and vice versa.
///
/// A player is bound to at most one client at a time and a client is bound
/// to at most one player.
#[derive(Default)]
pub struct Bindings {
    table: RwLock<BindingTable>,
}

impl Bindings {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `client` to `player`.
    ///
    /// Any previous binding of either side is removed first. Returns the
    /// client the player was previously bound to, if it differs from `client`.
    pub fn bind(&self, client: ClientId, player: PlayerId) -> Option<ClientId> {
        let mut table = self.table.write();

        if let Some(previous_player) = table.client_player.remove(&client) {
            table.player_client.remove(&previous_player);
        }

        let superseded = table.player_client.remove(&player);
        if let Some(old_client) = &superseded {
            table.client_player.remove(old_client);
        }

        table.client_player.insert(client.clone(), player.clone());
        table.player_client.insert(player, client.clone());

        superseded.filter(|old| *old != client)
    }

    /// Removes the binding of `client`, returning the player it was bound to.
    pub fn unbind_client(&self, client: &ClientId) -> Option<PlayerId> {
        let mut table = self.table.write();
        let player = table.client_player.remove(client)?;
        if table.player_client.get(&player) == Some(client) {
            table.player_client.remove(&player);
        }
        Some(player)
    }

    /// Player signed in from `client`.
    #[must_use]
    pub fn player_of(&self, client: &ClientId) -> Option<PlayerId> {
        self.table.read().client_player.get(client).cloned()
    }

    /// Client `player` is signed in from.
    #[must_use]
    pub fn client_of(&self, player: &PlayerId) -> Option<ClientId> {
        self.table.read().player_client.get(player).cloned()
    }

    /// Number of bound clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().client_player.len()
    }

    /// Returns true when no client is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().client_player.is_empty()
    }
}
