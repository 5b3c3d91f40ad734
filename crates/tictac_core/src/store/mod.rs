//! # Entity Store
//!
//! Every collection the broker keeps, each behind its own lock.
//!
//! ## Lock Order
//!
//! An operation that needs more than one guard at a time takes them in this
//! order and releases them before publishing updates:
//!
//! ```text
//! players -> player_names -> lobbies -> player_lobby -> games -> player_game
//!         -> rematches -> player_rematch -> bindings -> clients
//! ```
//!
//! The update log is always locked last, and never while a store guard is held.
//! `parking_lot` locks are not reentrant: while holding a guard on a
//! collection, read it through the guard, not through [`Store::get`].

mod bindings;
mod map;

pub use bindings::Bindings;
pub use map::Store;

use crate::model::{
    Client, ClientId, Game, GameId, Lobby, LobbyId, Player, PlayerId, Rematch, RematchId,
};

/// The broker's in-memory state.
#[derive(Default)]
pub struct EntityStore {
    /// Players by id.
    pub players: Store<PlayerId, Player>,
    /// Login name -> player id. Names are unique.
    pub player_names: Store<String, PlayerId>,
    /// Lobbies by id.
    pub lobbies: Store<LobbyId, Lobby>,
    /// Player -> the lobby they are in.
    pub player_lobby: Store<PlayerId, LobbyId>,
    /// Games by id.
    pub games: Store<GameId, Game>,
    /// Player -> the game they are in.
    pub player_game: Store<PlayerId, GameId>,
    /// Rematch offers by id.
    pub rematches: Store<RematchId, Rematch>,
    /// Player -> the rematch they are negotiating.
    pub player_rematch: Store<PlayerId, RematchId>,
    /// Client <-> player bindings.
    pub bindings: Bindings,
    /// Registered clients.
    pub clients: Store<ClientId, Client>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lobby a player is in, deleting the index entry if it dangles.
    #[must_use]
    pub fn lobby_of(&self, player: &PlayerId) -> Option<Lobby> {
        let lobby_id = self.player_lobby.get(player)?;
        match self.lobbies.get(&lobby_id) {
            Some(lobby) if lobby.is_member(player) => Some(lobby),
            _ => {
                self.player_lobby.delete_if(player, &lobby_id);
                None
            }
        }
    }

    /// Game a player is in, deleting the index entry if it dangles.
    #[must_use]
    pub fn game_of(&self, player: &PlayerId) -> Option<Game> {
        let game_id = self.player_game.get(player)?;
        match self.games.get(&game_id) {
            Some(game) if game.mark_of(player).is_some() => Some(game),
            _ => {
                self.player_game.delete_if(player, &game_id);
                None
            }
        }
    }

    /// Rematch a player is negotiating, deleting the index entry if it dangles.
    #[must_use]
    pub fn rematch_of(&self, player: &PlayerId) -> Option<Rematch> {
        let rematch_id = self.player_rematch.get(player)?;
        match self.rematches.get(&rematch_id) {
            Some(rematch) if rematch.decision_of(player).is_some() => Some(rematch),
            _ => {
                self.player_rematch.delete_if(player, &rematch_id);
                None
            }
        }
    }

    /// Player currently signed in from `client`.
    ///
    /// A binding whose player no longer exists is removed.
    #[must_use]
    pub fn player_for_client(&self, client: &ClientId) -> Option<Player> {
        let player_id = self.bindings.player_of(client)?;
        let player = self.players.get(&player_id);
        if player.is_none() {
            self.bindings.unbind_client(client);
        }
        player
    }
}
