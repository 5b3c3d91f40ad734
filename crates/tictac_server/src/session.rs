//! # Session Manager
//!
//! Sign-up, sign-in, sign-out and display names.
//!
//! ## Design
//!
//! - One live client per player: signing in elsewhere supersedes the old client
//! - Both directions of the client/player binding change under one lock
//! - A signed-in client always receives its full initial state

use rand::distributions::Alphanumeric;
use rand::Rng;
use tictac_core::{ClientId, Player, PlayerId};
use tictac_shared::{NavigationPath, ServerUpdate};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::initial::initial_updates;
use crate::state::ServerState;
use crate::update_log::Outbox;
use crate::views;

/// Message pushed to a client that lost its player to a newer sign-in.
pub const SUPERSEDED_MESSAGE: &str = "You are using another client";

/// Authentication lifecycle handlers.
pub struct SessionManager<'a> {
    state: &'a ServerState,
}

impl<'a> SessionManager<'a> {
    /// Creates a handler over shared state.
    #[must_use]
    pub fn new(state: &'a ServerState) -> Self {
        Self { state }
    }

    /// Creates a player and signs it in on `client`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name or secret, `AlreadyExists` if the
    /// name is taken, `Internal` if no player id could be allocated,
    /// `FailedPrecondition` if `client` is held by a player who is still in
    /// a game or rematch.
    pub fn sign_up(&self, client: &ClientId, name: &str, secret: &str) -> ServiceResult<Outbox> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("player name must not be empty".into()));
        }
        if secret.is_empty() {
            return Err(ServiceError::InvalidArgument("secret must not be empty".into()));
        }

        let store = &self.state.store;
        self.ensure_client_can_switch(client, None)?;
        let player = {
            let mut players = store.players.write();
            let mut names = store.player_names.write();
            if names.contains_key(name) {
                return Err(ServiceError::AlreadyExists(
                    "player with name already exists".into(),
                ));
            }
            let id: PlayerId = self
                .state
                .allocate_id("player", |id| players.contains_key(id))?;
            let player = Player::new(
                id.clone(),
                name,
                secret,
                generate_display_name(self.state.config.display_name_suffix_len),
            );
            names.insert(name.to_owned(), id.clone());
            players.insert(id, player.clone());
            player
        };

        let mut outbox = Outbox::new();
        if let Some(old_client) = store.bindings.bind(client.clone(), player.id.clone()) {
            outbox.push(&old_client, superseded_updates());
        }
        info!(client = %client, player = %player.id, name, "player signed up");

        outbox.push(client, initial_updates(self.state, client));
        Ok(outbox)
    }

    /// Signs an existing player in on `client`.
    ///
    /// A different client the player was signed in on is unbound and told so.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown name, `PermissionDenied` for a wrong secret,
    /// `FailedPrecondition` if `client` is held by another player who is
    /// still in a game or rematch.
    pub fn sign_in(&self, client: &ClientId, name: &str, secret: &str) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let player_id = store
            .player_names
            .get(&name.to_owned())
            .ok_or_else(|| ServiceError::NotFound("player with name not found".into()))?;
        let player = store
            .players
            .get(&player_id)
            .ok_or_else(|| ServiceError::Internal("player details not found".into()))?;
        if !player.verify_secret(secret) {
            return Err(ServiceError::PermissionDenied(
                "player credentials not valid".into(),
            ));
        }
        self.ensure_client_can_switch(client, Some(&player.id))?;

        let mut outbox = Outbox::new();
        if let Some(old_client) = store.bindings.bind(client.clone(), player.id.clone()) {
            info!(player = %player.id, old = %old_client, new = %client, "client superseded");
            outbox.push(&old_client, superseded_updates());
        }
        info!(client = %client, player = %player.id, "player signed in");

        outbox.push(client, initial_updates(self.state, client));
        Ok(outbox)
    }

    /// Signs the player on `client` out.
    ///
    /// # Errors
    ///
    /// `NotFound` if nobody is signed in on `client`, `FailedPrecondition`
    /// while the player has an unfinished game or an open rematch offer.
    pub fn sign_out(&self, client: &ClientId) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let player = store
            .player_for_client(client)
            .ok_or_else(|| ServiceError::NotFound("player not found".into()))?;

        self.ensure_can_leave(&player.id)?;
        if let Some(game) = store.game_of(&player.id) {
            store.player_game.delete_if(&player.id, &game.id);
        }

        store.bindings.unbind_client(client);
        info!(client = %client, player = %player.id, "player signed out");

        let mut outbox = Outbox::new();
        outbox.push(client, [ServerUpdate::navigate(NavigationPath::Welcome)]);
        Ok(outbox)
    }

    /// Refuses to take `client` away from a player who is bound to it and
    /// still owes a move or a rematch decision. `next` is the player about to
    /// be bound; rebinding the same player is always allowed.
    fn ensure_client_can_switch(
        &self,
        client: &ClientId,
        next: Option<&PlayerId>,
    ) -> ServiceResult<()> {
        match self.state.store.bindings.player_of(client) {
            Some(current) if next != Some(&current) => self.ensure_can_leave(&current),
            _ => Ok(()),
        }
    }

    fn ensure_can_leave(&self, player: &PlayerId) -> ServiceResult<()> {
        let store = &self.state.store;
        if let Some(game) = store.game_of(player) {
            if !game.result().is_terminal() {
                return Err(ServiceError::FailedPrecondition(
                    "player is currently in a game".into(),
                ));
            }
        }
        if store.rematch_of(player).is_some() {
            return Err(ServiceError::FailedPrecondition(
                "player has an open rematch offer".into(),
            ));
        }
        Ok(())
    }

    /// Changes the display name of the player on `client`.
    ///
    /// Every signed-in member of the player's lobby gets a fresh snapshot.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if nobody is signed in, `InvalidArgument` for an empty name.
    pub fn change_display_name(
        &self,
        client: &ClientId,
        display_name: &str,
    ) -> ServiceResult<Outbox> {
        let player = self.state.bound_player(client)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "display name must not be empty".into(),
            ));
        }

        let store = &self.state.store;
        let changed = store
            .players
            .update(&player.id, |player| {
                if player.display_name == display_name {
                    false
                } else {
                    player.display_name = display_name.to_owned();
                    true
                }
            })
            .ok_or_else(|| ServiceError::Internal("player details not found".into()))?;

        let mut outbox = Outbox::new();
        if !changed {
            return Ok(outbox);
        }
        info!(player = %player.id, display_name, "display name changed");

        outbox.push(
            client,
            [ServerUpdate::PlayerDisplayName {
                display_name: display_name.to_owned(),
            }],
        );

        if let Some(lobby) = store.lobby_of(&player.id) {
            let details = views::lobby_details(store, &lobby);
            for (member, _) in lobby.members() {
                if let Some(member_client) = self.state.client_of(member) {
                    outbox.push(
                        &member_client,
                        [ServerUpdate::MyLobbyDetails {
                            lobby: details.clone(),
                        }],
                    );
                }
            }
        }

        Ok(outbox)
    }
}

fn superseded_updates() -> [ServerUpdate; 3] {
    [
        ServerUpdate::navigate(NavigationPath::Welcome),
        ServerUpdate::PlayerDisplayName {
            display_name: String::new(),
        },
        ServerUpdate::PlayerClient {
            message: SUPERSEDED_MESSAGE.to_owned(),
        },
    ]
}

/// `user` followed by `suffix_len` random alphanumerics.
fn generate_display_name(suffix_len: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(suffix_len)
        .map(char::from)
        .collect();
    format!("user{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ServerState {
        ServerState::default()
    }

    #[test]
    fn test_generated_display_name() {
        let name = generate_display_name(12);
        assert_eq!(name.len(), 16);
        assert!(name.starts_with("user"));
        assert!(name[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_sign_up_binds_and_sends_initial_state() {
        let state = state();
        let client = ClientId::from("c1");
        let outbox = state.sessions().sign_up(&client, "alice", "pw").unwrap();

        let player = state.store.player_for_client(&client).unwrap();
        assert_eq!(player.name, "alice");
        assert!(player.display_name.starts_with("user"));

        let updates = outbox.updates_for(&client);
        assert_eq!(
            updates,
            vec![
                ServerUpdate::PlayerDisplayName {
                    display_name: player.display_name
                },
                ServerUpdate::navigate(NavigationPath::Home),
            ]
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let state = state();
        state.sessions().sign_up(&ClientId::from("c1"), "alice", "pw").unwrap();
        let err = state
            .sessions()
            .sign_up(&ClientId::from("c2"), "alice", "other")
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));
        assert_eq!(state.store.players.len(), 1);
    }

    #[test]
    fn test_sign_in_errors() {
        let state = state();
        state.sessions().sign_up(&ClientId::from("c1"), "alice", "pw").unwrap();

        let unknown = state.sessions().sign_in(&ClientId::from("c2"), "bob", "pw");
        assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

        let wrong = state.sessions().sign_in(&ClientId::from("c2"), "alice", "nope");
        assert!(matches!(wrong, Err(ServiceError::PermissionDenied(_))));
    }

    #[test]
    fn test_sign_in_supersedes_old_client() {
        let state = state();
        let old = ClientId::from("old");
        let new = ClientId::from("new");
        state.sessions().sign_up(&old, "alice", "pw").unwrap();

        let outbox = state.sessions().sign_in(&new, "alice", "pw").unwrap();
        assert_eq!(outbox.updates_for(&old), superseded_updates().to_vec());
        assert!(state.store.bindings.player_of(&old).is_none());
        assert!(state.store.player_for_client(&new).is_some());
    }

    #[test]
    fn test_sign_out() {
        let state = state();
        let client = ClientId::from("c1");
        assert!(matches!(
            state.sessions().sign_out(&client),
            Err(ServiceError::NotFound(_))
        ));

        state.sessions().sign_up(&client, "alice", "pw").unwrap();
        let outbox = state.sessions().sign_out(&client).unwrap();
        assert_eq!(
            outbox.updates_for(&client),
            vec![ServerUpdate::navigate(NavigationPath::Welcome)]
        );
        assert!(state.store.bindings.is_empty());
    }

    #[test]
    fn test_change_display_name() {
        let state = state();
        let client = ClientId::from("c1");
        assert!(matches!(
            state.sessions().change_display_name(&client, "Al"),
            Err(ServiceError::Unauthenticated(_))
        ));

        state.sessions().sign_up(&client, "alice", "pw").unwrap();
        assert!(matches!(
            state.sessions().change_display_name(&client, "  "),
            Err(ServiceError::InvalidArgument(_))
        ));

        let outbox = state.sessions().change_display_name(&client, "Al").unwrap();
        assert_eq!(
            outbox.updates_for(&client),
            vec![ServerUpdate::PlayerDisplayName {
                display_name: "Al".into()
            }]
        );

        let unchanged = state.sessions().change_display_name(&client, "Al").unwrap();
        assert!(unchanged.is_empty());
    }
}
