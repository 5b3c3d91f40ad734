//! # Initial State
//!
//! What a client must be told to recover its full context: sent on every
//! stream open, after sign-in, and after a rematch is declined.
//!
//! ## Precedence
//!
//! 1. Not signed in: welcome screen
//! 2. Undecided rematch: rematch screen
//! 3. Game: game screen, start, next mover, every move so far, and the
//!    outcome if the game ended while the player was away
//! 4. Lobby: lobby screen and a lobby snapshot
//! 5. Otherwise: home
//!
//! Authenticated clients always get their display name first.

use tictac_core::{ClientId, Decision, Player, RematchStatus};
use tictac_shared::{NavigationPath, RematchState, ServerUpdate};
use tracing::debug;

use crate::state::ServerState;
use crate::views;

/// Computes the initial updates for `client`.
///
/// A finished game without a pending rematch is replayed once; the player's
/// game index entry is released afterwards.
#[must_use]
pub fn initial_updates(state: &ServerState, client: &ClientId) -> Vec<ServerUpdate> {
    let Some(player) = state.store.player_for_client(client) else {
        return vec![ServerUpdate::navigate(NavigationPath::Welcome)];
    };

    let mut updates = vec![ServerUpdate::PlayerDisplayName {
        display_name: player.display_name.clone(),
    }];

    if let Some(rematch) = rematch_updates(state, &player) {
        updates.extend(rematch);
    } else if let Some(game) = game_updates(state, &player) {
        updates.extend(game);
    } else if let Some(lobby) = state.store.lobby_of(&player.id) {
        updates.push(ServerUpdate::navigate(NavigationPath::MyLobby));
        updates.push(ServerUpdate::MyLobbyDetails {
            lobby: views::lobby_details(&state.store, &lobby),
        });
    } else {
        updates.push(ServerUpdate::navigate(NavigationPath::Home));
    }

    updates
}

fn rematch_updates(state: &ServerState, player: &Player) -> Option<Vec<ServerUpdate>> {
    let rematch = state.store.rematch_of(&player.id)?;
    if rematch.status() != RematchStatus::Pending {
        return None;
    }
    let decision = rematch.decision_of(&player.id)?;
    let rematch_state = if decision == Decision::Undecided {
        RematchState::Offered
    } else {
        RematchState::Pending
    };
    Some(vec![
        ServerUpdate::navigate(NavigationPath::Rematch),
        ServerUpdate::Rematch {
            state: rematch_state,
        },
    ])
}

fn game_updates(state: &ServerState, player: &Player) -> Option<Vec<ServerUpdate>> {
    let game = state.store.game_of(&player.id)?;

    let mut updates = views::game_opening(&game, &player.id);
    updates.extend(views::move_replay(&game));

    if let Some(outcome) = views::game_outcome(&game) {
        updates.push(outcome);
        if state.store.player_game.delete_if(&player.id, &game.id) {
            debug!(player = %player.id, game = %game.id, "finished game replayed, index released");
        }
        let opponent_still_attached = game
            .opponent_of(&player.id)
            .and_then(|opponent| state.store.player_game.get(opponent))
            .is_some_and(|game_id| game_id == game.id);
        if !opponent_still_attached {
            state.store.games.delete(&game.id);
        }
    }

    Some(updates)
}
