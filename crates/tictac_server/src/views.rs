//! Builders for the client-facing views of store entities.

use tictac_core::{EntityStore, Game, GameResult, Lobby, MemberId, PlayerId};
use tictac_shared::{
    LobbyDetails, LobbySummary, MemberView, NavigationPath, ServerUpdate, Technicality,
};

pub(crate) fn member_view(member_id: &MemberId, display_name: &str) -> MemberView {
    MemberView {
        member_id: member_id.clone(),
        display_name: display_name.to_owned(),
    }
}

/// Full snapshot of a lobby, members ordered by member id.
///
/// Reads `players`; never call while holding a guard on it.
pub(crate) fn lobby_details(store: &EntityStore, lobby: &Lobby) -> LobbyDetails {
    let mut members: Vec<MemberView> = lobby
        .members()
        .filter_map(|(player_id, member_id)| {
            store
                .players
                .get(player_id)
                .map(|player| member_view(member_id, &player.display_name))
        })
        .collect();
    members.sort_by(|a, b| a.member_id.cmp(&b.member_id));

    LobbyDetails {
        lobby_id: lobby.id.clone(),
        name: lobby.name.clone(),
        members,
    }
}

pub(crate) fn lobby_summary(lobby: &Lobby) -> LobbySummary {
    LobbySummary {
        lobby_id: lobby.id.clone(),
        name: lobby.name.clone(),
        member_count: lobby.member_count(),
    }
}

/// Navigation, game start and next mover, as seen by `player`.
pub(crate) fn game_opening(game: &Game, player: &PlayerId) -> Vec<ServerUpdate> {
    let Some(you) = game.mark_of(player) else {
        return Vec::new();
    };
    vec![
        ServerUpdate::navigate(NavigationPath::Game),
        ServerUpdate::GameStart {
            you,
            other: you.other(),
        },
        ServerUpdate::NextMover {
            mover: game.current_mover(),
        },
    ]
}

/// One move update per occupied cell, in position order.
pub(crate) fn move_replay(game: &Game) -> Vec<ServerUpdate> {
    game.board()
        .occupied()
        .filter_map(|(position, occupant)| {
            game.mark_of(occupant)
                .map(|mover| ServerUpdate::Move { position, mover })
        })
        .collect()
}

/// The terminal outcome of a finished game.
pub(crate) fn game_outcome(game: &Game) -> Option<ServerUpdate> {
    match (game.result(), game.winner()) {
        (GameResult::Win, Some(winner)) => Some(ServerUpdate::Winner {
            winner,
            technicality: Technicality::NoProblem,
        }),
        (GameResult::WinByForfeit, Some(winner)) => Some(ServerUpdate::Winner {
            winner,
            technicality: Technicality::ByForfeit,
        }),
        (GameResult::Draw, _) => Some(ServerUpdate::Draw),
        _ => None,
    }
}
