//! # Server Updates
//!
//! Everything pushed to a client's subscription stream. Updates are
//! immutable once enqueued and delivered in enqueue order.

use serde::{Deserialize, Serialize};
use tictac_core::{ClientId, LobbyId, Mark, MemberId};

use crate::outcome::Outcome;
use crate::request::RequestKind;

/// Screen the client should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationPath {
    /// Not signed in.
    Welcome,
    /// Signed in, not in a lobby or game.
    Home,
    /// Inside a lobby.
    MyLobby,
    /// Playing.
    Game,
    /// Deciding on a rematch.
    Rematch,
}

/// How a win was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technicality {
    /// Three in a row.
    NoProblem,
    /// The opponent could not be reached.
    ByForfeit,
}

/// Rematch negotiation state as seen by a party.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RematchState {
    /// A rematch was offered after a finished game.
    Offered,
    /// At least one party has not answered yet.
    Pending,
    /// Both accepted; a new game follows.
    Approved,
    /// Someone declined.
    Denied,
}

/// A lobby member as other players see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    /// Lobby-scoped member id.
    pub member_id: MemberId,
    /// Display name.
    pub display_name: String,
}

/// Full lobby snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyDetails {
    /// Lobby id.
    pub lobby_id: LobbyId,
    /// Lobby name.
    pub name: String,
    /// Members, ordered by member id.
    pub members: Vec<MemberView>,
}

/// One lobby search hit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySummary {
    /// Lobby id.
    pub lobby_id: LobbyId,
    /// Lobby name.
    pub name: String,
    /// Number of members.
    pub member_count: usize,
}

/// An event pushed to one client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerUpdate {
    /// The id this stream is bound to. Always the first update of a stream.
    ClientAssignment {
        /// Assigned client id.
        client_id: ClientId,
    },
    /// Liveness probe.
    Ping,
    /// Switch screens.
    Navigation {
        /// Target screen.
        path: NavigationPath,
    },
    /// Result of a request from this client.
    Reply {
        /// Which request this answers.
        request: RequestKind,
        /// What happened.
        outcome: Outcome,
    },
    /// The signed-in player's display name. Empty after being signed out.
    PlayerDisplayName {
        /// Display name.
        display_name: String,
    },
    /// Message about this client's session, e.g. being superseded.
    PlayerClient {
        /// Message text.
        message: String,
    },
    /// Full snapshot of the client's lobby.
    MyLobbyDetails {
        /// Snapshot.
        lobby: LobbyDetails,
    },
    /// Someone joined the client's lobby.
    MyLobbyJoiner {
        /// The new member.
        member: MemberView,
    },
    /// Someone left the client's lobby.
    MyLobbyLeaver {
        /// The departed member.
        member: MemberView,
    },
    /// Lobby search hits.
    LobbySearchResult {
        /// Matches, at most the search limit.
        lobbies: Vec<LobbySummary>,
    },
    /// A game started.
    GameStart {
        /// This client's mark.
        you: Mark,
        /// The opponent's mark.
        other: Mark,
    },
    /// Whose turn it is.
    NextMover {
        /// Mark to move.
        mover: Mark,
    },
    /// A cell was occupied.
    Move {
        /// Cell index.
        position: usize,
        /// Mark that moved.
        mover: Mark,
    },
    /// The game was won.
    Winner {
        /// Winning mark.
        winner: Mark,
        /// How.
        technicality: Technicality,
    },
    /// The game ended in a draw.
    Draw,
    /// Rematch negotiation progress.
    Rematch {
        /// Current state.
        state: RematchState,
    },
}

impl ServerUpdate {
    /// Reply to a request.
    #[must_use]
    pub fn reply(request: RequestKind, outcome: Outcome) -> Self {
        Self::Reply { request, outcome }
    }

    /// Successful reply to a request.
    #[must_use]
    pub fn reply_ok(request: RequestKind) -> Self {
        Self::Reply {
            request,
            outcome: Outcome::ok(),
        }
    }

    /// Navigation update.
    #[inline]
    #[must_use]
    pub const fn navigate(path: NavigationPath) -> Self {
        Self::Navigation { path }
    }

    /// Returns true for liveness pings.
    #[inline]
    #[must_use]
    pub const fn is_ping(&self) -> bool {
        matches!(self, Self::Ping)
    }
}
