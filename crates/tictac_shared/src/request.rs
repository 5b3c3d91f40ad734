//! Inbound requests.

use serde::{Deserialize, Serialize};
use tictac_core::{LobbyId, MemberId};

/// A tagged request accepted by `notify`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientRequest {
    /// Create a player and sign in as it.
    SignUp {
        /// Unique login name.
        name: String,
        /// Secret checked on sign-in.
        secret: String,
    },
    /// Sign in as an existing player.
    SignIn {
        /// Login name.
        name: String,
        /// Secret.
        secret: String,
    },
    /// Release the player bound to this client.
    SignOut,
    /// Change the name other players see.
    ChangeDisplayName {
        /// New display name.
        display_name: String,
    },
    /// Create a lobby and become its first member.
    CreateLobby {
        /// Lobby name.
        name: String,
    },
    /// Join an existing lobby.
    JoinLobby {
        /// Lobby to join.
        lobby_id: LobbyId,
    },
    /// Leave the current lobby.
    LeaveMyLobby,
    /// Case-insensitive search over lobby names.
    SearchLobby {
        /// Substring to look for.
        name: String,
        /// Result cap, bounded by the server's own limit.
        limit: Option<usize>,
    },
    /// Start a game between two members of the requester's lobby.
    CreateGame {
        /// First participant.
        first: MemberId,
        /// Second participant.
        second: MemberId,
    },
    /// Occupy a cell.
    MakeMove {
        /// Cell index, 0..9 row-major.
        position: i32,
    },
    /// Answer a rematch offer.
    Rematch {
        /// True to accept.
        yes: bool,
    },
}

/// Request discriminator, echoed in replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// [`ClientRequest::SignUp`]
    SignUp,
    /// [`ClientRequest::SignIn`]
    SignIn,
    /// [`ClientRequest::SignOut`]
    SignOut,
    /// [`ClientRequest::ChangeDisplayName`]
    ChangeDisplayName,
    /// [`ClientRequest::CreateLobby`]
    CreateLobby,
    /// [`ClientRequest::JoinLobby`]
    JoinLobby,
    /// [`ClientRequest::LeaveMyLobby`]
    LeaveMyLobby,
    /// [`ClientRequest::SearchLobby`]
    SearchLobby,
    /// [`ClientRequest::CreateGame`]
    CreateGame,
    /// [`ClientRequest::MakeMove`]
    MakeMove,
    /// [`ClientRequest::Rematch`]
    Rematch,
}

impl ClientRequest {
    /// Discriminator of this request.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::SignUp { .. } => RequestKind::SignUp,
            Self::SignIn { .. } => RequestKind::SignIn,
            Self::SignOut => RequestKind::SignOut,
            Self::ChangeDisplayName { .. } => RequestKind::ChangeDisplayName,
            Self::CreateLobby { .. } => RequestKind::CreateLobby,
            Self::JoinLobby { .. } => RequestKind::JoinLobby,
            Self::LeaveMyLobby => RequestKind::LeaveMyLobby,
            Self::SearchLobby { .. } => RequestKind::SearchLobby,
            Self::CreateGame { .. } => RequestKind::CreateGame,
            Self::MakeMove { .. } => RequestKind::MakeMove,
            Self::Rematch { .. } => RequestKind::Rematch,
        }
    }
}
