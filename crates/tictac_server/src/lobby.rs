//! # Lobby Service
//!
//! Lobby creation, search, join and leave.
//!
//! ## Design
//!
//! - A player is in at most one lobby; `player_lobby` mirrors lobby membership
//! - Membership changes hold `lobbies` then `player_lobby` for the whole check-and-set
//! - The actor gets a full snapshot; other members get an incremental joiner
//!   or leaver notice
//! - A lobby that loses its last member is deleted

use tictac_core::{ClientId, Lobby, LobbyId, MemberId, Player, PlayerId};
use tictac_shared::{NavigationPath, ServerUpdate};
use tracing::{debug, info};

use crate::error::{ServiceError, ServiceResult};
use crate::state::ServerState;
use crate::update_log::Outbox;
use crate::views;

/// Lobby handlers.
pub struct LobbyService<'a> {
    state: &'a ServerState,
}

impl<'a> LobbyService<'a> {
    /// Creates a handler over shared state.
    #[must_use]
    pub fn new(state: &'a ServerState) -> Self {
        Self { state }
    }

    /// Creates a lobby with `player` as creator and sole member.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name, `AlreadyExists` if the player is
    /// already in a lobby, `Internal` if no id could be allocated.
    pub fn create_lobby(
        &self,
        client: &ClientId,
        player: &Player,
        name: &str,
    ) -> ServiceResult<Outbox> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidArgument("lobby name must not be empty".into()));
        }

        let store = &self.state.store;
        let lobby = {
            let mut lobbies = store.lobbies.write();
            let mut player_lobby = store.player_lobby.write();

            if let Some(current) = player_lobby.get(&player.id) {
                if lobbies.get(current).is_some_and(|lobby| lobby.is_member(&player.id)) {
                    return Err(ServiceError::AlreadyExists("player is already in a lobby".into()));
                }
                debug!(player = %player.id, lobby = %current, "stale lobby index dropped");
                player_lobby.remove(&player.id);
            }

            let lobby_id: LobbyId = self
                .state
                .allocate_id("lobby", |id| lobbies.contains_key(id))?;
            let member_id: MemberId = self.state.allocate_id("member", |_| false)?;
            let lobby = Lobby::new(lobby_id.clone(), name, player.id.clone(), member_id);

            lobbies.insert(lobby_id.clone(), lobby.clone());
            player_lobby.insert(player.id.clone(), lobby_id);
            lobby
        };
        info!(player = %player.id, lobby = %lobby.id, name, "lobby created");

        let mut outbox = Outbox::new();
        outbox.push(
            client,
            [
                ServerUpdate::navigate(NavigationPath::MyLobby),
                ServerUpdate::MyLobbyDetails {
                    lobby: views::lobby_details(store, &lobby),
                },
            ],
        );
        Ok(outbox)
    }

    /// Adds `player` to a lobby.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown lobby, `AlreadyExists` if the player is
    /// already in a lobby.
    pub fn join_lobby(
        &self,
        client: &ClientId,
        player: &Player,
        lobby_id: &LobbyId,
    ) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let (lobby, member_id) = {
            let mut lobbies = store.lobbies.write();
            let mut player_lobby = store.player_lobby.write();

            if !lobbies.contains_key(lobby_id) {
                return Err(ServiceError::NotFound("lobby does not exist".into()));
            }

            if let Some(current) = player_lobby.get(&player.id) {
                if lobbies.get(current).is_some_and(|lobby| lobby.is_member(&player.id)) {
                    return Err(ServiceError::AlreadyExists("player is already in a lobby".into()));
                }
                debug!(player = %player.id, lobby = %current, "stale lobby index dropped");
                player_lobby.remove(&player.id);
            }

            let Some(lobby) = lobbies.get_mut(lobby_id) else {
                return Err(ServiceError::NotFound("lobby does not exist".into()));
            };
            let member_id: MemberId = self
                .state
                .allocate_id("member", |id| lobby.has_member_id(id))?;
            lobby.add_member(player.id.clone(), member_id.clone());
            player_lobby.insert(player.id.clone(), lobby_id.clone());
            (lobby.clone(), member_id)
        };
        info!(
            player = %player.id,
            lobby = %lobby.id,
            members = lobby.member_count(),
            "lobby joined"
        );

        let mut outbox = Outbox::new();
        outbox.push(
            client,
            [
                ServerUpdate::navigate(NavigationPath::MyLobby),
                ServerUpdate::MyLobbyDetails {
                    lobby: views::lobby_details(store, &lobby),
                },
            ],
        );

        let joiner = views::member_view(&member_id, &player.display_name);
        let members = lobby.members().map(|(member, _)| member);
        self.notify_members(&mut outbox, members, &player.id, |_| {
            ServerUpdate::MyLobbyJoiner {
                member: joiner.clone(),
            }
        });
        Ok(outbox)
    }

    /// Removes `player` from their lobby.
    ///
    /// # Errors
    ///
    /// `NotFound` if the player is in no lobby or the lobby record is gone.
    pub fn leave_my_lobby(&self, client: &ClientId, player: &Player) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let (lobby_id, member_id, remaining) = {
            let mut lobbies = store.lobbies.write();
            let mut player_lobby = store.player_lobby.write();

            let lobby_id = player_lobby
                .get(&player.id)
                .cloned()
                .ok_or_else(|| {
                    ServiceError::NotFound("player does not belong to any lobby".into())
                })?;

            let Some(lobby) = lobbies.get_mut(&lobby_id) else {
                player_lobby.remove(&player.id);
                return Err(ServiceError::NotFound("lobby does not exist".into()));
            };
            let Some(member_id) = lobby.remove_member(&player.id) else {
                player_lobby.remove(&player.id);
                return Err(ServiceError::NotFound("player does not belong to any lobby".into()));
            };
            player_lobby.remove(&player.id);

            let remaining: Vec<PlayerId> =
                lobby.members().map(|(member, _)| member.clone()).collect();
            if lobby.is_empty() {
                lobbies.remove(&lobby_id);
                debug!(lobby = %lobby_id, "empty lobby removed");
            }
            (lobby_id, member_id, remaining)
        };
        info!(player = %player.id, lobby = %lobby_id, "lobby left");

        let mut outbox = Outbox::new();
        let leaver = views::member_view(&member_id, &player.display_name);
        self.notify_members(&mut outbox, remaining.iter(), &player.id, |_| {
            ServerUpdate::MyLobbyLeaver {
                member: leaver.clone(),
            }
        });
        outbox.push(client, [ServerUpdate::navigate(NavigationPath::Home)]);
        Ok(outbox)
    }

    /// Case-insensitive substring search over lobby names.
    ///
    /// Hits are ordered by name, then id, and the first `limit` are returned.
    /// `limit` is capped by the configured search limit. Read-only.
    ///
    /// # Errors
    ///
    /// Never fails; the result type matches the other handlers.
    pub fn search_lobby(
        &self,
        client: &ClientId,
        needle: &str,
        limit: Option<usize>,
    ) -> ServiceResult<Outbox> {
        let cap = limit.map_or(self.state.config.search_limit, |limit| {
            limit.min(self.state.config.search_limit)
        });

        let mut hits = Vec::new();
        if cap > 0 {
            self.state.store.lobbies.for_each(|_, lobby| {
                if lobby.matches(needle) {
                    hits.push(views::lobby_summary(lobby));
                }
                true
            });
        }
        hits.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.lobby_id.cmp(&b.lobby_id)));
        hits.truncate(cap);
        debug!(client = %client, needle, hits = hits.len(), "lobby search");

        let mut outbox = Outbox::new();
        outbox.push(client, [ServerUpdate::LobbySearchResult { lobbies: hits }]);
        Ok(outbox)
    }

    fn notify_members<'m>(
        &self,
        outbox: &mut Outbox,
        members: impl Iterator<Item = &'m PlayerId>,
        actor: &PlayerId,
        update: impl Fn(&PlayerId) -> ServerUpdate,
    ) {
        for member in members.filter(|member| *member != actor) {
            if let Some(member_client) = self.state.client_of(member) {
                outbox.push(&member_client, [update(member)]);
            }
        }
    }
}
