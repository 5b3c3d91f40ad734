//! Lobbies: pre-game groupings of players.

use std::collections::BTreeMap;

use super::ids::{LobbyId, MemberId, PlayerId};

/// A lobby and its member set.
///
/// Each member carries a lobby-scoped [`MemberId`] so that snapshots sent to
/// other members never expose player ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lobby {
    /// Lobby id.
    pub id: LobbyId,
    /// Display name, matched by search.
    pub name: String,
    /// Player who created the lobby.
    pub creator: PlayerId,
    members: BTreeMap<PlayerId, MemberId>,
}

impl Lobby {
    /// Creates a lobby whose only member is its creator.
    #[must_use]
    pub fn new(
        id: LobbyId,
        name: impl Into<String>,
        creator: PlayerId,
        creator_member: MemberId,
    ) -> Self {
        let mut members = BTreeMap::new();
        members.insert(creator.clone(), creator_member);
        Self {
            id,
            name: name.into(),
            creator,
            members,
        }
    }

    /// Adds a member. Returns false if the player is already a member.
    pub fn add_member(&mut self, player: PlayerId, member: MemberId) -> bool {
        if self.members.contains_key(&player) {
            return false;
        }
        self.members.insert(player, member);
        true
    }

    /// Removes a member, returning its member id.
    pub fn remove_member(&mut self, player: &PlayerId) -> Option<MemberId> {
        self.members.remove(player)
    }

    /// Returns true if the player is a member.
    #[must_use]
    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.members.contains_key(player)
    }

    /// Returns the member id of a player.
    #[must_use]
    pub fn member_id(&self, player: &PlayerId) -> Option<&MemberId> {
        self.members.get(player)
    }

    /// Resolves a member id back to the player it was assigned to.
    #[must_use]
    pub fn player_for_member(&self, member: &MemberId) -> Option<&PlayerId> {
        self.members
            .iter()
            .find(|(_, assigned)| *assigned == member)
            .map(|(player, _)| player)
    }

    /// Returns true if a member id is already assigned in this lobby.
    #[must_use]
    pub fn has_member_id(&self, member: &MemberId) -> bool {
        self.members.values().any(|assigned| assigned == member)
    }

    /// Iterates `(player, member id)` pairs.
    pub fn members(&self) -> impl Iterator<Item = (&PlayerId, &MemberId)> {
        self.members.iter()
    }

    /// Number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns true once the last member left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Case-insensitive substring match on the lobby name.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}
