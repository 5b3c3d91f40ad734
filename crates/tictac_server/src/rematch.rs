//! # Rematch Coordinator
//!
//! Two-party yes/no negotiation after a won or drawn game.
//!
//! ## Design
//!
//! - The status is re-derived from both decisions after every `decide`
//! - A resolved offer is removed under the `rematches` write lock, so it
//!   resolves exactly once no matter how the two decisions race
//! - Resolution releases both players' rematch and game indices; a
//!   confirmed offer then starts a fresh game for the same pair

use tictac_core::{ClientId, Decision, Game, Player, PlayerId, Rematch, RematchId, RematchStatus};
use tictac_shared::{RematchState, ServerUpdate};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::initial::initial_updates;
use crate::state::ServerState;
use crate::update_log::Outbox;
use crate::views;

/// Rematch handlers.
pub struct RematchCoordinator<'a> {
    state: &'a ServerState,
}

impl<'a> RematchCoordinator<'a> {
    /// Creates a handler over shared state.
    #[must_use]
    pub fn new(state: &'a ServerState) -> Self {
        Self { state }
    }

    /// Opens an offer between the two participants of a finished game.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if either participant is already negotiating,
    /// `Internal` if no id could be allocated.
    pub fn offer(&self, game: &Game) -> ServiceResult<Rematch> {
        let store = &self.state.store;
        let mut rematches = store.rematches.write();
        let mut player_rematch = store.player_rematch.write();

        let [first, second] = game.participants();
        for player in [first, second] {
            if let Some(current) = player_rematch.get(player) {
                if rematches
                    .get(current)
                    .is_some_and(|rematch| rematch.decision_of(player).is_some())
                {
                    return Err(ServiceError::AlreadyExists(format!(
                        "player {player} already has a rematch offer"
                    )));
                }
                player_rematch.remove(player);
            }
        }

        let id: RematchId = self
            .state
            .allocate_id("rematch", |id| rematches.contains_key(id))?;
        let rematch = Rematch::new(id.clone(), first.clone(), second.clone());
        rematches.insert(id.clone(), rematch.clone());
        player_rematch.insert(first.clone(), id.clone());
        player_rematch.insert(second.clone(), id);
        info!(rematch = %rematch.id, game = %game.id, "rematch offered");
        Ok(rematch)
    }

    /// Records the decision of the player on `client` and evaluates the offer.
    ///
    /// # Errors
    ///
    /// `NotFound` if the player has no offer or is not one of its parties.
    pub fn decide(&self, client: &ClientId, player: &Player, yes: bool) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let rematch_id = store
            .player_rematch
            .get(&player.id)
            .ok_or_else(|| ServiceError::NotFound("player has no rematch offer".into()))?;
        let decision = if yes { Decision::Yes } else { Decision::No };

        let (rematch, status) = {
            let mut rematches = store.rematches.write();
            let Some(rematch) = rematches.get_mut(&rematch_id) else {
                store.player_rematch.delete_if(&player.id, &rematch_id);
                return Err(ServiceError::NotFound("rematch does not exist".into()));
            };
            if !rematch.decide(&player.id, decision) {
                return Err(ServiceError::NotFound(
                    "player is not part of this rematch".into(),
                ));
            }
            let status = rematch.status();
            let rematch = rematch.clone();
            if status != RematchStatus::Pending {
                rematches.remove(&rematch_id);
            }
            (rematch, status)
        };
        debug!(client = %client, rematch = %rematch.id, ?decision, ?status, "rematch decision");

        let [first, second] = rematch.parties();
        let mut outbox = Outbox::new();
        match status {
            RematchStatus::Pending => {
                for party in [first, second] {
                    self.push_to(&mut outbox, party, |_| {
                        vec![ServerUpdate::Rematch {
                            state: RematchState::Pending,
                        }]
                    });
                }
            }
            RematchStatus::Cancelled => {
                self.release(&rematch);
                info!(rematch = %rematch.id, "rematch denied");
                self.deny(&mut outbox, [first, second]);
            }
            RematchStatus::Confirmed => {
                self.release(&rematch);
                match self.state.games().setup_game(first, first, second) {
                    Ok(game) => {
                        info!(rematch = %rematch.id, game = %game.id, "rematch approved");
                        for party in [first, second] {
                            self.push_to(&mut outbox, party, |_| {
                                let mut updates = vec![ServerUpdate::Rematch {
                                    state: RematchState::Approved,
                                }];
                                updates.extend(views::game_opening(&game, party));
                                updates
                            });
                        }
                    }
                    Err(err) => {
                        warn!(rematch = %rematch.id, error = %err, "rematch game could not start");
                        self.deny(&mut outbox, [first, second]);
                    }
                }
            }
        }
        Ok(outbox)
    }

    /// Clears both parties' rematch index and their finished game.
    fn release(&self, rematch: &Rematch) {
        let store = &self.state.store;
        for party in rematch.parties() {
            store.player_rematch.delete_if(party, &rematch.id);
            if let Some(game) = store.game_of(party) {
                if game.result().is_terminal() {
                    store.player_game.delete_if(party, &game.id);
                    store.games.delete(&game.id);
                }
            }
        }
    }

    fn deny(&self, outbox: &mut Outbox, parties: [&PlayerId; 2]) {
        for party in parties {
            self.push_to(outbox, party, |client| {
                let mut updates = vec![ServerUpdate::Rematch {
                    state: RematchState::Denied,
                }];
                updates.extend(initial_updates(self.state, client));
                updates
            });
        }
    }

    fn push_to(
        &self,
        outbox: &mut Outbox,
        party: &PlayerId,
        updates: impl FnOnce(&ClientId) -> Vec<ServerUpdate>,
    ) {
        if let Some(client) = self.state.client_of(party) {
            let updates = updates(&client);
            outbox.push(&client, updates);
        }
    }
}
