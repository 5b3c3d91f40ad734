//! # Game Engine
//!
//! Game setup and move handling.
//!
//! ## Design
//!
//! - `INITIAL -> ONGOING -> {WIN, DRAW, WIN_BY_FORFEIT}`; terminal states absorb
//! - A move is validated and applied under the `games` write lock, so two
//!   racing moves on one game are serialized
//! - An opponent without a bound client forfeits; the board is left untouched
//! - A win or draw opens a rematch offer; a forfeit does not

use tictac_core::{ClientId, Game, GameId, Mark, MemberId, MoveOutcome, Player, PlayerId};
use tictac_shared::{NavigationPath, RematchState, ServerUpdate, Technicality};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::state::ServerState;
use crate::update_log::Outbox;
use crate::views;

/// What a validated move turned into.
enum Turn {
    Forfeit { winner: Mark },
    Played { outcome: MoveOutcome, game: Game },
}

/// Game handlers.
pub struct GameEngine<'a> {
    state: &'a ServerState,
}

impl<'a> GameEngine<'a> {
    /// Creates a handler over shared state.
    #[must_use]
    pub fn new(state: &'a ServerState) -> Self {
        Self { state }
    }

    /// Starts a game between two members of the creator's lobby.
    ///
    /// # Errors
    ///
    /// `NotFound` if the creator has no lobby, a member id is unknown or a
    /// participant has no bound client; `InvalidArgument` for identical
    /// participants; `AlreadyExists` if either is already in a game.
    pub fn create_game(
        &self,
        client: &ClientId,
        creator: &Player,
        first: &MemberId,
        second: &MemberId,
    ) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let lobby = store
            .lobby_of(&creator.id)
            .ok_or_else(|| ServiceError::NotFound("player does not belong to any lobby".into()))?;
        let resolve = |member: &MemberId| {
            lobby
                .player_for_member(member)
                .cloned()
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("member {member} not found in lobby"))
                })
        };
        let p1 = resolve(first)?;
        let p2 = resolve(second)?;
        if p1 == p2 {
            return Err(ServiceError::InvalidArgument(
                "a game needs two different players".into(),
            ));
        }

        let c1 = self.require_client(&p1)?;
        let c2 = self.require_client(&p2)?;

        let game = self.setup_game(&creator.id, &p1, &p2)?;
        debug!(client = %client, game = %game.id, "game requested");

        let mut outbox = Outbox::new();
        outbox.push(&c1, views::game_opening(&game, &p1));
        outbox.push(&c2, views::game_opening(&game, &p2));
        Ok(outbox)
    }

    /// Creates a game record and indexes both players under it.
    ///
    /// Which player gets X is a coin flip; X moves first.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for identical players, `AlreadyExists` if either
    /// player is in a game, `Internal` if no id could be allocated.
    pub fn setup_game(
        &self,
        creator: &PlayerId,
        p1: &PlayerId,
        p2: &PlayerId,
    ) -> ServiceResult<Game> {
        if p1 == p2 {
            return Err(ServiceError::InvalidArgument(
                "a game needs two different players".into(),
            ));
        }

        let store = &self.state.store;
        let mut games = store.games.write();
        let mut player_game = store.player_game.write();

        for player in [p1, p2] {
            if let Some(current) = player_game.get(player) {
                if games.get(current).is_some_and(|game| game.mark_of(player).is_some()) {
                    return Err(ServiceError::AlreadyExists(format!(
                        "player {player} is already in a game"
                    )));
                }
                debug!(player = %player, game = %current, "stale game index dropped");
                player_game.remove(player);
            }
        }

        let id: GameId = self
            .state
            .allocate_id("game", |id| games.contains_key(id))?;
        let (x, o) = if rand::random::<bool>() { (p1, p2) } else { (p2, p1) };
        let game = Game::new(id.clone(), creator.clone(), x.clone(), o.clone());

        games.insert(id.clone(), game.clone());
        player_game.insert(p1.clone(), id.clone());
        player_game.insert(p2.clone(), id);
        info!(game = %game.id, x = %x, o = %o, "game started");
        Ok(game)
    }

    /// Plays `position` for the player on `client`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the player is in no game; `InvalidArgument` for a
    /// finished game, a non-participant, the wrong turn, or an out-of-range
    /// or occupied cell.
    pub fn make_move(
        &self,
        client: &ClientId,
        player: &Player,
        position: i32,
    ) -> ServiceResult<Outbox> {
        let store = &self.state.store;
        let game_id = store
            .player_game
            .get(&player.id)
            .ok_or_else(|| ServiceError::NotFound("player is not in a game".into()))?;

        let turn = {
            let mut games = store.games.write();
            let Some(game) = games.get_mut(&game_id) else {
                store.player_game.delete_if(&player.id, &game_id);
                return Err(ServiceError::NotFound("game does not exist".into()));
            };

            let mark = game.check_turn(&player.id)?;
            let opponent = game.player(mark.other());
            if store.bindings.client_of(opponent).is_none() {
                let winner = game.forfeit(&player.id)?;
                store.player_game.delete_if(&player.id, &game_id);
                Turn::Forfeit { winner }
            } else {
                let outcome = game.play(&player.id, position)?;
                Turn::Played {
                    outcome,
                    game: game.clone(),
                }
            }
        };

        let mut outbox = Outbox::new();
        match turn {
            Turn::Forfeit { winner } => {
                info!(game = %game_id, player = %player.id, "opponent unreachable, won by forfeit");
                outbox.push(
                    client,
                    [ServerUpdate::Winner {
                        winner,
                        technicality: Technicality::ByForfeit,
                    }],
                );
            }
            Turn::Played { outcome, game } => {
                self.publish_move(&mut outbox, client, player, &game, outcome);
            }
        }
        Ok(outbox)
    }

    fn publish_move(
        &self,
        outbox: &mut Outbox,
        client: &ClientId,
        player: &Player,
        game: &Game,
        outcome: MoveOutcome,
    ) {
        let recipients = self.recipients(client, player, game);

        let updates = match outcome {
            MoveOutcome::Continue { mark, position, next } => {
                debug!(game = %game.id, ?mark, position, "move played");
                vec![
                    ServerUpdate::Move { position, mover: mark },
                    ServerUpdate::NextMover { mover: next },
                ]
            }
            MoveOutcome::Win { mark, position, line } => {
                info!(game = %game.id, ?mark, ?line, "game won");
                vec![
                    ServerUpdate::Move { position, mover: mark },
                    ServerUpdate::Winner {
                        winner: mark,
                        technicality: Technicality::NoProblem,
                    },
                ]
            }
            MoveOutcome::Draw { mark, position } => {
                info!(game = %game.id, "game drawn");
                vec![ServerUpdate::Move { position, mover: mark }, ServerUpdate::Draw]
            }
        };
        for recipient in &recipients {
            outbox.push(recipient, updates.clone());
        }

        if matches!(outcome, MoveOutcome::Continue { .. }) {
            return;
        }

        match self.state.rematches().offer(game) {
            Ok(_) => {
                for recipient in &recipients {
                    outbox.push(
                        recipient,
                        [
                            ServerUpdate::navigate(NavigationPath::Rematch),
                            ServerUpdate::Rematch {
                                state: RematchState::Offered,
                            },
                        ],
                    );
                }
            }
            Err(err) => {
                warn!(game = %game.id, error = %err, "rematch offer failed, releasing game");
                let store = &self.state.store;
                for participant in game.participants() {
                    store.player_game.delete_if(participant, &game.id);
                }
                store.games.delete(&game.id);
            }
        }
    }

    /// Acting client first, then the opponent's client if bound.
    fn recipients(&self, client: &ClientId, player: &Player, game: &Game) -> Vec<ClientId> {
        let mut recipients = vec![client.clone()];
        if let Some(opponent_client) = game
            .opponent_of(&player.id)
            .and_then(|opponent| self.state.client_of(opponent))
        {
            recipients.push(opponent_client);
        }
        recipients
    }

    fn require_client(&self, player: &PlayerId) -> ServiceResult<ClientId> {
        self.state
            .client_of(player)
            .ok_or_else(|| ServiceError::NotFound(format!("player {player} is not connected")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table {
        state: ServerState,
        alice: (ClientId, Player),
        bob: (ClientId, Player),
    }

    fn table() -> Table {
        let state = ServerState::default();
        let sign_up = |name: &str| {
            let client = ClientId::new(format!("client-{name}"));
            state.sessions().sign_up(&client, name, "pw").unwrap();
            let player = state.store.player_for_client(&client).unwrap();
            (client, player)
        };
        let alice = sign_up("alice");
        let bob = sign_up("bob");
        Table { state, alice, bob }
    }

    fn started(table: &Table) -> Game {
        table
            .state
            .games()
            .setup_game(&table.alice.1.id, &table.alice.1.id, &table.bob.1.id)
            .unwrap()
    }

    /// (client, player) pairs ordered X then O.
    fn by_mark<'t>(table: &'t Table, game: &Game) -> [&'t (ClientId, Player); 2] {
        if *game.player(Mark::X) == table.alice.1.id {
            [&table.alice, &table.bob]
        } else {
            [&table.bob, &table.alice]
        }
    }

    #[test]
    fn test_setup_indexes_both_players() {
        let table = table();
        let game = started(&table);
        assert_eq!(table.state.store.player_game.get(&table.alice.1.id), Some(game.id.clone()));
        assert_eq!(table.state.store.player_game.get(&table.bob.1.id), Some(game.id.clone()));
        assert_eq!(game.current_mover(), Mark::X);
    }

    #[test]
    fn test_setup_rejects_busy_or_identical_players() {
        let table = table();
        let alice = &table.alice.1.id;
        let bob = &table.bob.1.id;

        let same = table.state.games().setup_game(alice, alice, alice);
        assert!(matches!(same, Err(ServiceError::InvalidArgument(_))));

        started(&table);
        let busy = table.state.games().setup_game(alice, alice, bob);
        assert!(matches!(busy, Err(ServiceError::AlreadyExists(_))));
        assert_eq!(table.state.store.games.len(), 1);
    }

    #[test]
    fn test_move_validation_order() {
        let table = table();
        let (alice_client, alice) = &table.alice;
        let none = table.state.games().make_move(alice_client, alice, 0);
        assert!(matches!(none, Err(ServiceError::NotFound(_))));

        let game = started(&table);
        let [x, o] = by_mark(&table, &game);

        let wrong_turn = table.state.games().make_move(&o.0, &o.1, 0);
        assert!(matches!(wrong_turn, Err(ServiceError::InvalidArgument(_))));

        let out_of_range = table.state.games().make_move(&x.0, &x.1, 9);
        assert!(matches!(out_of_range, Err(ServiceError::InvalidArgument(_))));

        table.state.games().make_move(&x.0, &x.1, 4).unwrap();
        let occupied = table.state.games().make_move(&o.0, &o.1, 4);
        assert!(matches!(occupied, Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn test_move_notifies_both_participants() {
        let table = table();
        let game = started(&table);
        let [x, o] = by_mark(&table, &game);

        let outbox = table.state.games().make_move(&x.0, &x.1, 4).unwrap();
        let expected = vec![
            ServerUpdate::Move { position: 4, mover: Mark::X },
            ServerUpdate::NextMover { mover: Mark::O },
        ];
        assert_eq!(outbox.updates_for(&x.0), expected);
        assert_eq!(outbox.updates_for(&o.0), expected);
    }

    #[test]
    fn test_win_offers_rematch() {
        let table = table();
        let game = started(&table);
        let [x, o] = by_mark(&table, &game);

        let mut last = Outbox::new();
        for (mover, position) in [(x, 0), (o, 3), (x, 1), (o, 4), (x, 2)] {
            last = table.state.games().make_move(&mover.0, &mover.1, position).unwrap();
        }

        for client in [&x.0, &o.0] {
            assert_eq!(
                last.updates_for(client),
                vec![
                    ServerUpdate::Move { position: 2, mover: Mark::X },
                    ServerUpdate::Winner {
                        winner: Mark::X,
                        technicality: Technicality::NoProblem
                    },
                    ServerUpdate::navigate(NavigationPath::Rematch),
                    ServerUpdate::Rematch {
                        state: RematchState::Offered
                    },
                ]
            );
        }
        assert!(table.state.store.rematch_of(&x.1.id).is_some());
        assert!(table.state.store.player_game.contains(&o.1.id));

        let after = table.state.games().make_move(&o.0, &o.1, 5);
        assert!(matches!(after, Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn test_unreachable_opponent_forfeits() {
        let table = table();
        let game = started(&table);
        let [x, o] = by_mark(&table, &game);
        table.state.store.bindings.unbind_client(&o.0);

        let outbox = table.state.games().make_move(&x.0, &x.1, 4).unwrap();
        assert_eq!(
            outbox.updates_for(&x.0),
            vec![ServerUpdate::Winner {
                winner: Mark::X,
                technicality: Technicality::ByForfeit
            }]
        );

        let stored = table.state.store.games.get(&game.id).unwrap();
        assert!(stored.board().get(4).is_none());
        assert!(!table.state.store.player_game.contains(&x.1.id));
        assert!(table.state.store.player_game.contains(&o.1.id));
        assert!(table.state.store.rematches.is_empty());
    }

    #[test]
    fn test_create_game_resolves_lobby_members() {
        let table = table();
        let (alice_client, alice) = &table.alice;
        let (bob_client, bob) = &table.bob;
        table.state.lobbies().create_lobby(alice_client, alice, "room").unwrap();
        let lobby_id = table.state.store.player_lobby.get(&alice.id).unwrap();
        table.state.lobbies().join_lobby(bob_client, bob, &lobby_id).unwrap();

        let lobby = table.state.store.lobbies.get(&lobby_id).unwrap();
        let m_alice = lobby.member_id(&alice.id).unwrap().clone();
        let m_bob = lobby.member_id(&bob.id).unwrap().clone();

        let unknown = table
            .state
            .games()
            .create_game(alice_client, alice, &m_alice, &MemberId::from("ghost"));
        assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

        let same = table.state.games().create_game(alice_client, alice, &m_alice, &m_alice);
        assert!(matches!(same, Err(ServiceError::InvalidArgument(_))));

        let outbox = table
            .state
            .games()
            .create_game(alice_client, alice, &m_alice, &m_bob)
            .unwrap();
        let to_bob = outbox.updates_for(bob_client);
        assert_eq!(to_bob[0], ServerUpdate::navigate(NavigationPath::Game));
        assert_eq!(to_bob[2], ServerUpdate::NextMover { mover: Mark::X });
    }
}
