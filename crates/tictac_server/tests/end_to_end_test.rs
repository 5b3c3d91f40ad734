//! Full matchmaking flow driven through `notify`, with logs drained in between.

use tictac_core::{ClientId, Mark, MemberId, PlayerId};
use tictac_server::{MatchServer, MemorySink, ServerConfig};
use tictac_shared::{
    ClientRequest, Code, LobbySummary, NavigationPath, RematchState, RequestKind, ServerUpdate,
    Technicality,
};

struct Seat {
    client: ClientId,
    sink: MemorySink,
}

impl Seat {
    fn new(server: &MatchServer) -> Self {
        Self {
            client: server.register_client().unwrap(),
            sink: MemorySink::new(),
        }
    }

    /// Everything delivered since the last call.
    fn fresh(&mut self, server: &MatchServer) -> Vec<ServerUpdate> {
        server.state().log.drain(&self.client, &mut self.sink).unwrap();
        self.sink.take()
    }

    fn player(&self, server: &MatchServer) -> PlayerId {
        server.state().store.bindings.player_of(&self.client).unwrap()
    }

    fn send(&self, server: &MatchServer, request: ClientRequest) {
        server.notify(&self.client, request).unwrap();
    }
}

fn sign_up(name: &str, secret: &str) -> ClientRequest {
    ClientRequest::SignUp {
        name: name.into(),
        secret: secret.into(),
    }
}

fn sign_in(name: &str, secret: &str) -> ClientRequest {
    ClientRequest::SignIn {
        name: name.into(),
        secret: secret.into(),
    }
}

fn rematch(state: RematchState) -> ServerUpdate {
    ServerUpdate::Rematch { state }
}

fn ok_reply(updates: &[ServerUpdate], kind: RequestKind) -> bool {
    updates.contains(&ServerUpdate::reply_ok(kind))
}

fn member_id(server: &MatchServer, player: &PlayerId) -> MemberId {
    let lobby = server.state().store.lobby_of(player).unwrap();
    lobby.member_id(player).unwrap().clone()
}

/// Plays the moves that give `winner` three in a row along the top row.
fn play_to_win(server: &MatchServer, winner: &Seat, loser: &Seat, winner_is_x: bool) {
    let moves: &[(bool, i32)] = if winner_is_x {
        &[(true, 0), (false, 3), (true, 1), (false, 4), (true, 2)]
    } else {
        &[(false, 3), (true, 0), (false, 4), (true, 1), (false, 8), (true, 2)]
    };
    for &(by_winner, position) in moves {
        let seat = if by_winner { winner } else { loser };
        seat.send(server, ClientRequest::MakeMove { position });
    }
}

#[test]
fn test_golden_path_scenario() {
    let server = MatchServer::new(ServerConfig::default());
    let mut a = Seat::new(&server);
    let mut b = Seat::new(&server);

    a.send(&server, sign_up("A", "sa"));
    b.send(&server, sign_up("B", "sb"));
    assert!(ok_reply(&a.fresh(&server), RequestKind::SignUp));
    assert!(ok_reply(&b.fresh(&server), RequestKind::SignUp));

    a.send(&server, ClientRequest::CreateLobby { name: "L".into() });
    let created = a.fresh(&server);
    assert!(created.contains(&ServerUpdate::navigate(NavigationPath::MyLobby)));

    b.send(
        &server,
        ClientRequest::SearchLobby {
            name: "l".into(),
            limit: None,
        },
    );
    let lobbies: Vec<LobbySummary> = b
        .fresh(&server)
        .into_iter()
        .find_map(|update| match update {
            ServerUpdate::LobbySearchResult { lobbies } => Some(lobbies),
            _ => None,
        })
        .unwrap();
    assert_eq!(lobbies.len(), 1);
    assert_eq!(lobbies[0].member_count, 1);

    let lobby_id = lobbies[0].lobby_id.clone();
    b.send(&server, ClientRequest::JoinLobby { lobby_id });
    assert!(ok_reply(&b.fresh(&server), RequestKind::JoinLobby));
    assert!(matches!(&a.fresh(&server)[..], [ServerUpdate::MyLobbyJoiner { .. }]));

    let (pa, pb) = (a.player(&server), b.player(&server));
    a.send(
        &server,
        ClientRequest::CreateGame {
            first: member_id(&server, &pa),
            second: member_id(&server, &pb),
        },
    );
    let a_start = a.fresh(&server);
    let b_start = b.fresh(&server);
    assert!(ok_reply(&a_start, RequestKind::CreateGame));
    assert!(b_start.contains(&ServerUpdate::navigate(NavigationPath::Game)));

    let first_game = server.state().store.game_of(&pa).unwrap();
    let a_mark = first_game.mark_of(&pa).unwrap();
    play_to_win(&server, &a, &b, a_mark == Mark::X);

    let won = ServerUpdate::Winner {
        winner: a_mark,
        technicality: Technicality::NoProblem,
    };
    let offered = rematch(RematchState::Offered);
    for updates in [a.fresh(&server), b.fresh(&server)] {
        assert!(updates.contains(&won));
        assert!(updates.contains(&offered));
    }

    a.send(&server, ClientRequest::Rematch { yes: true });
    let pending = rematch(RematchState::Pending);
    assert!(a.fresh(&server).contains(&pending));
    assert!(b.fresh(&server).contains(&pending));

    b.send(&server, ClientRequest::Rematch { yes: true });
    let approved = rematch(RematchState::Approved);
    for updates in [a.fresh(&server), b.fresh(&server)] {
        let at = updates.iter().position(|update| *update == approved).unwrap();
        assert_eq!(updates[at + 1], ServerUpdate::navigate(NavigationPath::Game));
        assert!(matches!(updates[at + 2], ServerUpdate::GameStart { .. }));
        assert_eq!(updates[at + 3], ServerUpdate::NextMover { mover: Mark::X });
    }

    let second_game = server.state().store.game_of(&pa).unwrap();
    assert_ne!(second_game.id, first_game.id);
    assert_eq!(server.state().store.game_of(&pb).unwrap().id, second_game.id);
    assert_eq!(second_game.board().occupied().count(), 0);
    assert!(!server.state().store.games.contains(&first_game.id));
    assert!(server.state().store.rematches.is_empty());
}

#[test]
fn test_reconnect_recovers_game_context() {
    let server = MatchServer::new(ServerConfig::default());
    let mut a = Seat::new(&server);
    let mut b = Seat::new(&server);
    a.send(&server, sign_up("A", "sa"));
    b.send(&server, sign_up("B", "sb"));
    let (pa, pb) = (a.player(&server), b.player(&server));
    let game = server.state().games().setup_game(&pa, &pa, &pb).unwrap();
    let (x, o) = if game.mark_of(&pa) == Some(Mark::X) { (&a, &b) } else { (&b, &a) };
    x.send(&server, ClientRequest::MakeMove { position: 4 });
    o.send(&server, ClientRequest::MakeMove { position: 0 });
    a.fresh(&server);
    b.fresh(&server);

    // A new client for A signs in and gets the board back.
    let mut again = Seat::new(&server);
    again.send(&server, sign_in("A", "sa"));
    let updates = again.fresh(&server);
    let moves: Vec<&ServerUpdate> = updates
        .iter()
        .filter(|update| matches!(update, ServerUpdate::Move { .. }))
        .collect();
    assert_eq!(moves.len(), 2);
    assert_eq!(*moves[0], ServerUpdate::Move { position: 0, mover: Mark::O });
    assert_eq!(updates.last(), Some(&ServerUpdate::Move { position: 4, mover: Mark::X }));

    // The superseded client is told so.
    assert!(a
        .fresh(&server)
        .iter()
        .any(|update| matches!(update, ServerUpdate::PlayerClient { .. })));
}

#[test]
fn test_forfeit_then_loser_replays_outcome_once() {
    let server = MatchServer::new(ServerConfig::default());
    let a = Seat::new(&server);
    let b = Seat::new(&server);
    a.send(&server, sign_up("A", "pw"));
    b.send(&server, sign_up("B", "pw"));
    let (pa, pb) = (a.player(&server), b.player(&server));

    // X stays; O walks away before the first move.
    let game = server.state().games().setup_game(&pa, &pa, &pb).unwrap();
    let (mut stayer, leaver) = if game.mark_of(&pa) == Some(Mark::X) { (a, b) } else { (b, a) };
    let leaver_name = server
        .state()
        .store
        .players
        .get(&leaver.player(&server))
        .unwrap()
        .name;
    server.state().store.bindings.unbind_client(&leaver.client);
    stayer.fresh(&server);

    stayer.send(&server, ClientRequest::MakeMove { position: 4 });
    let by_forfeit = ServerUpdate::Winner {
        winner: Mark::X,
        technicality: Technicality::ByForfeit,
    };
    let updates = stayer.fresh(&server);
    assert!(ok_reply(&updates, RequestKind::MakeMove));
    assert!(updates.contains(&by_forfeit));
    assert!(server.state().store.rematches.is_empty());

    // The winner is free to start something else right away.
    stayer.send(&server, ClientRequest::CreateLobby { name: "next".into() });
    assert!(ok_reply(&stayer.fresh(&server), RequestKind::CreateLobby));

    // The loser learns the outcome on return, exactly once.
    let mut back = Seat::new(&server);
    back.send(&server, sign_in(&leaver_name, "pw"));
    let replay = back.fresh(&server);
    assert!(replay.contains(&ServerUpdate::navigate(NavigationPath::Game)));
    assert_eq!(replay.last(), Some(&by_forfeit));
    assert!(!server.state().store.games.contains(&game.id));

    let mut later = Seat::new(&server);
    later.send(&server, sign_in(&leaver_name, "pw"));
    assert_eq!(
        later.fresh(&server).last(),
        Some(&ServerUpdate::navigate(NavigationPath::Home))
    );
}

#[test]
fn test_out_of_turn_move_is_invalid_argument() {
    let server = MatchServer::new(ServerConfig::default());
    let mut a = Seat::new(&server);
    let b = Seat::new(&server);
    a.send(&server, sign_up("A", "sa"));
    b.send(&server, sign_up("B", "sb"));
    let (pa, pb) = (a.player(&server), b.player(&server));
    let game = server.state().games().setup_game(&pa, &pa, &pb).unwrap();
    a.fresh(&server);

    // X gets one legal move in first so that it is O's turn either way.
    if game.mark_of(&pa) == Some(Mark::X) {
        a.send(&server, ClientRequest::MakeMove { position: 0 });
    }
    a.send(&server, ClientRequest::MakeMove { position: 1 });

    let codes: Vec<Code> = a
        .fresh(&server)
        .into_iter()
        .filter_map(|update| match update {
            ServerUpdate::Reply { outcome, .. } => Some(outcome.code),
            _ => None,
        })
        .collect();
    assert_eq!(codes.last(), Some(&Code::InvalidArgument));
    assert!(server.state().store.game_of(&pa).unwrap().board().get(1).is_none());
}
