//! # Golden Path Scenario
//!
//! Runs the complete matchmaking flow in-process:
//!
//! 1. Sign up A and B, each on its own subscribed stream
//! 2. A creates lobby "L", B finds it by search and joins
//! 3. A starts a game between the two lobby members
//! 4. Moves are played until A has three in a row
//! 5. Both accept the rematch offer and a fresh game starts
//!
//! Usage: `tictac_golden_path [--config <path>]`. Log level via `RUST_LOG`.

use std::process;
use std::time::Duration;

use tictac_core::{ClientId, GameId, Mark, MemberId, PlayerId};
use tictac_server::{ChannelSink, MatchServer, ServerConfig, ServiceError};
use tictac_shared::{ClientRequest, RematchState, ServerUpdate, Technicality};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Check {
    name: &'static str,
    passed: bool,
}

#[derive(Default)]
struct Report {
    checks: Vec<Check>,
}

impl Report {
    fn record(&mut self, name: &'static str, passed: bool) {
        if passed {
            info!(check = name, "passed");
        } else {
            error!(check = name, "failed");
        }
        self.checks.push(Check { name, passed });
    }

    fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    fn print(&self) {
        println!();
        println!("┌──────────────────────────────────────────────────────────────────┐");
        println!("│ RESULTS                                                          │");
        println!("├──────────────────────────────────────────────────────────────────┤");
        for check in &self.checks {
            let mark = if check.passed { "PASS" } else { "FAIL" };
            println!("│ [{mark}] {:<58}│", check.name);
        }
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

struct Seat {
    client: ClientId,
    updates: mpsc::UnboundedReceiver<ServerUpdate>,
    seen: Vec<ServerUpdate>,
}

impl Seat {
    /// Moves everything delivered so far into `seen`, returning the new part.
    fn collect(&mut self) -> Vec<ServerUpdate> {
        let start = self.seen.len();
        while let Ok(update) = self.updates.try_recv() {
            if !update.is_ping() {
                self.seen.push(update);
            }
        }
        self.seen[start..].to_vec()
    }
}

fn parse_config() -> Result<ServerConfig, String> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(ServerConfig::default()),
        (Some("--config"), Some(path)) => ServerConfig::load(&path).map_err(|err| err.to_string()),
        _ => Err("usage: tictac_golden_path [--config <path>]".into()),
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn sign_up(name: &str, secret: &str) -> ClientRequest {
    ClientRequest::SignUp {
        name: name.into(),
        secret: secret.into(),
    }
}

fn rematch(state: RematchState) -> ServerUpdate {
    ServerUpdate::Rematch { state }
}

fn request(server: &MatchServer, seat: &Seat, request: ClientRequest) -> Result<(), ServiceError> {
    server.notify(&seat.client, request)
}

fn member_of(server: &MatchServer, player: &PlayerId) -> Option<MemberId> {
    let lobby = server.state().store.lobby_of(player)?;
    lobby.member_id(player).cloned()
}

fn player_on(server: &MatchServer, seat: &Seat) -> Option<PlayerId> {
    server.state().store.bindings.player_of(&seat.client)
}

async fn scenario(
    server: &MatchServer,
    a: &mut Seat,
    b: &mut Seat,
    report: &mut Report,
) -> Result<(), ServiceError> {
    settle().await;

    request(server, a, sign_up("A", "a-secret"))?;
    request(server, b, sign_up("B", "b-secret"))?;
    settle().await;
    a.collect();
    b.collect();
    let (Some(pa), Some(pb)) = (player_on(server, a), player_on(server, b)) else {
        report.record("both players signed in", false);
        return Ok(());
    };
    report.record("both players signed in", true);

    request(server, a, ClientRequest::CreateLobby { name: "L".into() })?;
    let search = ClientRequest::SearchLobby {
        name: "l".into(),
        limit: None,
    };
    request(server, b, search)?;
    settle().await;
    let found = b.collect().into_iter().find_map(|update| match update {
        ServerUpdate::LobbySearchResult { lobbies } => {
            lobbies.into_iter().find(|lobby| lobby.name == "L")
        }
        _ => None,
    });
    report.record("lobby L found by search", found.is_some());
    let Some(found) = found else {
        return Ok(());
    };

    request(server, b, ClientRequest::JoinLobby { lobby_id: found.lobby_id })?;
    settle().await;
    let joined = a
        .collect()
        .iter()
        .any(|update| matches!(update, ServerUpdate::MyLobbyJoiner { .. }));
    report.record("A notified of B joining", joined);

    let (Some(ma), Some(mb)) = (member_of(server, &pa), member_of(server, &pb)) else {
        report.record("lobby members resolved", false);
        return Ok(());
    };
    request(server, a, ClientRequest::CreateGame { first: ma, second: mb })?;
    settle().await;
    a.collect();
    b.collect();

    let Some(first_game) = server.state().store.game_of(&pa) else {
        report.record("game started", false);
        return Ok(());
    };
    report.record("game started", true);
    let a_is_x = first_game.mark_of(&pa) == Some(Mark::X);
    println!("A plays {}", if a_is_x { "X" } else { "O" });

    let moves: &[(bool, i32)] = if a_is_x {
        &[(true, 0), (false, 3), (true, 1), (false, 4), (true, 2)]
    } else {
        &[(false, 3), (true, 0), (false, 4), (true, 1), (false, 8), (true, 2)]
    };
    for &(by_a, position) in moves {
        let seat: &Seat = if by_a { &*a } else { &*b };
        request(server, seat, ClientRequest::MakeMove { position })?;
        settle().await;
    }

    let a_mark = if a_is_x { Mark::X } else { Mark::O };
    let won = ServerUpdate::Winner {
        winner: a_mark,
        technicality: Technicality::NoProblem,
    };
    let offered = rematch(RematchState::Offered);
    let (a_updates, b_updates) = (a.collect(), b.collect());
    report.record(
        "both saw A win",
        a_updates.contains(&won) && b_updates.contains(&won),
    );
    report.record(
        "both offered a rematch",
        a_updates.contains(&offered) && b_updates.contains(&offered),
    );

    request(server, a, ClientRequest::Rematch { yes: true })?;
    request(server, b, ClientRequest::Rematch { yes: true })?;
    settle().await;
    let approved = rematch(RematchState::Approved);
    report.record(
        "both saw the rematch approved",
        a.collect().contains(&approved) && b.collect().contains(&approved),
    );

    let fresh: Option<GameId> = server
        .state()
        .store
        .game_of(&pa)
        .filter(|game| game.board().occupied().count() == 0)
        .map(|game| game.id);
    report.record(
        "fresh game for the same pair",
        fresh.as_ref().is_some_and(|id| *id != first_game.id)
            && server.state().store.game_of(&pb).map(|game| game.id) == fresh,
    );
    Ok(())
}

fn print_seat(label: &str, seat: &Seat) {
    println!();
    println!("── {label} ({}) ──", seat.client);
    for update in &seat.seen {
        println!("  {update:?}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match parse_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };
    let caller_key = config.caller_keys.first().cloned().unwrap_or_default();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                 TICTAC - GOLDEN PATH SCENARIO                    ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  Flow: sign up → lobby → search → join → game → win → rematch    ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let server = MatchServer::new(config);
    let (Ok(client_a), Ok(client_b)) = (server.register_client(), server.register_client()) else {
        eprintln!("client registration failed");
        process::exit(1);
    };

    let (mut sink_a, rx_a) = ChannelSink::new();
    let (mut sink_b, rx_b) = ChannelSink::new();
    let (stop_a, cancel_a) = oneshot::channel();
    let (stop_b, cancel_b) = oneshot::channel();
    let mut a = Seat {
        client: client_a.clone(),
        updates: rx_a,
        seen: Vec::new(),
    };
    let mut b = Seat {
        client: client_b.clone(),
        updates: rx_b,
        seen: Vec::new(),
    };
    let mut report = Report::default();

    let driver = async {
        let outcome = scenario(&server, &mut a, &mut b, &mut report).await;
        let _ = stop_a.send(());
        let _ = stop_b.send(());
        outcome
    };
    let (stream_a, stream_b, outcome) = tokio::join!(
        server.subscribe(&caller_key, Some(client_a), &mut sink_a, cancel_a),
        server.subscribe(&caller_key, Some(client_b), &mut sink_b, cancel_b),
        driver,
    );

    if let Err(err) = outcome {
        error!(error = %err, "scenario aborted");
        report.record("scenario ran to completion", false);
    }
    for (label, stream) in [("A", stream_a), ("B", stream_b)] {
        if !matches!(stream, Err(ServiceError::Canceled(_))) {
            error!(stream = label, ?stream, "stream ended unexpectedly");
            report.record("streams ended by cancellation", false);
        }
    }

    a.collect();
    b.collect();
    print_seat("A", &a);
    print_seat("B", &b);
    report.print();

    if report.all_passed() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}
