//! # TICTAC Core
//!
//! Entity model and concurrency-safe storage for the TICTAC matchmaking broker.
//!
//! ## Architecture Rules
//!
//! 1. **One lock per collection** - players, lobbies, games, rematches and the
//!    cross-reference indices never contend with one another
//! 2. **Ids, not pointers** - entities refer to each other by id only; a lookup
//!    that misses means "does not exist"
//! 3. **Fixed lock order** - an operation that holds more than one guard takes
//!    them in the order documented on [`EntityStore`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use tictac_core::{EntityStore, Player, PlayerId};
//!
//! let store = EntityStore::new();
//! let id = PlayerId::from("p-1");
//! store.players.set(id.clone(), Player::new(id, "alice", "secret", "user1"));
//! assert!(store.players.contains(&PlayerId::from("p-1")));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod model;
pub mod store;

pub use error::MoveError;
pub use model::{
    Board, Client, ClientId, Decision, Game, GameId, GameResult, Lobby, LobbyId, Mark, MemberId,
    MoveOutcome, Player, PlayerId, Rematch, RematchId, RematchStatus, BOARD_CELLS, WIN_LINES,
};
pub use store::{Bindings, EntityStore, Store};
