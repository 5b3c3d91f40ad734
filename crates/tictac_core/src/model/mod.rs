//! # Entity Model
//!
//! Plain data owned by the [`EntityStore`](crate::EntityStore). Entities refer
//! to each other by id only.

mod game;
mod ids;
mod lobby;
mod player;
mod rematch;

pub use game::{Board, Game, GameResult, Mark, MoveOutcome, BOARD_CELLS, WIN_LINES};
pub use ids::{ClientId, GameId, LobbyId, MemberId, PlayerId, RematchId};
pub use lobby::Lobby;
pub use player::{Client, Player};
pub use rematch::{Decision, Rematch, RematchStatus};
