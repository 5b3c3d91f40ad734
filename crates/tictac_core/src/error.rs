//! # Game Rule Errors
//!
//! Violations detected by the board and game model.

use thiserror::Error;

/// Reasons a move is rejected by the game model.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The game already reached a terminal result.
    #[error("the game has already ended")]
    GameOver,

    /// The acting player is neither X nor O.
    #[error("player is not a game participant")]
    NotParticipant,

    /// It is the other participant's turn.
    #[error("it is not your turn to move")]
    NotYourTurn,

    /// Position outside `[0, 9)`.
    #[error("move position {0} is out of range")]
    OutOfRange(i32),

    /// Position already holds a mark.
    #[error("position {0} is already occupied")]
    Occupied(usize),
}
