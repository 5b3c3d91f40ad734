//! # Game Model
//!
//! Two-player tic-tac-toe: board, movers and result state machine.
//!
//! ## Result State Machine
//!
//! ```text
//! INITIAL ──first move──> ONGOING ──┬──> WIN
//!    │                              ├──> DRAW
//!    └─────────forfeit──────────────┴──> WIN_BY_FORFEIT
//! ```
//!
//! Terminal states are absorbing. Board cells are write-once.

use serde::{Deserialize, Serialize};

use super::ids::{GameId, PlayerId};
use crate::error::MoveError;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// The eight winning lines: three rows, three columns, two diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Mover role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Moves first.
    X,
    /// Moves second.
    O,
}

impl Mark {
    /// Returns the opposing role.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

/// Game result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// Set up, no move yet.
    #[default]
    Initial,
    /// At least one move played.
    Ongoing,
    /// Three in a row.
    Win,
    /// Board full without a line.
    Draw,
    /// Opponent could not be reached.
    WinByForfeit,
}

impl GameResult {
    /// Returns true for `Win`, `Draw` and `WinByForfeit`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Win | Self::Draw | Self::WinByForfeit)
    }
}

/// The 3x3 board. Each cell holds the id of the player who occupied it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<PlayerId>; BOARD_CELLS],
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the occupant of a cell.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&PlayerId> {
        self.cells.get(position).and_then(Option::as_ref)
    }

    /// Validates a raw position and converts it to a cell index.
    ///
    /// # Errors
    ///
    /// `OutOfRange` outside `[0, 9)`, `Occupied` if the cell is taken.
    pub fn check(&self, position: i32) -> Result<usize, MoveError> {
        let index = usize::try_from(position)
            .ok()
            .filter(|index| *index < BOARD_CELLS)
            .ok_or(MoveError::OutOfRange(position))?;
        if self.cells[index].is_some() {
            return Err(MoveError::Occupied(index));
        }
        Ok(index)
    }

    /// Occupies a cell. A cell, once occupied, never changes.
    ///
    /// # Errors
    ///
    /// Same as [`Board::check`].
    pub fn place(&mut self, position: i32, player: PlayerId) -> Result<usize, MoveError> {
        let index = self.check(position)?;
        self.cells[index] = Some(player);
        Ok(index)
    }

    /// Returns the first of the eight lines holding three equal, non-empty cells.
    #[must_use]
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        WIN_LINES.iter().copied().find(|[a, b, c]| {
            match (&self.cells[*a], &self.cells[*b], &self.cells[*c]) {
                (Some(x), Some(y), Some(z)) => x == y && y == z,
                _ => false,
            }
        })
    }

    /// Returns true when every cell is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Iterates occupied cells in position order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &PlayerId)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(position, cell)| cell.as_ref().map(|player| (position, player)))
    }
}

/// Result of an accepted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No winner yet, the turn passed to `next`.
    Continue {
        /// Mark that moved.
        mark: Mark,
        /// Cell that was occupied.
        position: usize,
        /// Mark to move next.
        next: Mark,
    },
    /// The move completed a line.
    Win {
        /// Winning mark.
        mark: Mark,
        /// Cell that was occupied.
        position: usize,
        /// The completed line.
        line: [usize; 3],
    },
    /// The move filled the board without a line.
    Draw {
        /// Mark that moved.
        mark: Mark,
        /// Cell that was occupied.
        position: usize,
    },
}

/// A two-player game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    /// Game id.
    pub id: GameId,
    /// Player who requested the game.
    pub creator: PlayerId,
    mover_x: PlayerId,
    mover_o: PlayerId,
    mover: Mark,
    board: Board,
    result: GameResult,
    winner: Option<Mark>,
}

impl Game {
    /// Creates a game. X moves first.
    #[must_use]
    pub fn new(id: GameId, creator: PlayerId, mover_x: PlayerId, mover_o: PlayerId) -> Self {
        Self {
            id,
            creator,
            mover_x,
            mover_o,
            mover: Mark::X,
            board: Board::new(),
            result: GameResult::Initial,
            winner: None,
        }
    }

    /// Returns the player holding a mark.
    #[must_use]
    pub fn player(&self, mark: Mark) -> &PlayerId {
        match mark {
            Mark::X => &self.mover_x,
            Mark::O => &self.mover_o,
        }
    }

    /// Returns the mark of a participant.
    #[must_use]
    pub fn mark_of(&self, player: &PlayerId) -> Option<Mark> {
        if *player == self.mover_x {
            Some(Mark::X)
        } else if *player == self.mover_o {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Returns the other participant.
    #[must_use]
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        self.mark_of(player).map(|mark| self.player(mark.other()))
    }

    /// Both participants, X first.
    #[must_use]
    pub fn participants(&self) -> [&PlayerId; 2] {
        [&self.mover_x, &self.mover_o]
    }

    /// Mark whose turn it is.
    #[inline]
    #[must_use]
    pub fn current_mover(&self) -> Mark {
        self.mover
    }

    /// The board.
    #[inline]
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current result.
    #[inline]
    #[must_use]
    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Winning mark, once the result is `Win` or `WinByForfeit`.
    #[inline]
    #[must_use]
    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    /// Checks that `player` may move now, in order: game not terminal,
    /// player is a participant, it is the player's turn.
    ///
    /// # Errors
    ///
    /// `GameOver`, `NotParticipant` or `NotYourTurn`.
    pub fn check_turn(&self, player: &PlayerId) -> Result<Mark, MoveError> {
        if self.result.is_terminal() {
            return Err(MoveError::GameOver);
        }
        let mark = self.mark_of(player).ok_or(MoveError::NotParticipant)?;
        if mark != self.mover {
            return Err(MoveError::NotYourTurn);
        }
        Ok(mark)
    }

    /// Plays a move for `player` at `position`.
    ///
    /// Win detection runs before draw detection, so a move that both fills the
    /// board and completes a line is a win.
    ///
    /// # Errors
    ///
    /// Any [`MoveError`]; the game is left untouched on error.
    pub fn play(&mut self, player: &PlayerId, position: i32) -> Result<MoveOutcome, MoveError> {
        let mark = self.check_turn(player)?;
        let position = self.board.place(position, player.clone())?;
        self.result = GameResult::Ongoing;

        if let Some(line) = self.board.winning_line() {
            self.result = GameResult::Win;
            self.winner = Some(mark);
            return Ok(MoveOutcome::Win { mark, position, line });
        }

        if self.board.is_full() {
            self.result = GameResult::Draw;
            return Ok(MoveOutcome::Draw { mark, position });
        }

        self.mover = mark.other();
        Ok(MoveOutcome::Continue {
            mark,
            position,
            next: self.mover,
        })
    }

    /// Ends the game in favour of `winner` without touching the board.
    ///
    /// # Errors
    ///
    /// `GameOver` if already terminal, `NotParticipant` if `winner` is not in the game.
    pub fn forfeit(&mut self, winner: &PlayerId) -> Result<Mark, MoveError> {
        if self.result.is_terminal() {
            return Err(MoveError::GameOver);
        }
        let mark = self.mark_of(winner).ok_or(MoveError::NotParticipant)?;
        self.result = GameResult::WinByForfeit;
        self.winner = Some(mark);
        Ok(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new(
            GameId::from("g"),
            PlayerId::from("x"),
            PlayerId::from("x"),
            PlayerId::from("o"),
        )
    }

    fn board_from(cells: [Option<&str>; BOARD_CELLS]) -> Board {
        Board {
            cells: cells.map(|cell| cell.map(PlayerId::from)),
        }
    }

    #[test]
    fn test_x_moves_first_and_turns_alternate() {
        let mut game = game();
        let x = PlayerId::from("x");
        let o = PlayerId::from("o");

        assert_eq!(game.result(), GameResult::Initial);
        assert_eq!(game.play(&o, 0), Err(MoveError::NotYourTurn));

        let outcome = game.play(&x, 4).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Continue { mark: Mark::X, position: 4, next: Mark::O }
        );
        assert_eq!(game.result(), GameResult::Ongoing);
        assert_eq!(game.current_mover(), Mark::O);
        assert_eq!(game.play(&x, 0), Err(MoveError::NotYourTurn));
    }

    #[test]
    fn test_cells_are_write_once() {
        let mut game = game();
        let x = PlayerId::from("x");
        let o = PlayerId::from("o");

        game.play(&x, 0).unwrap();
        assert_eq!(game.play(&o, 0), Err(MoveError::Occupied(0)));
        assert_eq!(game.board().get(0), Some(&x));
        // Rejected move keeps the turn
        assert_eq!(game.current_mover(), Mark::O);
    }

    #[test]
    fn test_out_of_range_positions() {
        let mut game = game();
        let x = PlayerId::from("x");
        assert_eq!(game.play(&x, -1), Err(MoveError::OutOfRange(-1)));
        assert_eq!(game.play(&x, 9), Err(MoveError::OutOfRange(9)));
        assert_eq!(game.result(), GameResult::Initial);
    }

    #[test]
    fn test_non_participant_rejected() {
        let game = game();
        assert_eq!(
            game.check_turn(&PlayerId::from("z")),
            Err(MoveError::NotParticipant)
        );
    }

    #[test]
    fn test_top_row_wins() {
        let board = board_from([
            Some("x"),
            Some("x"),
            Some("x"),
            None,
            None,
            None,
            None,
            None,
            None,
        ]);
        assert_eq!(board.winning_line(), Some([0, 1, 2]));
    }

    #[test]
    fn test_every_line_detected() {
        for line in WIN_LINES {
            let mut cells = [None; BOARD_CELLS];
            for index in line {
                cells[index] = Some("p");
            }
            assert_eq!(board_from(cells).winning_line(), Some(line));
        }
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let board = board_from([
            Some("x"),
            Some("o"),
            Some("x"),
            None,
            None,
            None,
            None,
            None,
            None,
        ]);
        assert_eq!(board.winning_line(), None);
    }

    #[test]
    fn test_full_board_win_beats_draw() {
        let mut game = game();
        let x = PlayerId::from("x");
        let o = PlayerId::from("o");
        // X O X
        // X O O
        // X X O   final X at 6 fills the board and completes column 0-3-6
        for (player, position) in [
            (&x, 0),
            (&o, 1),
            (&x, 2),
            (&o, 4),
            (&x, 3),
            (&o, 5),
            (&x, 7),
            (&o, 8),
        ] {
            game.play(player, position).unwrap();
        }
        let outcome = game.play(&x, 6).unwrap();
        assert!(game.board().is_full());
        assert_eq!(
            outcome,
            MoveOutcome::Win { mark: Mark::X, position: 6, line: [0, 3, 6] }
        );
        assert_eq!(game.result(), GameResult::Win);
        assert_eq!(game.winner(), Some(Mark::X));
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let mut game = game();
        let x = PlayerId::from("x");
        let o = PlayerId::from("o");
        // X O X
        // X O O
        // O X X
        for (player, position) in [
            (&x, 0),
            (&o, 1),
            (&x, 2),
            (&o, 4),
            (&x, 3),
            (&o, 5),
            (&x, 7),
            (&o, 6),
        ] {
            game.play(player, position).unwrap();
        }
        let outcome = game.play(&x, 8).unwrap();
        assert_eq!(outcome, MoveOutcome::Draw { mark: Mark::X, position: 8 });
        assert_eq!(game.result(), GameResult::Draw);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_terminal_state_is_absorbing() {
        let mut game = game();
        let x = PlayerId::from("x");
        let o = PlayerId::from("o");

        assert_eq!(game.forfeit(&o), Ok(Mark::O));
        assert_eq!(game.result(), GameResult::WinByForfeit);
        assert_eq!(game.play(&x, 0), Err(MoveError::GameOver));
        assert_eq!(game.forfeit(&x), Err(MoveError::GameOver));
        assert_eq!(game.board().occupied().count(), 0);
    }

    #[test]
    fn test_occupied_cells_in_position_order() {
        let mut game = game();
        let x = PlayerId::from("x");
        let o = PlayerId::from("o");
        game.play(&x, 8).unwrap();
        game.play(&o, 2).unwrap();

        let cells: Vec<_> = game.board().occupied().map(|(p, id)| (p, id.clone())).collect();
        assert_eq!(cells, vec![(2, o), (8, x)]);
    }
}
