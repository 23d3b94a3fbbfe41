//! Contains the `BoardState` structure for the `Board`. Every half-move ever
//! played pushes one of these, so the chain of `prev` references doubles as
//! the undo stack and as the repetition history.

use super::castle_rights::Castling;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::piece_move::Move;
use crate::core::sq::{SQ, NO_SQ};

use std::sync::Arc;

/// Holds the per-half-move state of the [`Board`]: everything that cannot be
/// reversed from the move alone.
///
/// Stored by [`Board`] as an `Arc<BoardState>` so cloning a board for a
/// search thread shares the history instead of copying it.
///
/// [`Board`]: ../struct.Board.html
#[derive(Clone)]
pub struct BoardState {
    /// The castling rights for the current position.
    pub castling: Castling,
    /// Half-moves since the last capture or pawn move.
    pub rule_50: i16,
    /// Half-moves played since this `Board` instance was created.
    pub ply: u16,
    /// If the last move was a double pawn push, the square behind the push.
    /// `NO_SQ` otherwise.
    pub ep_square: SQ,
    /// The Zobrist key of the position.
    pub zobrist: u64,
    /// A `BitBoard` of the pieces currently giving check.
    pub checkers_bb: BitBoard,
    /// Per player, pieces blocking an attack on that player's king. Can
    /// contain pieces of either color.
    pub blockers_king: [BitBoard; PLAYER_CNT],
    /// Per player, pieces of that player pinning the opponent's king.
    pub pinners_king: [BitBoard; PLAYER_CNT],
    /// The move that led to this state; `Move::null()` for the root state
    /// and for null moves.
    pub prev_move: Move,
    /// The state one half-move ago.
    pub prev: Option<Arc<BoardState>>,
}

impl BoardState {
    /// Constructs a `BoardState` for the starting position.
    pub fn default_start() -> BoardState {
        BoardState {
            castling: Castling::all_castling(),
            rule_50: 0,
            ply: 0,
            ep_square: NO_SQ,
            zobrist: 0,
            checkers_bb: BitBoard(0),
            blockers_king: [BitBoard(0); PLAYER_CNT],
            pinners_king: [BitBoard(0); PLAYER_CNT],
            prev_move: Move::null(),
            prev: None,
        }
    }

    /// Constructs a blank `BoardState` with no castling rights.
    pub fn blank() -> BoardState {
        BoardState {
            castling: Castling::empty_set(),
            ..BoardState::default_start()
        }
    }

    /// Constructs a partial clone of a `BoardState`: the copied fields carry
    /// over and will be modified by the move application; the rest must be
    /// recomputed.
    pub fn partial_clone(&self) -> BoardState {
        BoardState {
            castling: self.castling,
            rule_50: self.rule_50,
            ply: self.ply,
            ep_square: self.ep_square,
            zobrist: self.zobrist,
            checkers_bb: BitBoard(0),
            blockers_king: [BitBoard(0); PLAYER_CNT],
            pinners_king: [BitBoard(0); PLAYER_CNT],
            prev_move: Move::null(),
            prev: self.get_prev(),
        }
    }

    /// Return the previous `BoardState` from one half-move ago.
    #[inline]
    pub fn get_prev(&self) -> Option<Arc<BoardState>> {
        self.prev.as_ref().cloned()
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &BoardState) -> bool {
        self.castling == other.castling
            && self.rule_50 == other.rule_50
            && self.ep_square == other.ep_square
            && self.zobrist == other.zobrist
            && self.checkers_bb == other.checkers_bb
    }
}
