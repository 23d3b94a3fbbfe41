//! Module for the implementation and definition of a move to be played.
//!
//! We define a move as the struct `Move`, a packed `u32`:
//!
//! ```md,ignore
//! bits  0 - 5:  origin square (from 0 to 63)
//! bits  6 - 11: destination square (from 0 to 63)
//! bits 12 - 15: moved piece (Piece nibble)
//! bits 16 - 19: captured piece (Piece nibble, or 0 for none)
//! bits 20 - 23: kind (normal, castles, en-passant, promotions)
//! ```
//!
//! Carrying the moved and captured piece in the move itself means unmaking a
//! move needs no extra bookkeeping beyond the per-ply state record, and move
//! ordering heuristics can read both pieces without touching the board.
//!
//! # Special cases
//!
//! The null move is the all-zero value; no legal move encodes to zero since
//! a real move always has a nonzero moved-piece nibble.
//!
//! For castling moves the origin is the king's starting square and the
//! destination the king's arrival square (g1/c1 relative), so the PACN text
//! of a castle is simply `e1g1` style.
//!
//! # Safety
//!
//! A `Move` is only guaranteed to be legal for the position that generated
//! it. Applying a move to a board that did not create it is undefined.

use std::cmp::Ordering;
use std::fmt;

use super::sq::SQ;
use super::{Piece, PieceType, Player};

const SRC_MASK: u32 = 0x0000_003F;
const DST_MASK: u32 = 0x0000_0FC0;
const MOVED_MASK: u32 = 0x0000_F000;
const CAPTURED_MASK: u32 = 0x000F_0000;
const KIND_MASK: u32 = 0x00F0_0000;

/// The kind of a move: normal, one of the two castles, en-passant, or one of
/// the four promotions.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum MoveKind {
    Normal = 0,
    ShortCastle = 1,
    LongCastle = 2,
    EnPassant = 3,
    PromoteQ = 4,
    PromoteR = 5,
    PromoteB = 6,
    PromoteN = 7,
}

impl MoveKind {
    /// Returns the promotion target of a promoting move kind.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the kind is not a promotion.
    #[inline]
    pub fn promotion_piece(self) -> PieceType {
        match self {
            MoveKind::PromoteQ => PieceType::Q,
            MoveKind::PromoteR => PieceType::R,
            MoveKind::PromoteB => PieceType::B,
            MoveKind::PromoteN => PieceType::N,
            _ => {
                debug_assert!(false);
                PieceType::Q
            }
        }
    }
}

/// Represents a singular move, packed into 32 bits.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move {
    data: u32,
}

impl Move {
    /// Creates a new `Move` from its components.
    #[inline(always)]
    pub fn new(src: SQ, dst: SQ, moved: Piece, captured: Piece, kind: MoveKind) -> Move {
        Move {
            data: (src.0 as u32)
                | ((dst.0 as u32) << 6)
                | ((moved as u32) << 12)
                | ((captured as u32) << 16)
                | ((kind as u32) << 20),
        }
    }

    /// Creates the null move.
    ///
    /// # Safety
    ///
    /// A null move is never a legal move to play. It is used for search and
    /// evaluation purposes only.
    #[inline(always)]
    pub const fn null() -> Move {
        Move { data: 0 }
    }

    /// Returns if a `Move` is the null move.
    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.data == 0
    }

    /// Returns the origin square.
    #[inline(always)]
    pub const fn get_src(self) -> SQ {
        SQ((self.data & SRC_MASK) as u8)
    }

    /// Returns the destination square.
    #[inline(always)]
    pub const fn get_dest(self) -> SQ {
        SQ(((self.data & DST_MASK) >> 6) as u8)
    }

    /// Returns the moved piece.
    #[inline(always)]
    pub fn moved_piece(self) -> Piece {
        unsafe { Piece::from_bits(((self.data & MOVED_MASK) >> 12) as u8) }
    }

    /// Returns the captured piece, `Piece::None` for non-captures.
    #[inline(always)]
    pub fn captured_piece(self) -> Piece {
        unsafe { Piece::from_bits(((self.data & CAPTURED_MASK) >> 16) as u8) }
    }

    /// Returns the kind of the move.
    #[inline(always)]
    pub fn kind(self) -> MoveKind {
        unsafe { std::mem::transmute(((self.data & KIND_MASK) >> 20) as u8) }
    }

    /// Returns if a `Move` captures an opponent's piece, en-passant included.
    #[inline(always)]
    pub fn is_capture(self) -> bool {
        (self.data & CAPTURED_MASK) != 0
    }

    /// Returns if a `Move` is a promotion.
    #[inline(always)]
    pub fn is_promo(self) -> bool {
        (self.kind() as u8) >= (MoveKind::PromoteQ as u8)
    }

    /// Returns the promotion piece of a promoting `Move`.
    ///
    /// # Safety
    ///
    /// Only meaningful if the `Move` is a promotion.
    #[inline(always)]
    pub fn promo_piece(self) -> PieceType {
        self.kind().promotion_piece()
    }

    /// Returns if a `Move` is either of the two castles.
    #[inline(always)]
    pub fn is_castle(self) -> bool {
        self.kind() == MoveKind::ShortCastle || self.kind() == MoveKind::LongCastle
    }

    /// Returns if a `Move` is an en-passant capture.
    #[inline(always)]
    pub fn is_en_passant(self) -> bool {
        self.kind() == MoveKind::EnPassant
    }

    /// Returns if a `Move` is a quiet move: not a capture nor a promotion.
    #[inline(always)]
    pub fn is_quiet(self) -> bool {
        !self.is_capture() && !self.is_promo()
    }

    /// Returns if a `Move` is tactical: a capture or a promotion.
    #[inline(always)]
    pub fn is_tactical(self) -> bool {
        !self.is_quiet()
    }

    /// Returns if a `Move` is a pawn advancing two squares.
    #[inline]
    pub fn is_double_push(self) -> bool {
        self.moved_piece().type_of() == PieceType::P
            && self.get_src().0.abs_diff(self.get_dest().0) == 16
    }

    /// Returns the player making the move.
    ///
    /// # Safety
    ///
    /// Only meaningful for non-null moves.
    #[inline(always)]
    pub fn player(self) -> Player {
        self.moved_piece().player_lossy()
    }

    /// Returns the raw number representation of the move.
    #[inline(always)]
    pub const fn get_raw(self) -> u32 {
        self.data
    }

    /// Re-creates a `Move` from its raw representation.
    ///
    /// # Safety
    ///
    /// The bits must have been produced by `get_raw` on a valid move.
    #[inline(always)]
    pub const unsafe fn from_raw(data: u32) -> Move {
        Move { data }
    }

    /// Returns a pure-algebraic coordinate notation string of the move:
    /// origin square, destination square, and the promotion letter if any.
    /// `e2e4`, `a7a8q`.
    pub fn stringify(self) -> String {
        let mut s = format!("{}{}", self.get_src(), self.get_dest());
        if self.is_promo() {
            s.push(self.promo_piece().char_lower());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_null() {
            write!(f, "Move(null)")
        } else {
            write!(
                f,
                "Move({} {:?} x {:?} {:?})",
                self.stringify(),
                self.moved_piece(),
                self.captured_piece(),
                self.kind()
            )
        }
    }
}

/// Structure containing both a score and a `Move`.
///
/// Moves themselves are immutable; ordering heuristics score these pairs and
/// sort them instead.
#[derive(Eq, Copy, Clone, Debug)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

impl Default for ScoredMove {
    #[inline(always)]
    fn default() -> Self {
        ScoredMove {
            mv: Move::null(),
            score: 0,
        }
    }
}

impl ScoredMove {
    /// Creates a new `ScoredMove` with a score of 0.
    #[inline(always)]
    pub fn new(mv: Move) -> Self {
        ScoredMove { mv, score: 0 }
    }

    /// Creates a new `ScoredMove` with the given score.
    #[inline(always)]
    pub fn new_score(mv: Move, score: i32) -> Self {
        ScoredMove { mv, score }
    }

    #[inline(always)]
    pub fn mv(self) -> Move {
        self.mv
    }

    #[inline(always)]
    pub fn score(self) -> i32 {
        self.score
    }
}

impl Ord for ScoredMove {
    fn cmp(&self, other: &ScoredMove) -> Ordering {
        self.score.cmp(&other.score)
    }
}

impl PartialOrd for ScoredMove {
    fn partial_cmp(&self, other: &ScoredMove) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredMove {
    fn eq(&self, other: &ScoredMove) -> bool {
        self.score == other.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_pack_unpack() {
        let m = Move::new(
            SQ::E2,
            SQ::E4,
            Piece::WhitePawn,
            Piece::None,
            MoveKind::Normal,
        );
        assert_eq!(m.get_src(), SQ::E2);
        assert_eq!(m.get_dest(), SQ::E4);
        assert_eq!(m.moved_piece(), Piece::WhitePawn);
        assert_eq!(m.captured_piece(), Piece::None);
        assert_eq!(m.kind(), MoveKind::Normal);
        assert!(m.is_double_push());
        assert!(m.is_quiet());
        assert!(!m.is_null());
        assert_eq!(m.stringify(), "e2e4");
    }

    #[test]
    fn move_promo() {
        let m = Move::new(
            SQ::A7,
            SQ::A8,
            Piece::WhitePawn,
            Piece::None,
            MoveKind::PromoteQ,
        );
        assert!(m.is_promo());
        assert!(m.is_tactical());
        assert_eq!(m.promo_piece(), PieceType::Q);
        assert_eq!(m.stringify(), "a7a8q");

        let m = Move::new(
            SQ::B7,
            SQ::A8,
            Piece::WhitePawn,
            Piece::BlackRook,
            MoveKind::PromoteN,
        );
        assert!(m.is_capture());
        assert_eq!(m.promo_piece(), PieceType::N);
        assert_eq!(m.stringify(), "b7a8n");
    }

    #[test]
    fn move_castle_ep() {
        let m = Move::new(
            SQ::E1,
            SQ::G1,
            Piece::WhiteKing,
            Piece::None,
            MoveKind::ShortCastle,
        );
        assert!(m.is_castle());
        assert_eq!(m.stringify(), "e1g1");

        let ep = Move::new(
            SQ::D5,
            SQ::E6,
            Piece::WhitePawn,
            Piece::BlackPawn,
            MoveKind::EnPassant,
        );
        assert!(ep.is_en_passant());
        assert!(ep.is_capture());
    }

    #[test]
    fn null_move() {
        assert!(Move::null().is_null());
        let m = Move::new(
            SQ::A1,
            SQ::A1,
            Piece::WhiteRook,
            Piece::None,
            MoveKind::Normal,
        );
        assert!(!m.is_null());
    }
}
