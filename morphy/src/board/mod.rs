//! This module contains [`Board`], the object representing the current state
//! of a chessboard. All modifications to the current state of the board are
//! done through this object, as well as gathering information about the
//! current state of the board.
//!
//! [`Board`]: struct.Board.html

pub mod board_state;
pub mod castle_rights;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod piece_locations;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::move_list::MoveList;
use crate::core::piece_move::{Move, MoveKind};
use crate::core::score::Value;
use crate::core::sq::{SQ, NO_SQ};
use crate::core::*;
use crate::helper::prelude::*;

use self::board_state::BoardState;
use self::castle_rights::Castling;
use self::movegen::MoveGen;
use self::piece_locations::PieceLocations;

pub use self::fen::FenBuildError;

use std::fmt;
use std::sync::Arc;

/// The canonical starting-position FEN.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Piece values used by the static exchange evaluator.
pub static SEE_PIECE_VALUE: [Value; PIECE_TYPE_CNT] = [0, 100, 325, 335, 500, 975, 10000];

/// Returns the exchange value of a piece type.
#[inline(always)]
pub fn see_value(pt: PieceType) -> Value {
    SEE_PIECE_VALUE[pt as usize]
}

/// Represents a chessboard.
///
/// `Board` contains everything that needs to be known about the current state
/// of the game. The state that cannot be reversed from a move alone lives in
/// an [`BoardState`] chain with one node per half-move ever played, shared
/// between clones through an `Arc`.
///
/// A board is never shared mutably across threads; each search thread clones
/// the root with [`Board::parallel_clone`] and owns its copy.
///
/// The exact mapping from each square to bits is as follows:
///
/// ```md,ignore
/// 8 | 56 57 58 59 60 61 62 63
/// 7 | 48 49 50 51 52 53 54 55
/// 6 | 40 41 42 43 44 45 46 47
/// 5 | 32 33 34 35 36 37 38 39
/// 4 | 24 25 26 27 28 29 30 31
/// 3 | 16 17 18 19 20 21 22 23
/// 2 | 8  9  10 11 12 13 14 15
/// 1 | 0  1  2  3  4  5  6  7
///   -------------------------
///      a  b  c  d  e  f  g  h
/// ```
///
/// [`BoardState`]: board_state/struct.BoardState.html
pub struct Board {
    turn: Player,
    bbs: [[BitBoard; PIECE_TYPE_CNT]; PLAYER_CNT],
    occ: [BitBoard; PLAYER_CNT],
    occ_all: BitBoard,
    half_moves: u16,
    depth: u16,
    piece_counts: [[u8; PIECE_TYPE_CNT]; PLAYER_CNT],
    piece_locations: PieceLocations,
    state: Arc<BoardState>,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board: {}", self.fen())
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.turn == other.turn
            && self.occ_all == other.occ_all
            && *self.state == *other.state
            && self.piece_locations == other.piece_locations
    }
}

impl Clone for Board {
    fn clone(&self) -> Self {
        self.shallow_clone()
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::start_pos()
    }
}

impl Board {
    /// Constructs a board from the starting position.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphy::{Board, Player};
    ///
    /// let board = Board::start_pos();
    /// assert_eq!(board.count_pieces_player(Player::White), 16);
    /// ```
    pub fn start_pos() -> Board {
        let mut b = Board {
            turn: Player::White,
            bbs: [
                [
                    BitBoard(0),
                    BitBoard(START_W_PAWN),
                    BitBoard(START_W_KNIGHT),
                    BitBoard(START_W_BISHOP),
                    BitBoard(START_W_ROOK),
                    BitBoard(START_W_QUEEN),
                    BitBoard(START_W_KING),
                ],
                [
                    BitBoard(0),
                    BitBoard(START_B_PAWN),
                    BitBoard(START_B_KNIGHT),
                    BitBoard(START_B_BISHOP),
                    BitBoard(START_B_ROOK),
                    BitBoard(START_B_QUEEN),
                    BitBoard(START_B_KING),
                ],
            ],
            occ: [BitBoard(START_WHITE_OCC), BitBoard(START_BLACK_OCC)],
            occ_all: BitBoard(START_OCC_ALL),
            half_moves: 0,
            depth: 0,
            piece_counts: [[0, 8, 2, 2, 2, 1, 1], [0, 8, 2, 2, 2, 1, 1]],
            piece_locations: PieceLocations::blank(),
            state: Arc::new(BoardState::default_start()),
        };
        b.set_piece_locations();
        let mut state = BoardState::default_start();
        b.set_check_info(&mut state);
        state.zobrist = b.compute_zobrist(&state);
        b.state = Arc::new(state);
        b
    }

    /// Constructs a board from a FEN string. Both six-field and four-field
    /// FENs are accepted; the latter defaults the half-move clock to 0 and
    /// the full-move number to 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphy::Board;
    ///
    /// let board = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    /// assert_eq!(board.count_all_pieces(), 32);
    /// ```
    pub fn from_fen(fen: &str) -> Result<Board, FenBuildError> {
        fen::parse_fen(fen)
    }

    /// Constructs a shallow clone of the board: shares the state chain and
    /// resets the distance-from-root counter.
    pub fn shallow_clone(&self) -> Board {
        Board {
            turn: self.turn,
            bbs: self.bbs,
            occ: self.occ,
            occ_all: self.occ_all,
            half_moves: self.half_moves,
            depth: 0,
            piece_counts: self.piece_counts,
            piece_locations: self.piece_locations.clone(),
            state: Arc::clone(&self.state),
        }
    }

    /// Constructs a parallel clone of the board, keeping the current search
    /// depth. Used to hand the same root to multiple search threads.
    pub fn parallel_clone(&self) -> Board {
        Board {
            turn: self.turn,
            bbs: self.bbs,
            occ: self.occ,
            occ_all: self.occ_all,
            half_moves: self.half_moves,
            depth: self.depth,
            piece_counts: self.piece_counts,
            piece_locations: self.piece_locations.clone(),
            state: Arc::clone(&self.state),
        }
    }

    /// Fills the mailbox from the bitboards. Assumes the bitboards are set.
    fn set_piece_locations(&mut self) {
        for sq in 0..SQ_CNT as u8 {
            let s = SQ(sq);
            let bb = s.to_bb();
            self.piece_locations.remove(s);
            for player in &ALL_PLAYERS {
                for pt in &ALL_PIECE_TYPES {
                    if (self.piece_bb(*player, *pt) & bb).is_not_empty() {
                        self.piece_locations.place(s, *player, *pt);
                    }
                }
            }
        }
    }

    /// Recomputes the Zobrist key from scratch. The incremental key must
    /// always agree with this.
    pub(crate) fn compute_zobrist(&self, state: &BoardState) -> u64 {
        let mut zob: u64 = 0;
        let mut occ = self.occ_all;
        while let Some(sq) = occ.pop_some_lsb() {
            let piece = self.piece_at_sq(sq);
            zob ^= z_square(sq, piece);
        }
        if state.ep_square != NO_SQ {
            zob ^= z_ep(state.ep_square);
        }
        zob ^= z_castle(state.castling.bits());
        if self.turn == Player::Black {
            zob ^= z_side();
        }
        zob
    }

    /// Applies a move to the board.
    ///
    /// # Safety
    ///
    /// The move must be legal for the current position; applying an illegal
    /// or foreign move leaves the board in an undefined state.
    pub fn apply_move(&mut self, mv: Move) {
        debug_assert!(!mv.is_null());

        let us = self.turn;
        let them = us.other_player();
        let from = mv.get_src();
        let to = mv.get_dest();
        let moved = mv.moved_piece();
        let captured = mv.captured_piece();
        debug_assert_eq!(self.piece_at_sq(from), moved);

        let mut zob: u64 = self.state.zobrist ^ z_side();
        let mut new_state = self.state.partial_clone();
        new_state.prev = Some(Arc::clone(&self.state));
        new_state.prev_move = mv;
        new_state.rule_50 += 1;
        new_state.ply += 1;

        self.half_moves += 1;
        self.depth += 1;

        // Clear any stale en-passant file before the move may set a new one.
        if self.state.ep_square != NO_SQ {
            zob ^= z_ep(self.state.ep_square);
            new_state.ep_square = NO_SQ;
        }

        match mv.kind() {
            MoveKind::ShortCastle | MoveKind::LongCastle => {
                let side = if mv.kind() == MoveKind::ShortCastle {
                    CastleType::KingSide
                } else {
                    CastleType::QueenSide
                };
                let r_src = SQ(CASTLING_ROOK_START[us as usize][side as usize]);
                let r_dst = us.relative_square(if side == CastleType::KingSide {
                    SQ::F1
                } else {
                    SQ::D1
                });
                self.move_piece_c(PieceType::K, from, to, us);
                self.move_piece_c(PieceType::R, r_src, r_dst, us);
                zob ^= z_square(from, moved) ^ z_square(to, moved);
                let rook = Piece::make(us, PieceType::R);
                zob ^= z_square(r_src, rook) ^ z_square(r_dst, rook);
            }
            MoveKind::EnPassant => {
                let cap_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                debug_assert_eq!(self.piece_at_sq(cap_sq), Piece::make(them, PieceType::P));
                self.remove_piece_c(PieceType::P, cap_sq, them);
                self.move_piece_c(PieceType::P, from, to, us);
                zob ^= z_square(cap_sq, Piece::make(them, PieceType::P));
                zob ^= z_square(from, moved) ^ z_square(to, moved);
                new_state.rule_50 = 0;
            }
            MoveKind::Normal => {
                if captured != Piece::None {
                    self.remove_piece_c(captured.type_of(), to, them);
                    zob ^= z_square(to, captured);
                    new_state.rule_50 = 0;
                }
                self.move_piece_c(moved.type_of(), from, to, us);
                zob ^= z_square(from, moved) ^ z_square(to, moved);
                if moved.type_of() == PieceType::P {
                    new_state.rule_50 = 0;
                    if from.0.abs_diff(to.0) == 16 {
                        let ep = SQ((from.0 + to.0) / 2);
                        new_state.ep_square = ep;
                        zob ^= z_ep(ep);
                    }
                }
            }
            _ => {
                // Promotion, capturing or not.
                let promo = Piece::make(us, mv.promo_piece());
                if captured != Piece::None {
                    self.remove_piece_c(captured.type_of(), to, them);
                    zob ^= z_square(to, captured);
                }
                self.remove_piece_c(PieceType::P, from, us);
                self.put_piece_c(mv.promo_piece(), to, us);
                zob ^= z_square(from, moved) ^ z_square(to, promo);
                new_state.rule_50 = 0;
            }
        }

        // Update castling rights from the squares the move touched.
        if !new_state.castling.no_castling() {
            let removed = new_state.castling.update_castling(to, from);
            if removed != 0 {
                zob ^= z_castle(removed);
            }
        }

        self.turn = them;
        new_state.zobrist = zob;
        new_state.checkers_bb =
            self.attackers_to(self.king_sq(them), self.occ_all) & self.get_occupied_player(us);
        self.set_check_info(&mut new_state);
        self.state = Arc::new(new_state);

        debug_assert!(self.is_ok_quick());
    }

    /// Un-does the previously applied move, returning the board to its most
    /// recently held state.
    ///
    /// # Panics
    ///
    /// Panics if there is no previous move, or if the previous move was a
    /// null move.
    pub fn undo_move(&mut self) {
        assert!(self.state.prev.is_some());
        assert!(!self.state.prev_move.is_null());

        let mv = self.state.prev_move;
        self.turn = self.turn.other_player();
        let us = self.turn;
        let them = us.other_player();
        let from = mv.get_src();
        let to = mv.get_dest();
        let captured = mv.captured_piece();

        match mv.kind() {
            MoveKind::ShortCastle | MoveKind::LongCastle => {
                let side = if mv.kind() == MoveKind::ShortCastle {
                    CastleType::KingSide
                } else {
                    CastleType::QueenSide
                };
                let r_src = SQ(CASTLING_ROOK_START[us as usize][side as usize]);
                let r_dst = us.relative_square(if side == CastleType::KingSide {
                    SQ::F1
                } else {
                    SQ::D1
                });
                self.move_piece_c(PieceType::K, to, from, us);
                self.move_piece_c(PieceType::R, r_dst, r_src, us);
            }
            MoveKind::EnPassant => {
                let cap_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
                self.move_piece_c(PieceType::P, to, from, us);
                self.put_piece_c(PieceType::P, cap_sq, them);
            }
            MoveKind::Normal => {
                self.move_piece_c(mv.moved_piece().type_of(), to, from, us);
                if captured != Piece::None {
                    self.put_piece_c(captured.type_of(), to, them);
                }
            }
            _ => {
                self.remove_piece_c(mv.promo_piece(), to, us);
                self.put_piece_c(PieceType::P, from, us);
                if captured != Piece::None {
                    self.put_piece_c(captured.type_of(), to, them);
                }
            }
        }

        self.state = self.state.get_prev().unwrap();
        self.half_moves -= 1;
        self.depth -= 1;

        debug_assert!(self.is_ok_quick());
    }

    /// Applies a null move to the board, flipping the side to move and
    /// clearing the en-passant rights without moving any pieces.
    ///
    /// # Safety
    ///
    /// Must not be called while the side to move is in check; the resulting
    /// position would not be a legal game state.
    pub unsafe fn apply_null_move(&mut self) {
        debug_assert!(self.checkers().is_empty());

        let mut zob: u64 = self.state.zobrist ^ z_side();
        let mut new_state = self.state.partial_clone();
        new_state.prev = Some(Arc::clone(&self.state));
        new_state.prev_move = Move::null();
        new_state.rule_50 += 1;
        new_state.ply += 1;

        self.depth += 1;
        self.half_moves += 1;

        if self.state.ep_square != NO_SQ {
            zob ^= z_ep(self.state.ep_square);
            new_state.ep_square = NO_SQ;
        }

        self.turn = self.turn.other_player();
        new_state.zobrist = zob;
        self.set_check_info(&mut new_state);
        self.state = Arc::new(new_state);
    }

    /// Undoes a null move.
    ///
    /// # Safety
    ///
    /// The last applied move must have been a null move.
    pub unsafe fn undo_null_move(&mut self) {
        debug_assert!(self.state.prev_move.is_null());
        self.turn = self.turn.other_player();
        self.state = self.state.get_prev().unwrap();
        self.depth -= 1;
        self.half_moves -= 1;
    }

    /// Applies a PACN-encoded move (`e2e4`, `a7a8q`). If the string encodes
    /// a legal move for this position the move is applied and `true` is
    /// returned; otherwise the board is unchanged and `false` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphy::Board;
    ///
    /// let mut board = Board::start_pos();
    /// assert!(board.apply_uci_move("e2e4"));
    /// assert!(!board.apply_uci_move("e7e5xx"));
    /// ```
    pub fn apply_uci_move(&mut self, uci_move: &str) -> bool {
        let all_moves: MoveList = self.generate_moves();
        let mv = all_moves
            .iter()
            .find(|m| m.stringify() == uci_move)
            .cloned();
        if let Some(mv) = mv {
            self.apply_move(mv);
            return true;
        }
        false
    }

    /// Gets a list of legal moves for the player whose turn it is to move,
    /// tactical moves ordered before quiet ones.
    ///
    /// Takes into account whether the board is currently in check, in which
    /// case only evasions are produced.
    pub fn generate_moves(&self) -> MoveList {
        MoveGen::generate(self, GenTypes::All)
    }

    /// Gets a list of legal moves of a certain type.
    ///
    /// # Panics
    ///
    /// In debug mode, panics if `Evasions` is requested while not in check,
    /// or a non-evasion type while in check.
    pub fn generate_moves_of_type(&self, gen_type: GenTypes) -> MoveList {
        MoveGen::generate(self, gen_type)
    }

    //  ------- private mutation helpers -------

    /// Computes the blockers, pinners and checking information for a state.
    fn set_check_info(&self, state: &mut BoardState) {
        for player in &ALL_PLAYERS {
            let ksq = self.king_sq(*player);
            let mut pinners = BitBoard(0);
            state.blockers_king[*player as usize] = self.slider_blockers(
                self.get_occupied_player(player.other_player()),
                ksq,
                &mut pinners,
            );
            state.pinners_king[*player as usize] = pinners;
        }
    }

    /// Places a piece on the board for a given player.
    fn put_piece_c(&mut self, piece: PieceType, square: SQ, player: Player) {
        debug_assert!(self.piece_locations.is_empty_at(square));
        let bb = square.to_bb();
        self.occ_all |= bb;
        self.occ[player as usize] |= bb;
        self.bbs[player as usize][piece as usize] |= bb;
        self.piece_locations.place(square, player, piece);
        self.piece_counts[player as usize][piece as usize] += 1;
    }

    /// Removes a piece from the board for a given player.
    fn remove_piece_c(&mut self, piece: PieceType, square: SQ, player: Player) {
        debug_assert_eq!(self.piece_at_sq(square), Piece::make(player, piece));
        let bb = square.to_bb();
        self.occ_all ^= bb;
        self.occ[player as usize] ^= bb;
        self.bbs[player as usize][piece as usize] ^= bb;
        self.piece_locations.remove(square);
        self.piece_counts[player as usize][piece as usize] -= 1;
    }

    /// Moves a piece from square `from` to square `to` for a given player.
    fn move_piece_c(&mut self, piece: PieceType, from: SQ, to: SQ, player: Player) {
        debug_assert_ne!(from, to);
        let comb = from.to_bb() | to.to_bb();
        self.occ_all ^= comb;
        self.occ[player as usize] ^= comb;
        self.bbs[player as usize][piece as usize] ^= comb;
        self.piece_locations.remove(from);
        self.piece_locations.place(to, player, piece);
    }

    /// Outputs the pieces blocking a slider attack against square `s`, given
    /// the attacking pieces of `sliders`. Fills `pinners` with the sliders
    /// that would attack `s` if their single blocker moved away.
    fn slider_blockers(&self, sliders: BitBoard, s: SQ, pinners: &mut BitBoard) -> BitBoard {
        let mut result = BitBoard(0);
        *pinners = BitBoard(0);
        let occupied = self.occ_all;

        let mut snipers: BitBoard = sliders
            & ((rook_moves(BitBoard(0), s)
                & self.piece_two_bb_both_players(PieceType::R, PieceType::Q))
                | (bishop_moves(BitBoard(0), s)
                    & self.piece_two_bb_both_players(PieceType::B, PieceType::Q)));

        while let Some(sniper_sq) = snipers.pop_some_lsb() {
            let b = between_bb(s, sniper_sq) & occupied;
            if b.is_not_empty() && !b.more_than_one() {
                result |= b;
                let s_player = self.player_at_sq(s);
                if let Some(p) = s_player {
                    if (b & self.get_occupied_player(p)).is_not_empty() {
                        *pinners |= sniper_sq.to_bb();
                    }
                }
            }
        }

        result
    }
}

// General information

impl Board {
    /// Gets the player whose turn it is to move.
    #[inline(always)]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Returns the Zobrist key of the board.
    #[inline(always)]
    pub fn zobrist(&self) -> u64 {
        self.state.zobrist
    }

    /// Gets the total number of half-moves played on this board.
    #[inline(always)]
    pub fn moves_played(&self) -> u16 {
        self.half_moves
    }

    /// Gets the current depth: half-moves since the last shallow clone.
    #[inline(always)]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Gets the number of half-moves since the last capture or pawn move.
    #[inline(always)]
    pub fn rule_50(&self) -> i16 {
        self.state.rule_50
    }

    /// Gets the current ply of the state chain.
    #[inline(always)]
    pub fn ply(&self) -> u16 {
        self.state.ply
    }

    /// Returns the move played to reach the current position, if any.
    #[inline(always)]
    pub fn last_move(&self) -> Option<Move> {
        if self.state.prev_move.is_null() {
            None
        } else {
            Some(self.state.prev_move)
        }
    }

    /// Gets the current en-passant square, `NO_SQ` if none.
    #[inline(always)]
    pub fn ep_square(&self) -> SQ {
        self.state.ep_square
    }

    /// Gets the `BitBoard` of all pieces.
    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.occ_all
    }

    /// Gets the `BitBoard` of the squares occupied by the given player.
    #[inline(always)]
    pub fn get_occupied_player(&self, player: Player) -> BitBoard {
        self.occ[player as usize]
    }

    /// Returns the `BitBoard` of a single player's piece type.
    #[inline(always)]
    pub fn piece_bb(&self, player: Player, piece: PieceType) -> BitBoard {
        self.bbs[player as usize][piece as usize]
    }

    /// Returns the combined `BitBoard` of both players for a given piece.
    #[inline(always)]
    pub fn piece_bb_both_players(&self, piece: PieceType) -> BitBoard {
        self.bbs[0][piece as usize] | self.bbs[1][piece as usize]
    }

    /// Returns the combined `BitBoard` of both players for two pieces.
    #[inline(always)]
    pub fn piece_two_bb_both_players(&self, piece: PieceType, piece2: PieceType) -> BitBoard {
        self.piece_bb_both_players(piece) | self.piece_bb_both_players(piece2)
    }

    /// Returns the `BitBoard` of two piece types for the given player.
    #[inline(always)]
    pub fn piece_two_bb(&self, piece: PieceType, piece2: PieceType, player: Player) -> BitBoard {
        self.bbs[player as usize][piece as usize] | self.bbs[player as usize][piece2 as usize]
    }

    /// Returns the `BitBoard` of the rooks and queens of a given player.
    #[inline(always)]
    pub fn sliding_piece_bb(&self, player: Player) -> BitBoard {
        self.piece_two_bb(PieceType::R, PieceType::Q, player)
    }

    /// Returns the `BitBoard` of the bishops and queens of a given player.
    #[inline(always)]
    pub fn diagonal_piece_bb(&self, player: Player) -> BitBoard {
        self.piece_two_bb(PieceType::B, PieceType::Q, player)
    }

    /// Gets the count of a piece type for the given player.
    #[inline(always)]
    pub fn count_piece(&self, player: Player, piece: PieceType) -> u8 {
        self.piece_counts[player as usize][piece as usize]
    }

    /// Gets the total number of pieces a given player has.
    pub fn count_pieces_player(&self, player: Player) -> u8 {
        self.piece_counts[player as usize].iter().sum()
    }

    /// Gets the total number of pieces on the board.
    #[inline]
    pub fn count_all_pieces(&self) -> u8 {
        self.count_pieces_player(Player::White) + self.count_pieces_player(Player::Black)
    }

    /// Returns true if the given player has any pieces besides pawns and
    /// the king.
    #[inline]
    pub fn non_pawn_material(&self, player: Player) -> bool {
        self.count_piece(player, PieceType::N) != 0
            || self.count_piece(player, PieceType::B) != 0
            || self.count_piece(player, PieceType::R) != 0
            || self.count_piece(player, PieceType::Q) != 0
    }

    /// Returns true if either player has any pieces besides pawns and kings.
    #[inline]
    pub fn non_pawn_material_all(&self) -> bool {
        self.non_pawn_material(Player::White) || self.non_pawn_material(Player::Black)
    }

    /// Returns the piece at the given square, `Piece::None` for empty.
    #[inline]
    pub fn piece_at_sq(&self, sq: SQ) -> Piece {
        debug_assert!(sq.is_okay());
        self.piece_locations.piece_at(sq)
    }

    /// Returns the player occupying a square, if any.
    #[inline(always)]
    pub fn player_at_sq(&self, sq: SQ) -> Option<Player> {
        self.piece_locations.player_at(sq)
    }

    /// Returns the square of the king for a given player.
    #[inline(always)]
    pub fn king_sq(&self, player: Player) -> SQ {
        self.bbs[player as usize][PieceType::K as usize].to_sq()
    }

    /// Returns the pinned pieces of the given player, pinned to their own
    /// king.
    #[inline(always)]
    pub fn pinned_pieces(&self, player: Player) -> BitBoard {
        self.state.blockers_king[player as usize] & self.get_occupied_player(player)
    }

    /// Returns the `BitBoard` of pieces currently giving check.
    #[inline(always)]
    pub fn checkers(&self) -> BitBoard {
        self.state.checkers_bb
    }

    /// Returns if the side to move is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.state.checkers_bb.is_not_empty()
    }

    /// Returns the castling rights of the current position.
    #[inline(always)]
    pub fn castling(&self) -> Castling {
        self.state.castling
    }

    /// Returns if the given player can castle on the given side: the right
    /// is present, the path is empty.
    #[inline]
    pub fn can_castle(&self, player: Player, side: CastleType) -> bool {
        self.state.castling.castle_rights(player, side)
            && (BitBoard(CASTLING_PATH[player as usize][side as usize]) & self.occ_all).is_empty()
    }

    /// Returns a `BitBoard` of all pieces (of both players) attacking the
    /// given square, under the given occupancy.
    pub fn attackers_to(&self, sq: SQ, occupied: BitBoard) -> BitBoard {
        (pawn_attacks_from(sq, Player::Black) & self.piece_bb(Player::White, PieceType::P))
            | (pawn_attacks_from(sq, Player::White) & self.piece_bb(Player::Black, PieceType::P))
            | (knight_moves(sq) & self.piece_bb_both_players(PieceType::N))
            | (rook_moves(occupied, sq)
                & self.piece_two_bb_both_players(PieceType::R, PieceType::Q))
            | (bishop_moves(occupied, sq)
                & self.piece_two_bb_both_players(PieceType::B, PieceType::Q))
            | (king_moves(sq) & self.piece_bb_both_players(PieceType::K))
    }

    /// Returns the attack `BitBoard` of a piece type standing on `sq` under
    /// the given occupancy. Pawns attack as the given player.
    pub fn attacks_from(&self, piece: PieceType, sq: SQ, player: Player, occ: BitBoard) -> BitBoard {
        match piece {
            PieceType::P => pawn_attacks_from(sq, player),
            PieceType::N => knight_moves(sq),
            PieceType::B => bishop_moves(occ, sq),
            PieceType::R => rook_moves(occ, sq),
            PieceType::Q => queen_moves(occ, sq),
            PieceType::K => king_moves(sq),
            PieceType::None => BitBoard(0),
        }
    }

    /// Tests if a generated pseudo-legal move leaves the own king out of
    /// check. Castling moves are verified at generation time and always pass.
    pub fn legal_move(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }
        let us = self.turn;
        let them = us.other_player();
        let from = mv.get_src();
        let to = mv.get_dest();

        if mv.is_en_passant() {
            // The only tricky case: both the moving and the captured pawn
            // leave their squares, opening two lines at once.
            let ksq = self.king_sq(us);
            let cap_sq = SQ((to.0 as i8 - us.pawn_push()) as u8);
            let occupied = (self.occ_all ^ from.to_bb() ^ cap_sq.to_bb()) | to.to_bb();
            return (rook_moves(occupied, ksq) & self.sliding_piece_bb(them)).is_empty()
                && (bishop_moves(occupied, ksq) & self.diagonal_piece_bb(them)).is_empty();
        }

        if mv.moved_piece().type_of() == PieceType::K {
            return mv.is_castle()
                || (self.attackers_to(to, self.occ_all ^ from.to_bb())
                    & self.get_occupied_player(them))
                .is_empty();
        }

        // A non-king move is legal iff the piece is not pinned, or it moves
        // along the pin line.
        (self.pinned_pieces(us) & from.to_bb()).is_empty()
            || aligned(from, to, self.king_sq(us))
    }

    /// Returns if the given pseudo-legal move gives check to the opponent.
    pub fn gives_check(&self, mv: Move) -> bool {
        let us = self.turn;
        let them = us.other_player();
        let ksq = self.king_sq(them);
        let from = mv.get_src();
        let to = mv.get_dest();

        // Occupancy after the move.
        let mut occ = (self.occ_all ^ from.to_bb()) | to.to_bb();
        if mv.is_en_passant() {
            occ ^= SQ((to.0 as i8 - us.pawn_push()) as u8).to_bb();
        }

        // Direct check by the arriving piece.
        let arriving = if mv.is_promo() {
            mv.promo_piece()
        } else {
            mv.moved_piece().type_of()
        };
        if arriving != PieceType::K
            && (self.attacks_from(arriving, to, us, occ) & ksq.to_bb()).is_not_empty()
        {
            return true;
        }

        if mv.is_castle() {
            let side = if mv.kind() == MoveKind::ShortCastle {
                CastleType::KingSide
            } else {
                CastleType::QueenSide
            };
            let r_src = SQ(CASTLING_ROOK_START[us as usize][side as usize]);
            let r_dst = us.relative_square(if side == CastleType::KingSide {
                SQ::F1
            } else {
                SQ::D1
            });
            occ ^= r_src.to_bb() | r_dst.to_bb();
            return (rook_moves(occ, r_dst) & ksq.to_bb()).is_not_empty();
        }

        // Discovered check: the vacated square unblocks a slider. For
        // en-passant the captured pawn's square may unblock one as well, so
        // recompute the slider reach outright.
        if mv.is_en_passant() {
            return (rook_moves(occ, ksq) & self.sliding_piece_bb(us) & occ).is_not_empty()
                || (bishop_moves(occ, ksq) & self.diagonal_piece_bb(us) & occ).is_not_empty();
        }

        (self.state.blockers_king[them as usize] & from.to_bb()).is_not_empty()
            && !aligned(from, to, ksq)
    }

    /// Static exchange evaluation of a move into its destination square:
    /// the signed material result of minimax-playing the capture sequence
    /// with each side always recapturing with its least valuable attacker,
    /// x-rays included.
    pub fn see(&self, mv: Move) -> Value {
        debug_assert!(!mv.is_null());
        if mv.is_castle() {
            return 0;
        }

        let to = mv.get_dest();
        let mut occ = self.occ_all;
        let mut gain: [Value; 32] = [0; 32];
        let mut depth: usize = 0;

        let mut attacker_value: Value;
        gain[0] = see_value(mv.captured_piece().type_of());
        if mv.is_promo() {
            let promo = mv.promo_piece();
            gain[0] += see_value(promo) - see_value(PieceType::P);
            attacker_value = see_value(promo);
        } else {
            attacker_value = see_value(mv.moved_piece().type_of());
        }

        occ ^= mv.get_src().to_bb();
        if mv.is_en_passant() {
            occ ^= SQ((to.0 as i8 - self.turn.pawn_push()) as u8).to_bb();
        }

        let mut stm = self.turn.other_player();
        loop {
            depth += 1;
            gain[depth] = attacker_value - gain[depth - 1];
            // Neither continuing nor stopping can win material back: prune.
            if (-gain[depth - 1]).max(gain[depth]) < 0 {
                break;
            }
            match self.least_valuable_attacker(to, stm, occ) {
                None => break,
                Some((sq, pt)) => {
                    if pt == PieceType::K {
                        // The king may only recapture if the square is not
                        // defended any further.
                        let defended = self
                            .attackers_to(to, occ ^ sq.to_bb())
                            & self.get_occupied_player(stm.other_player())
                            & occ;
                        if defended.is_not_empty() {
                            break;
                        }
                    }
                    attacker_value = see_value(pt);
                    occ ^= sq.to_bb();
                    stm = stm.other_player();
                }
            }
            if depth >= 30 {
                break;
            }
        }

        while depth > 1 {
            depth -= 1;
            gain[depth - 1] = -((-gain[depth - 1]).max(gain[depth]));
        }
        gain[0]
    }

    /// Finds the least valuable piece of `side` attacking `to` under the
    /// given occupancy, considering only pieces still present in `occ`.
    fn least_valuable_attacker(
        &self,
        to: SQ,
        side: Player,
        occ: BitBoard,
    ) -> Option<(SQ, PieceType)> {
        let them = side.other_player();

        let pawns = self.piece_bb(side, PieceType::P) & occ;
        let b = pawn_attacks_from(to, them) & pawns;
        if b.is_not_empty() {
            return Some((b.bit_scan_forward(), PieceType::P));
        }

        let knights = self.piece_bb(side, PieceType::N) & occ;
        let b = knight_moves(to) & knights;
        if b.is_not_empty() {
            return Some((b.bit_scan_forward(), PieceType::N));
        }

        let diag = bishop_moves(occ, to);
        let bishops = self.piece_bb(side, PieceType::B) & occ;
        let b = diag & bishops;
        if b.is_not_empty() {
            return Some((b.bit_scan_forward(), PieceType::B));
        }

        let straight = rook_moves(occ, to);
        let rooks = self.piece_bb(side, PieceType::R) & occ;
        let b = straight & rooks;
        if b.is_not_empty() {
            return Some((b.bit_scan_forward(), PieceType::R));
        }

        let queens = self.piece_bb(side, PieceType::Q) & occ;
        let b = (diag | straight) & queens;
        if b.is_not_empty() {
            return Some((b.bit_scan_forward(), PieceType::Q));
        }

        let kings = self.piece_bb(side, PieceType::K) & occ;
        let b = king_moves(to) & kings;
        if b.is_not_empty() {
            return Some((b.bit_scan_forward(), PieceType::K));
        }
        None
    }

    /// Returns if the current position has repeated within the fifty-move
    /// window. Deep in the tree a single repeat counts as a draw claim; near
    /// the root (`dist_from_root <= 2`) two repeats are required.
    pub fn repeated(&self, dist_from_root: u16) -> bool {
        let needed = if dist_from_root > 2 { 1 } else { 2 };
        let zob = self.state.zobrist;
        let window = self.state.rule_50.max(0) as u32;

        let mut found = 0;
        let mut back: u32 = 0;
        let mut node: &BoardState = &self.state;
        while let Some(prev) = node.prev.as_deref() {
            back += 1;
            if back > window {
                break;
            }
            node = prev;
            if back % 2 == 0 && node.zobrist == zob {
                found += 1;
                if found >= needed {
                    return true;
                }
            }
        }
        false
    }

    /// Returns if the half-move clock has reached the fifty-move-rule bound.
    #[inline]
    pub fn fifty_move_rule(&self) -> bool {
        self.state.rule_50 >= 100
    }

    /// Returns if neither side retains enough material to ever mate:
    /// kings only, a single minor piece besides the kings, or bishops only
    /// with every bishop on the same square color.
    pub fn insufficient_material(&self) -> bool {
        if self.piece_bb_both_players(PieceType::P).is_not_empty()
            || self.piece_bb_both_players(PieceType::R).is_not_empty()
            || self.piece_bb_both_players(PieceType::Q).is_not_empty()
        {
            return false;
        }
        let knights = self.piece_bb_both_players(PieceType::N);
        let bishops = self.piece_bb_both_players(PieceType::B);
        let minors = knights.count_bits() + bishops.count_bits();
        if minors <= 1 {
            return true;
        }
        knights.is_empty()
            && ((bishops & BitBoard::DARK_SQUARES).is_empty()
                || (bishops & BitBoard::LIGHT_SQUARES).is_empty())
    }

    /// Returns if the current position is stalemate: not in check with no
    /// legal moves.
    pub fn stalemate(&self) -> bool {
        !self.in_check() && self.generate_moves().is_empty()
    }

    /// Returns if the current position is checkmate.
    pub fn checkmate(&self) -> bool {
        self.in_check() && self.generate_moves().is_empty()
    }

    /// Creates a FEN string of the board.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphy::Board;
    ///
    /// let board = Board::start_pos();
    /// assert_eq!(board.fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    /// ```
    pub fn fen(&self) -> String {
        let mut s = String::default();
        let mut blanks = 0;
        for idx in 0..SQ_CNT as u8 {
            // FEN ranks come out top first.
            let sq = SQ((idx % 8) + (8 * (7 - (idx / 8))));
            if sq.file() == File::A && sq.rank() != Rank::R8 {
                if blanks != 0 {
                    s.push(char::from_digit(blanks, 10).unwrap());
                    blanks = 0;
                }
                s.push('/');
            }
            let piece = self.piece_at_sq(sq);
            if piece == Piece::None {
                blanks += 1;
            } else {
                if blanks != 0 {
                    s.push(char::from_digit(blanks, 10).unwrap());
                    blanks = 0;
                }
                s.push(piece.character_lossy());
            }
        }
        if blanks != 0 {
            s.push(char::from_digit(blanks, 10).unwrap());
        }

        s.push(' ');
        s.push(match self.turn {
            Player::White => 'w',
            Player::Black => 'b',
        });
        s.push(' ');
        s.push_str(&self.state.castling.pretty_string());
        s.push(' ');
        if self.ep_square() == NO_SQ {
            s.push('-');
        } else {
            let ep = self.ep_square();
            s.push(FILE_DISPLAYS[ep.file_idx_of_sq() as usize]);
            s.push(RANK_DISPLAYS[ep.rank_idx_of_sq() as usize]);
        }
        s.push(' ');
        s.push_str(&format!("{}", self.rule_50()));
        s.push(' ');
        s.push_str(&format!("{}", (self.half_moves / 2) + 1));
        s
    }

    /// Returns a prettified string of the board, for printing.
    pub fn pretty_string(&self) -> String {
        let mut s = String::with_capacity(SQ_CNT * 2 + 40);
        for sq in SQ_DISPLAY_ORDER.iter() {
            let piece = self.piece_at_sq(SQ(*sq));
            let char = piece.character().unwrap_or('-');
            s.push(char);
            s.push(' ');
            if sq % 8 == 7 {
                s.push('\n');
            }
        }
        s
    }

    /// A cheap subset of [`Board::is_okay`]: occupancy union and king
    /// counts. Checked after every mutation in debug builds.
    pub fn is_ok_quick(&self) -> bool {
        (self.occ[0] | self.occ[1]) == self.occ_all
            && (self.occ[0] & self.occ[1]).is_empty()
            && self.count_piece(Player::White, PieceType::K) == 1
            && self.count_piece(Player::Black, PieceType::K) == 1
    }

    /// Checks the internal consistency of the board: bitboard/mailbox
    /// agreement, exactly one king each, the side not to move not in check,
    /// and the incrementally kept Zobrist key matching a recomputation.
    pub fn is_okay(&self) -> bool {
        // Mailbox and bitboards agree.
        for sq in 0..SQ_CNT as u8 {
            let s = SQ(sq);
            let piece = self.piece_locations.piece_at(s);
            if piece == Piece::None {
                if (self.occ_all & s.to_bb()).is_not_empty() {
                    return false;
                }
            } else {
                let player = piece.player_lossy();
                if (self.piece_bb(player, piece.type_of()) & s.to_bb()).is_empty() {
                    return false;
                }
            }
        }
        // Disjoint piece boards summing to the occupancy.
        let mut union = BitBoard(0);
        let mut total: u32 = 0;
        for player in &ALL_PLAYERS {
            for pt in &ALL_PIECE_TYPES {
                let bb = self.piece_bb(*player, *pt);
                total += bb.count_bits() as u32;
                union |= bb;
            }
        }
        if union != self.occ_all || total != self.occ_all.count_bits() as u32 {
            return false;
        }
        // One king per side.
        if self.count_piece(Player::White, PieceType::K) != 1
            || self.count_piece(Player::Black, PieceType::K) != 1
        {
            return false;
        }
        // The side not to move is never in check.
        let them = self.turn.other_player();
        if (self.attackers_to(self.king_sq(them), self.occ_all)
            & self.get_occupied_player(self.turn))
        .is_not_empty()
        {
            return false;
        }
        // Incremental hash agrees with a from-scratch computation.
        self.state.zobrist == self.compute_zobrist(&self.state)
    }
}
