//! Move generation for a `Board`. Generates legal moves only, with tactical
//! moves (captures and promotions) produced before quiet moves, and pure
//! evasions when the side to move is in check.
//!
//! Pseudo-legal candidates are produced from the attack tables and filtered
//! through [`Board::legal_move`], which resolves pins, king-walk safety and
//! the en-passant rank-pin case. Castling legality (empty, unattacked path
//! and surviving rights) is verified during generation.
//!
//! [`Board::legal_move`]: ../struct.Board.html#method.legal_move

use super::Board;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::move_list::MoveList;
use crate::core::piece_move::{Move, MoveKind};
use crate::core::sq::{SQ, NO_SQ};
use crate::core::{CastleType, GenTypes, Piece, PieceType, Player};
use crate::helper::prelude::*;

const PROMO_KINDS: [MoveKind; 4] = [
    MoveKind::PromoteQ,
    MoveKind::PromoteR,
    MoveKind::PromoteB,
    MoveKind::PromoteN,
];

/// Public move generator.
pub struct MoveGen {}

impl MoveGen {
    /// Returns a `MoveList` of legal moves of the given type for the board.
    ///
    /// # Panics
    ///
    /// In debug mode, panics if `Evasions` is requested while not in check,
    /// or `Captures`/`Quiets` while in check.
    pub fn generate(board: &Board, gen_type: GenTypes) -> MoveList {
        let mut list = MoveList::default();
        let mut gen = InnerMoveGen::new(board, &mut list);
        match gen_type {
            GenTypes::All => {
                if board.in_check() {
                    gen.generate_evasions();
                } else {
                    gen.generate_captures();
                    gen.generate_quiets();
                }
            }
            GenTypes::Captures => {
                debug_assert!(!board.in_check());
                gen.generate_captures();
            }
            GenTypes::Quiets => {
                debug_assert!(!board.in_check());
                gen.generate_quiets();
            }
            GenTypes::Evasions => {
                debug_assert!(board.in_check());
                gen.generate_evasions();
            }
        }
        list
    }
}

/// Worker holding the per-generation context.
struct InnerMoveGen<'a> {
    board: &'a Board,
    list: &'a mut MoveList,
    occ: BitBoard,
    us_occ: BitBoard,
    them_occ: BitBoard,
    us: Player,
    them: Player,
}

impl<'a> InnerMoveGen<'a> {
    fn new(board: &'a Board, list: &'a mut MoveList) -> InnerMoveGen<'a> {
        let us = board.turn();
        let them = us.other_player();
        InnerMoveGen {
            board,
            list,
            occ: board.occupied(),
            us_occ: board.get_occupied_player(us),
            them_occ: board.get_occupied_player(them),
            us,
            them,
        }
    }

    /// Captures, en-passant, and all promotions.
    fn generate_captures(&mut self) {
        self.generate_pawn_captures_and_promotions(BitBoard::ALL);
        self.moves_per_piece(PieceType::N, self.them_occ);
        self.moves_per_piece(PieceType::B, self.them_occ);
        self.moves_per_piece(PieceType::R, self.them_occ);
        self.moves_per_piece(PieceType::Q, self.them_occ);
        self.moves_per_piece(PieceType::K, self.them_occ);
    }

    /// Non-capturing, non-promoting moves, castling included.
    fn generate_quiets(&mut self) {
        let empty = !self.occ;
        self.generate_pawn_pushes(empty);
        self.moves_per_piece(PieceType::N, empty);
        self.moves_per_piece(PieceType::B, empty);
        self.moves_per_piece(PieceType::R, empty);
        self.moves_per_piece(PieceType::Q, empty);
        self.moves_per_piece(PieceType::K, empty);
        self.generate_castling(CastleType::KingSide);
        self.generate_castling(CastleType::QueenSide);
    }

    /// Check evasions: king walks, and, for a single checker, captures of the
    /// checker and interpositions.
    fn generate_evasions(&mut self) {
        debug_assert!(self.board.in_check());

        let ksq = self.board.king_sq(self.us);
        let checkers = self.board.checkers();

        // King steps; legality (walking out of the slider's ray) is decided
        // by `legal_move`, which lifts the king off the occupancy first.
        let mut k_moves = king_moves(ksq) & !self.us_occ;
        while let Some(dst) = k_moves.pop_some_lsb() {
            self.check_and_add(ksq, dst, MoveKind::Normal);
        }

        // Only with a single checker can a piece block or capture.
        if !checkers.more_than_one() {
            let checker_sq = checkers.bit_scan_forward();
            let target = between_bb(checker_sq, ksq) | checker_sq.to_bb();

            self.generate_pawn_captures_and_promotions(target);
            self.generate_pawn_pushes(target & !self.occ);
            self.moves_per_piece(PieceType::N, target);
            self.moves_per_piece(PieceType::B, target);
            self.moves_per_piece(PieceType::R, target);
            self.moves_per_piece(PieceType::Q, target);
        }
    }

    /// Moves for a non-pawn piece type, restricted to `target` squares.
    fn moves_per_piece(&mut self, piece: PieceType, target: BitBoard) {
        let mut piece_bb = self.board.piece_bb(self.us, piece);
        while let Some(src) = piece_bb.pop_some_lsb() {
            let mut moves =
                self.board.attacks_from(piece, src, self.us, self.occ) & target & !self.us_occ;
            while let Some(dst) = moves.pop_some_lsb() {
                self.check_and_add(src, dst, MoveKind::Normal);
            }
        }
    }

    /// Pawn captures, capturing and non-capturing promotions, and
    /// en-passant, restricted to `target` squares (used by evasions).
    fn generate_pawn_captures_and_promotions(&mut self, target: BitBoard) {
        let rank7 = self.us.relative_rank(crate::core::Rank::R7).bb();
        let pawns = self.board.piece_bb(self.us, PieceType::P);
        let pawns_r7 = pawns & rank7;
        let pawns_not_r7 = pawns & !rank7;

        // Plain captures.
        let mut b = pawns_not_r7;
        while let Some(src) = b.pop_some_lsb() {
            let mut caps = pawn_attacks_from(src, self.us) & self.them_occ & target;
            while let Some(dst) = caps.pop_some_lsb() {
                self.check_and_add(src, dst, MoveKind::Normal);
            }
        }

        // Promotions, capturing and not.
        let mut b = pawns_r7;
        while let Some(src) = b.pop_some_lsb() {
            let push = SQ((src.0 as i8 + self.us.pawn_push()) as u8);
            if (push.to_bb() & self.occ).is_empty() && (push.to_bb() & target).is_not_empty() {
                self.add_promotions(src, push);
            }
            let mut caps = pawn_attacks_from(src, self.us) & self.them_occ & target;
            while let Some(dst) = caps.pop_some_lsb() {
                self.add_promotions(src, dst);
            }
        }

        // En-passant. As an evasion this only applies when the checking
        // piece is the double-pushed pawn itself.
        let ep_sq = self.board.ep_square();
        if ep_sq != NO_SQ {
            let cap_sq = SQ((ep_sq.0 as i8 - self.us.pawn_push()) as u8);
            if target == BitBoard::ALL || (target & cap_sq.to_bb()).is_not_empty() {
                let mut attackers = pawns_not_r7 & pawn_attacks_from(ep_sq, self.them);
                while let Some(src) = attackers.pop_some_lsb() {
                    self.check_and_add(src, ep_sq, MoveKind::EnPassant);
                }
            }
        }
    }

    /// Single and double pawn pushes, excluding promotions, restricted to
    /// `target` (which must already exclude occupied squares).
    fn generate_pawn_pushes(&mut self, target: BitBoard) {
        let rank7 = self.us.relative_rank(crate::core::Rank::R7).bb();
        let rank3 = self.us.relative_rank(crate::core::Rank::R3).bb();
        let pawns_not_r7 = self.board.piece_bb(self.us, PieceType::P) & !rank7;
        let empty = !self.occ;

        let single = pawns_not_r7.shift_forward(self.us) & empty;
        let mut push_one = single & target;
        let mut push_two = (single & rank3).shift_forward(self.us) & empty & target;

        while let Some(dst) = push_one.pop_some_lsb() {
            let src = SQ((dst.0 as i8 - self.us.pawn_push()) as u8);
            self.check_and_add(src, dst, MoveKind::Normal);
        }
        while let Some(dst) = push_two.pop_some_lsb() {
            let src = SQ((dst.0 as i8 - 2 * self.us.pawn_push()) as u8);
            self.check_and_add(src, dst, MoveKind::Normal);
        }
    }

    /// Castling for one side: the right must survive, the path between king
    /// and rook must be empty, the rook must still stand on its corner, and
    /// no square the king crosses may be attacked.
    fn generate_castling(&mut self, side: CastleType) {
        if !self.board.can_castle(self.us, side) {
            return;
        }
        let r_src = SQ(CASTLING_ROOK_START[self.us as usize][side as usize]);
        if self.board.piece_at_sq(r_src) != Piece::make(self.us, PieceType::R) {
            return;
        }

        let ksq = self.board.king_sq(self.us);
        let k_dst = self.us.relative_square(if side == CastleType::KingSide {
            SQ::G1
        } else {
            SQ::C1
        });

        // Walk from the king's destination back to (but excluding) its
        // origin; none of these squares may be attacked.
        let mut s = k_dst;
        let step: i8 = if side == CastleType::KingSide { -1 } else { 1 };
        while s != ksq {
            if (self.board.attackers_to(s, self.occ) & self.them_occ).is_not_empty() {
                return;
            }
            s = SQ((s.0 as i8 + step) as u8);
        }

        let kind = if side == CastleType::KingSide {
            MoveKind::ShortCastle
        } else {
            MoveKind::LongCastle
        };
        let mv = Move::new(
            ksq,
            k_dst,
            Piece::make(self.us, PieceType::K),
            Piece::None,
            kind,
        );
        self.list.push(mv);
    }

    /// Adds all four promotions from `src` to `dst`.
    fn add_promotions(&mut self, src: SQ, dst: SQ) {
        let moved = self.board.piece_at_sq(src);
        let captured = self.board.piece_at_sq(dst);
        for kind in PROMO_KINDS.iter() {
            let mv = Move::new(src, dst, moved, captured, *kind);
            if self.board.legal_move(mv) {
                self.list.push(mv);
            }
        }
    }

    /// Builds the move from the mailbox, verifies legality, and appends it.
    fn check_and_add(&mut self, src: SQ, dst: SQ, kind: MoveKind) {
        let moved = self.board.piece_at_sq(src);
        let captured = if kind == MoveKind::EnPassant {
            Piece::make(self.them, PieceType::P)
        } else {
            self.board.piece_at_sq(dst)
        };
        let mv = Move::new(src, dst, moved, captured, kind);
        if self.board.legal_move(mv) {
            self.list.push(mv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn start_pos_move_count() {
        let board = Board::start_pos();
        assert_eq!(board.generate_moves().len(), 20);
        assert_eq!(
            board.generate_moves_of_type(GenTypes::Captures).len(),
            0
        );
        assert_eq!(board.generate_moves_of_type(GenTypes::Quiets).len(), 20);
    }

    #[test]
    fn tactical_moves_come_first() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
                .unwrap();
        let moves = board.generate_moves();
        let first_quiet = moves.iter().position(|m| m.is_quiet()).unwrap();
        assert!(moves[..first_quiet].iter().all(|m| m.is_tactical()));
        assert!(moves[first_quiet..].iter().all(|m| m.is_quiet()));
    }

    #[test]
    fn evasions_only_when_checked() {
        // White king e1 in check from a rook on e8.
        let board = Board::from_fen("4r1k1/8/8/8/8/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(board.in_check());
        let moves = board.generate_moves();
        // King must step off the e-file; the pawn cannot help.
        assert!(moves.iter().all(|m| {
            m.moved_piece().type_of() == PieceType::K && m.get_dest().file() != crate::core::File::E
        }));
    }

    #[test]
    fn interpose_or_capture_checker() {
        // Black rook e8 checks the e1 king; the a4 rook can interpose on e4,
        // everything else must be a king step off the file.
        let board = Board::from_fen("4r2k/8/8/8/R7/8/3P4/4K2R w - - 0 1").unwrap();
        assert!(board.in_check());
        let moves = board.generate_moves();
        assert!(moves.iter().any(|m| m.stringify() == "a4e4"));
        for m in moves.iter() {
            assert!(
                m.moved_piece().type_of() == PieceType::K || m.stringify() == "a4e4",
                "unexpected evasion {}",
                m
            );
        }
    }

    #[test]
    fn ep_pin_on_fourth_rank_refused() {
        // Classic horizontal-pin case: capturing en passant would expose the
        // white king on the fifth rank to the black rook.
        let board = Board::from_fen("8/8/8/KPp4r/8/8/6k1/8 w - c6 0 2").unwrap();
        let moves = board.generate_moves();
        assert!(moves.iter().all(|m| !m.is_en_passant()));
    }

    #[test]
    fn ep_allowed_when_safe() {
        let board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let moves = board.generate_moves();
        assert!(moves.iter().any(|m| m.is_en_passant()));
    }

    #[test]
    fn castling_generated_and_blocked() {
        // White may castle both sides.
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let moves = board.generate_moves();
        assert!(moves.iter().any(|m| m.kind() == MoveKind::ShortCastle));
        assert!(moves.iter().any(|m| m.kind() == MoveKind::LongCastle));

        // A rook on e8 watching the king's path forbids nothing here, but a
        // rook eyeing f1 forbids the short castle.
        let board = Board::from_fen("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1").unwrap();
        let moves = board.generate_moves();
        assert!(!moves.iter().any(|m| m.kind() == MoveKind::ShortCastle));
        assert!(moves.iter().any(|m| m.kind() == MoveKind::LongCastle));
    }

    #[test]
    fn all_generated_moves_leave_king_safe() {
        for fen in crate::board::fen::ALL_FENS.iter() {
            let mut board = Board::from_fen(fen).unwrap();
            let moves = board.generate_moves();
            for mv in moves.iter() {
                board.apply_move(*mv);
                let us = board.turn().other_player();
                let attackers = board.attackers_to(board.king_sq(us), board.occupied())
                    & board.get_occupied_player(board.turn());
                assert!(attackers.is_empty(), "{} on {}", mv, fen);
                board.undo_move();
            }
        }
    }
}
