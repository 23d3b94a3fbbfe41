//! Static position evaluation with tapered opening/endgame weighting.
//!
//! The evaluator is lazy: material and piece-square terms are computed
//! first, and when that core score already lands far outside the caller's
//! `(alpha, beta)` window the remaining positional terms are skipped. The
//! evaluation cache records whether a stored score was fully computed
//! (exact) or lazily cut short.
//!
//! All scores are centipawns from the side-to-move's point of view.

use morphy::core::bitboard::BitBoard;
use morphy::core::score::{Value, Score};
use morphy::core::sq::SQ;
use morphy::helper::prelude::*;
use morphy::{Board, PieceType, Player};

use crate::params::SearchParams;
use crate::tables::EvalTable;

/// Phase weights per piece type: knights and bishops count one, rooks two,
/// queens four. The sum over a full board is 24.
const PHASE_WEIGHT: [i32; 7] = [0, 0, 1, 1, 2, 4, 0];
const PHASE_TOTAL: i32 = 24;

/// The immediate-capture ladder: (victim, attacker) pairs ordered by the
/// material swing of the capture, best first.
const CAPTURE_LADDER: [(PieceType, PieceType); 10] = [
    (PieceType::Q, PieceType::P),
    (PieceType::Q, PieceType::N),
    (PieceType::Q, PieceType::B),
    (PieceType::Q, PieceType::R),
    (PieceType::R, PieceType::P),
    (PieceType::B, PieceType::P),
    (PieceType::R, PieceType::N),
    (PieceType::N, PieceType::P),
    (PieceType::B, PieceType::N),
    (PieceType::R, PieceType::B),
];

/// Returns the game phase in `0..=256`, where 256 is the starting middle
/// game and 0 a bare-kings ending.
pub fn game_phase(board: &Board) -> i32 {
    let mut total = 0;
    for player in &[Player::White, Player::Black] {
        for pt in &[PieceType::N, PieceType::B, PieceType::R, PieceType::Q] {
            total += PHASE_WEIGHT[*pt as usize] * board.count_piece(*player, *pt) as i32;
        }
    }
    (total * 256 / PHASE_TOTAL).min(256)
}

/// The static evaluator.
pub struct Evaluation<'a> {
    board: &'a Board,
    params: &'a SearchParams,
    phase: i32,
}

impl<'a> Evaluation<'a> {
    /// Evaluates a position against the caller's window, consulting and
    /// feeding the evaluation cache.
    pub fn evaluate(
        board: &Board,
        cache: &EvalTable,
        params: &SearchParams,
        alpha: Value,
        beta: Value,
    ) -> Value {
        if board.insufficient_material() {
            return params.insufficient_material_score;
        }

        let key = board.zobrist();
        if let Some(entry) = cache.probe(key) {
            let score = entry.score as Value;
            // An exact entry always serves; a lazy one only when it still
            // decides the caller's window with margin to spare.
            if entry.exact
                || score >= beta + params.lazy_eval_margin
                || score <= alpha - params.lazy_eval_margin
            {
                return score;
            }
        }

        let eval = Evaluation {
            board,
            params,
            phase: game_phase(board),
        };

        let us = board.turn();
        let core = eval.material_and_psqt(us) + params.tempo;
        if core >= beta + params.lazy_eval_margin || core <= alpha - params.lazy_eval_margin {
            cache.store(key, clamp_score(core), false);
            return core;
        }

        let score = core + eval.positional_terms(us);
        let exact =
            score > alpha - params.lazy_eval_margin && score < beta + params.lazy_eval_margin;
        cache.store(key, clamp_score(score), exact);
        score
    }

    /// Tapered material plus piece-square scores, from `us`'s view.
    fn material_and_psqt(&self, us: Player) -> Value {
        let mut score = Score::ZERO;
        let mut white_view: Value = 0;

        for player in &[Player::White, Player::Black] {
            let sign: Value = if *player == Player::White { 1 } else { -1 };
            for pt in &[
                PieceType::P,
                PieceType::N,
                PieceType::B,
                PieceType::R,
                PieceType::Q,
            ] {
                white_view +=
                    sign * self.params.piece_value(*pt, self.phase)
                        * self.board.count_piece(*player, *pt) as Value;
            }
            let mut occ = self.board.get_occupied_player(*player);
            while let Some(sq) = occ.pop_some_lsb() {
                score += psq(self.board.piece_at_sq(sq), sq);
            }
        }

        white_view += score.taper(self.phase);
        if us == Player::White {
            white_view
        } else {
            -white_view
        }
    }

    /// Everything beyond material: pawn structure, pins, mobility, tropism,
    /// bishop pair, and the immediate-capture ladder. From `us`'s view.
    fn positional_terms(&self, us: Player) -> Value {
        let them = us.other_player();
        let mut score = self.side_terms(us) - self.side_terms(them);
        score += self.immediate_capture_bonus(us);
        score
    }

    /// Positional terms counted once per side.
    fn side_terms(&self, side: Player) -> Value {
        let board = self.board;
        let params = self.params;
        let them = side.other_player();
        let mut score: Value = 0;

        // Bishop pair on opposite square colors.
        let bishops = board.piece_bb(side, PieceType::B);
        if (bishops & BitBoard::DARK_SQUARES).is_not_empty()
            && (bishops & BitBoard::LIGHT_SQUARES).is_not_empty()
        {
            score += params.bishop_pair;
        }

        score += self.pawn_terms(side);

        // Pinned pieces.
        let mut pinned = board.pinned_pieces(side);
        while let Some(sq) = pinned.pop_some_lsb() {
            let pt = board.piece_at_sq(sq).type_of();
            score -= params.pinned_piece_penalty[pt as usize];
        }

        // Mobility for knights, bishops and rooks, with pinned pieces
        // restricted to their pin line.
        let occ = board.occupied();
        let us_occ = board.get_occupied_player(side);
        let ksq = board.king_sq(side);
        let pinned = board.pinned_pieces(side);
        for pt in &[PieceType::N, PieceType::B, PieceType::R] {
            let mut pieces = board.piece_bb(side, *pt);
            while let Some(sq) = pieces.pop_some_lsb() {
                let mut reach = board.attacks_from(*pt, sq, side, occ) & !us_occ;
                if (pinned & sq.to_bb()).is_not_empty() {
                    reach &= line_bb(ksq, sq);
                }
                score += params.mobility_weight[*pt as usize] * reach.count_bits() as Value;
            }
        }

        // Queen to enemy-king tropism: the averaged Chebyshev distance is a
        // penalty, a distant queen attacks nothing.
        let mut queens = board.piece_bb(side, PieceType::Q);
        let queen_count = queens.count_bits() as Value;
        if queen_count > 0 {
            let enemy_ksq = board.king_sq(them);
            let mut dist_sum: Value = 0;
            while let Some(sq) = queens.pop_some_lsb() {
                dist_sum += distance_of_sqs(sq, enemy_ksq) as Value;
            }
            score -= params.queen_king_tropism * dist_sum / queen_count;
        }

        score
    }

    /// Pawn-structure terms for one side: blocked strides, passed pawns,
    /// open backward pawns, stopped pawns, and king-pawn tropism.
    fn pawn_terms(&self, side: Player) -> Value {
        let board = self.board;
        let params = self.params;
        let them = side.other_player();
        let mut score: Value = 0;

        let own_ksq = board.king_sq(side);
        let their_ksq = board.king_sq(them);
        let their_pawns = board.piece_bb(them, PieceType::P);
        let own_pawns = board.piece_bb(side, PieceType::P);
        let occ = board.occupied();
        let their_non_pawn = board.get_occupied_player(them) & !their_pawns;

        let mut pawns = own_pawns;
        while let Some(sq) = pawns.pop_some_lsb() {
            // Blocked strides: occupied squares one, two, three steps ahead.
            let mut step = sq;
            for dist in 0..3usize {
                let next = step.0 as i8 + side.pawn_push();
                if !(0..64).contains(&next) {
                    break;
                }
                step = SQ(next as u8);
                if (step.to_bb() & occ).is_not_empty() {
                    if dist == 0 {
                        score -= params.blocked_pawn_penalty[0];
                        // Stopped outright by an enemy piece.
                        if (step.to_bb() & their_non_pawn).is_not_empty() {
                            score -= params.stopped_pawn_penalty;
                        }
                    } else {
                        score -= params.blocked_pawn_penalty[dist];
                    }
                    break;
                }
            }

            let passed = (passed_pawn_mask(side, sq) & their_pawns).is_empty();
            let backward = !passed
                && (pawn_attacks_span(them, sq) & own_pawns).is_empty()
                && (forward_file_bb(side, sq) & their_pawns).is_empty();

            let category = if passed {
                score += params.passed_pawn_bonus;
                2
            } else if backward {
                score -= params.open_backward_pawn_penalty;
                1
            } else {
                0
            };

            // King-pawn Manhattan tropism: keep the own king close, prize
            // the enemy king being far.
            score -= params.friendly_king_tropism[category]
                * sq.manhattan_distance(own_ksq) as Value;
            score += params.opponent_king_tropism[category]
                * sq.manhattan_distance(their_ksq) as Value;
        }

        score
    }

    /// Bonus for the most valuable piece the side to move can capture
    /// cheaply, from the fixed victim-attacker ladder.
    fn immediate_capture_bonus(&self, us: Player) -> Value {
        let board = self.board;
        let occ = board.occupied();

        for (victim, attacker) in CAPTURE_LADDER.iter() {
            let victims = board.piece_bb(us.other_player(), *victim);
            if victims.is_empty() {
                continue;
            }
            let mut attackers = board.piece_bb(us, *attacker);
            let mut reach = BitBoard(0);
            while let Some(sq) = attackers.pop_some_lsb() {
                reach |= board.attacks_from(*attacker, sq, us, occ);
            }
            if (reach & victims).is_not_empty() {
                let swing = self.params.piece_value(*victim, self.phase)
                    - self.params.piece_value(*attacker, self.phase);
                return swing / self.params.immediate_capture_divisor;
            }
        }
        0
    }
}

#[inline]
fn clamp_score(v: Value) -> i16 {
    v.clamp(i16::MIN as Value, i16::MAX as Value) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_of(fen: &str) -> Value {
        let board = Board::from_fen(fen).unwrap();
        let cache = EvalTable::new(1);
        let params = SearchParams::default();
        Evaluation::evaluate(&board, &cache, &params, -30000, 30000)
    }

    #[test]
    fn start_position_is_balanced() {
        let v = eval_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        // White should hold at most the tempo edge plus noise.
        assert!(v.abs() < 60, "start eval {}", v);
    }

    #[test]
    fn symmetric_position_mirrors() {
        let w = eval_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let b = eval_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1");
        // The same symmetric position must score identically for both
        // sides to move.
        assert_eq!(w, b);
    }

    #[test]
    fn extra_queen_dominates() {
        let v = eval_of("3qk3/8/8/8/8/8/8/3QK2Q w - - 0 1");
        assert!(v > 500, "two queens vs one scored {}", v);
        let v = eval_of("3qk2q/8/8/8/8/8/8/3QK3 w - - 0 1");
        assert!(v < -500);
    }

    #[test]
    fn insufficient_material_is_drawn() {
        let v = eval_of("7k/8/8/8/8/8/8/6NK w - - 0 1");
        assert_eq!(v, SearchParams::default().insufficient_material_score);
    }

    #[test]
    fn phase_bounds() {
        let full = Board::start_pos();
        assert_eq!(game_phase(&full), 256);
        let bare = Board::from_fen("7k/8/8/8/8/8/8/7K w - - 0 1").unwrap();
        assert_eq!(game_phase(&bare), 0);
    }

    #[test]
    fn cache_serves_exact_hits() {
        let board = Board::start_pos();
        let cache = EvalTable::new(1);
        let params = SearchParams::default();
        let a = Evaluation::evaluate(&board, &cache, &params, -30000, 30000);
        let b = Evaluation::evaluate(&board, &cache, &params, -30000, 30000);
        assert_eq!(a, b);
        assert!(cache.probe(board.zobrist()).is_some());
    }
}
