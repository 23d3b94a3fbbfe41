//! The frozen search-parameter record.
//!
//! Every margin, weight and reduction the search and evaluator consume lives
//! here. A `SearchParams` is built once, shared read-only by every search
//! thread, and never changes for the duration of a search.

use crate::consts::FULL_PLY;
use morphy::core::score::Value;

/// Tunable parameters of the search and evaluation, frozen per search.
#[derive(Clone, Debug)]
pub struct SearchParams {
    // ---- extensions, in fractional plies (FULL_PLY units) ----
    /// Extension when the side to move is in check.
    pub check_extension: i32,
    /// Extension when the previous move pushed a pawn to the seventh or
    /// eighth relative rank.
    pub pawn_push_extension: i32,
    /// Extension when a move recaptures on the square the previous move
    /// captured on.
    pub recapture_extension: i32,
    /// Extension when the position has exactly one legal reply.
    pub single_reply_extension: i32,

    // ---- null move ----
    /// Depth reduction of the null-move search, in plies.
    pub null_move_reduction: i32,
    /// Minimum remaining depth (plies) to try a null move at all.
    pub null_move_min_depth: i32,

    // ---- late move reduction ----
    /// Base reduction in fractional plies.
    pub late_move_reduction: i32,
    /// Extra reduction added proportionally to remaining depth.
    pub extra_late_move_reduction: i32,
    /// Remaining-depth cap for the proportional extra reduction.
    pub extra_late_move_reduction_depth_limit: i32,
    /// Number of moves searched at full depth before reductions kick in.
    pub min_moves_searched_for_lmr: usize,

    // ---- forward pruning ----
    /// Futility margin per remaining ply.
    pub futility_margin_per_ply: Value,
    /// Maximum remaining depth (plies) for futility pruning.
    pub futility_max_depth: i32,
    /// Reverse-futility margin per remaining ply.
    pub reverse_futility_margin_per_ply: Value,
    /// Maximum remaining depth (plies) for reverse futility pruning.
    pub reverse_futility_max_depth: i32,
    /// Razoring margin.
    pub razoring_margin: Value,
    /// Maximum remaining depth (plies) for razoring.
    pub razoring_max_depth: i32,
    /// Quiescence delta-pruning margin.
    pub delta_pruning_margin: Value,

    // ---- internal iterative deepening ----
    /// Minimum remaining depth (plies) to run IID at a PV node without a
    /// hash move.
    pub iid_min_depth: i32,
    /// Depth reduction of the IID pre-search, in plies.
    pub iid_reduction: i32,

    // ---- parallel search ----
    /// Minimum remaining depth (plies) at which nodes check and set the
    /// transposition-table busy bit.
    pub node_business_check_min_depth_left: i32,

    // ---- aspiration windows ----
    /// Initial half-width of the aspiration window.
    pub aspiration_delta: Value,

    // ---- move ordering ----
    /// History bonus added to the success counter on a quiet cutoff.
    pub history_success_bonus: u32,
    /// Right-shift applied when the history tables are periodically decayed.
    pub history_decay_shift: u32,

    // ---- time management ----
    /// Fraction of the remaining clock considered spendable, in permill.
    pub time_fraction_permill: i64,
    /// Bounds of the assumed number of moves still to play; interpolated by
    /// game phase when the GUI does not supply `movestogo`.
    pub min_moves_to_go: i64,
    pub max_moves_to_go: i64,
    /// Factor on the base budget the search may stretch to when the last
    /// iteration ended on a fail-high or fail-low.
    pub max_time_factor: i64,

    // ---- hash budget ----
    /// The transposition table receives `trans_table_share/16` of the hash
    /// budget, the evaluation cache the rest.
    pub trans_table_share: usize,

    // ---- evaluation ----
    /// Margin around the search window inside which a cached evaluation is
    /// considered exact.
    pub lazy_eval_margin: Value,
    /// Bonus for the side to move.
    pub tempo: Value,
    /// Bonus for holding two bishops on opposite square colors.
    pub bishop_pair: Value,
    /// Score returned for dead-drawn material configurations.
    pub insufficient_material_score: Value,
    /// Piece material, middle game and end game. The pawn value tapers.
    pub piece_value_mg: [Value; 7],
    pub piece_value_eg: [Value; 7],
    /// Penalty for a pawn whose stop square is blocked, by stride distance.
    pub blocked_pawn_penalty: [Value; 3],
    /// Bonus for a passed pawn.
    pub passed_pawn_bonus: Value,
    /// Penalty for a backward pawn on a half-open file.
    pub open_backward_pawn_penalty: Value,
    /// Penalty for a pawn stopped by a non-pawn enemy piece.
    pub stopped_pawn_penalty: Value,
    /// King-to-pawn Manhattan-distance weights: friendly king to own
    /// normal/backward/passed pawns, and to the opponent's.
    pub friendly_king_tropism: [Value; 3],
    pub opponent_king_tropism: [Value; 3],
    /// Pinned-piece penalty per piece type (indexed by `PieceType`).
    pub pinned_piece_penalty: [Value; 7],
    /// Mobility weight per piece type (indexed by `PieceType`).
    pub mobility_weight: [Value; 7],
    /// Weight of the averaged queen-to-enemy-king Chebyshev distance.
    pub queen_king_tropism: Value,
    /// Bonuses of the immediate-capture ladder, most valuable difference
    /// first: Q-P, Q-N, Q-B, Q-R, R-P, B-P, R-N, N-P, B-N, R-B.
    pub immediate_capture_divisor: Value,
}

impl Default for SearchParams {
    fn default() -> SearchParams {
        SearchParams {
            check_extension: FULL_PLY,
            pawn_push_extension: FULL_PLY / 2,
            recapture_extension: FULL_PLY / 2,
            single_reply_extension: 6,

            null_move_reduction: 3,
            null_move_min_depth: 2,

            late_move_reduction: FULL_PLY,
            extra_late_move_reduction: FULL_PLY,
            extra_late_move_reduction_depth_limit: 16,
            min_moves_searched_for_lmr: 4,

            futility_margin_per_ply: 130,
            futility_max_depth: 4,
            reverse_futility_margin_per_ply: 110,
            reverse_futility_max_depth: 5,
            razoring_margin: 320,
            razoring_max_depth: 2,
            delta_pruning_margin: 200,

            iid_min_depth: 5,
            iid_reduction: 2,

            node_business_check_min_depth_left: 6,

            aspiration_delta: 24,

            history_success_bonus: 1 << 7,
            history_decay_shift: 2,

            time_fraction_permill: 950,
            min_moves_to_go: 12,
            max_moves_to_go: 42,
            max_time_factor: 5,

            trans_table_share: 15,

            lazy_eval_margin: 160,
            tempo: 12,
            bishop_pair: 32,
            insufficient_material_score: 0,
            piece_value_mg: [0, 92, 325, 335, 500, 975, 0],
            piece_value_eg: [0, 120, 325, 335, 500, 975, 0],
            blocked_pawn_penalty: [12, 6, 3],
            passed_pawn_bonus: 28,
            open_backward_pawn_penalty: 14,
            stopped_pawn_penalty: 8,
            friendly_king_tropism: [2, 3, 5],
            opponent_king_tropism: [1, 2, 4],
            pinned_piece_penalty: [0, 4, 10, 10, 14, 20, 0],
            mobility_weight: [0, 0, 3, 3, 2, 1, 0],
            queen_king_tropism: 4,
            immediate_capture_divisor: 12,
        }
    }
}

impl SearchParams {
    /// Futility margin for `plies` of remaining depth.
    #[inline]
    pub fn futility_margin(&self, plies: i32) -> Value {
        self.futility_margin_per_ply * plies.max(1)
    }

    /// Reverse-futility margin for `plies` of remaining depth. A function of
    /// the remaining depth only.
    #[inline]
    pub fn reverse_futility_margin(&self, plies: i32) -> Value {
        self.reverse_futility_margin_per_ply * plies.max(1)
    }

    /// Tapered pawn/piece value for a game phase in `0..=256`.
    #[inline]
    pub fn piece_value(&self, pt: morphy::PieceType, phase: i32) -> Value {
        let idx = pt as usize;
        (self.piece_value_mg[idx] * phase + self.piece_value_eg[idx] * (256 - phase)) / 256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margins_scale_with_depth() {
        let p = SearchParams::default();
        assert!(p.futility_margin(2) > p.futility_margin(1));
        assert_eq!(p.reverse_futility_margin(3), p.reverse_futility_margin_per_ply * 3);
    }

    #[test]
    fn pawn_value_tapers() {
        let p = SearchParams::default();
        assert_eq!(p.piece_value(morphy::PieceType::P, 256), p.piece_value_mg[1]);
        assert_eq!(p.piece_value(morphy::PieceType::P, 0), p.piece_value_eg[1]);
        // Non-pawn values are flat across phases.
        assert_eq!(
            p.piece_value(morphy::PieceType::R, 256),
            p.piece_value(morphy::PieceType::R, 0)
        );
    }
}
