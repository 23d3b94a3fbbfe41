//! The history table: per-(piece, to-square) counters of how often a quiet
//! move caused a cutoff (`succ`) versus how often it was tried (`attempt`).
//! The relative score orders quiet moves that have no other claim to fame.

use morphy::core::masks::{PIECE_CNT, SQ_CNT};
use morphy::Move;

/// Scale applied to the success/attempt ratio to give scores some spread.
const SCORE_SCALE: u32 = 1 << 10;

/// Success and attempt counters indexed `[piece][to-square]`.
pub struct HistoryTable {
    succ: [[u32; SQ_CNT]; PIECE_CNT],
    attempt: [[u32; SQ_CNT]; PIECE_CNT],
}

impl Default for HistoryTable {
    fn default() -> Self {
        HistoryTable::new()
    }
}

impl HistoryTable {
    pub fn new() -> HistoryTable {
        HistoryTable {
            succ: [[0; SQ_CNT]; PIECE_CNT],
            attempt: [[0; SQ_CNT]; PIECE_CNT],
        }
    }

    /// Records that a quiet move was tried.
    #[inline]
    pub fn record_attempt(&mut self, mv: Move) {
        let (p, s) = index(mv);
        self.attempt[p][s] = self.attempt[p][s].saturating_add(1);
    }

    /// Records that a quiet move caused a beta cutoff.
    #[inline]
    pub fn record_success(&mut self, mv: Move, bonus: u32) {
        let (p, s) = index(mv);
        self.succ[p][s] = self.succ[p][s].saturating_add(bonus);
    }

    /// Takes back part of a previous attempt's optimism; used when a move is
    /// futility-pruned away.
    #[inline]
    pub fn record_failure(&mut self, mv: Move) {
        let (p, s) = index(mv);
        self.succ[p][s] = self.succ[p][s].saturating_sub(1);
    }

    /// Relative history score of a quiet move: successes per attempt.
    #[inline]
    pub fn score(&self, mv: Move) -> u32 {
        let (p, s) = index(mv);
        let attempts = self.attempt[p][s].max(1);
        ((self.succ[p][s] as u64 * SCORE_SCALE as u64) / attempts as u64) as u32
    }

    /// Divides every counter down, so stale plans fade without being
    /// forgotten outright.
    pub fn decay(&mut self, shift: u32) {
        for piece in 0..PIECE_CNT {
            for sq in 0..SQ_CNT {
                self.succ[piece][sq] >>= shift;
                self.attempt[piece][sq] >>= shift;
            }
        }
    }

    /// Forgets everything; called when a new game starts.
    pub fn clear(&mut self) {
        self.succ = [[0; SQ_CNT]; PIECE_CNT];
        self.attempt = [[0; SQ_CNT]; PIECE_CNT];
    }
}

#[inline(always)]
fn index(mv: Move) -> (usize, usize) {
    (mv.moved_piece() as usize, mv.get_dest().0 as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphy::core::piece_move::MoveKind;
    use morphy::{Piece, SQ};

    fn quiet(dst: SQ) -> Move {
        Move::new(SQ::B1, dst, Piece::WhiteKnight, Piece::None, MoveKind::Normal)
    }

    #[test]
    fn success_ratio_orders_moves() {
        let mut ht = HistoryTable::new();
        let good = quiet(SQ::C3);
        let bad = quiet(SQ::A3);

        for _ in 0..10 {
            ht.record_attempt(good);
            ht.record_attempt(bad);
        }
        ht.record_success(good, 128);

        assert!(ht.score(good) > ht.score(bad));
    }

    #[test]
    fn decay_halves() {
        let mut ht = HistoryTable::new();
        let mv = quiet(SQ::C3);
        ht.record_attempt(mv);
        ht.record_success(mv, 64);
        let before = ht.score(mv);
        ht.decay(1);
        assert!(ht.score(mv) <= before);
    }
}
