//! Staged move ordering.
//!
//! The picker scores every generated move once and then yields them in
//! descending score order via partial selection sort, realizing the fixed
//! stage order: hash move, winning and equal captures by MVV/LVA, killer
//! one, killer two, losing captures by SEE, then quiet moves by history
//! score.

use morphy::board::see_value;
use morphy::core::score::Value;
use morphy::{Board, Move, MoveList, PieceType, ScoredMove};

use crate::tables::HistoryTable;

const HASH_SCORE: i32 = 1 << 30;
const GOOD_CAPTURE_BASE: i32 = 1 << 28;
const KILLER_ONE_SCORE: i32 = (1 << 27) + 1;
const KILLER_TWO_SCORE: i32 = 1 << 27;
const LOSING_CAPTURE_BASE: i32 = 1 << 24;
// Quiet moves score their raw history value, well below every other band.

/// Precomputed `[attacker][victim]` ordering values: capturing a more
/// valuable victim with a less valuable attacker always ranks higher.
#[inline]
pub fn mvv_lva(attacker: PieceType, victim: PieceType) -> i32 {
    see_value(victim) * 16 - see_value(attacker) / 64
}

/// Yields the moves of a list in heuristic order.
pub struct MovePicker {
    moves: Vec<ScoredMove>,
    yielded: usize,
}

impl MovePicker {
    /// Builds a picker over `list` for the main search.
    pub fn new(
        board: &Board,
        list: &MoveList,
        hash_move: Move,
        killers: [Move; 2],
        history: &HistoryTable,
    ) -> MovePicker {
        let mut moves = Vec::with_capacity(list.len());
        for mv in list.iter() {
            moves.push(ScoredMove::new_score(
                *mv,
                score_move(board, *mv, hash_move, killers, history),
            ));
        }
        MovePicker { moves, yielded: 0 }
    }

    /// Builds a picker ordering captures by MVV/LVA only, for quiescence.
    pub fn new_quiescence(list: &MoveList) -> MovePicker {
        let mut moves = Vec::with_capacity(list.len());
        for mv in list.iter() {
            let score = if mv.is_capture() {
                mvv_lva(mv.moved_piece().type_of(), mv.captured_piece().type_of())
            } else {
                0
            };
            moves.push(ScoredMove::new_score(*mv, score));
        }
        MovePicker { moves, yielded: 0 }
    }

    /// Number of moves in the underlying list.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Yields the best not-yet-returned move, if any.
    pub fn next(&mut self) -> Option<Move> {
        if self.yielded >= self.moves.len() {
            return None;
        }
        let mut best = self.yielded;
        for i in (self.yielded + 1)..self.moves.len() {
            if self.moves[i].score > self.moves[best].score {
                best = i;
            }
        }
        self.moves.swap(self.yielded, best);
        let mv = self.moves[self.yielded].mv;
        self.yielded += 1;
        Some(mv)
    }
}

fn score_move(
    board: &Board,
    mv: Move,
    hash_move: Move,
    killers: [Move; 2],
    history: &HistoryTable,
) -> Value {
    if mv == hash_move {
        return HASH_SCORE;
    }
    if mv.is_tactical() {
        let see = board.see(mv);
        return if see >= 0 {
            GOOD_CAPTURE_BASE
                + mvv_lva(mv.moved_piece().type_of(), mv.captured_piece().type_of())
        } else {
            LOSING_CAPTURE_BASE + see
        };
    }
    if mv == killers[0] {
        return KILLER_ONE_SCORE;
    }
    if mv == killers[1] {
        return KILLER_TWO_SCORE;
    }
    history.score(mv) as Value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_move_first() {
        let board = Board::start_pos();
        let list = board.generate_moves();
        let hash_move = list[7];
        let picker = &mut MovePicker::new(
            &board,
            &list,
            hash_move,
            [Move::null(); 2],
            &HistoryTable::new(),
        );
        assert_eq!(picker.next().unwrap(), hash_move);
    }

    #[test]
    fn winning_capture_before_killer_before_losing_capture() {
        // Qxg6 wins a clean pawn; Rxh5 runs into the g6 pawn and loses the
        // exchange. A quiet killer must land between the two.
        let board = Board::from_fen("6k1/8/6p1/3p3p/8/6Q1/8/4K2R w - - 0 1").unwrap();
        let list = board.generate_moves();
        let killer = list.iter().find(|m| m.is_quiet()).cloned().unwrap();

        let mut picker = MovePicker::new(
            &board,
            &list,
            Move::null(),
            [killer, Move::null()],
            &HistoryTable::new(),
        );

        let mut order = Vec::new();
        while let Some(mv) = picker.next() {
            order.push(mv);
        }
        let idx = |s: &str| order.iter().position(|m| m.stringify() == s).unwrap();
        let killer_idx = order.iter().position(|m| *m == killer).unwrap();

        assert!(idx("g3g6") < killer_idx, "winning capture after killer");
        assert!(killer_idx < idx("h1h5"), "losing capture before killer");
    }

    #[test]
    fn history_orders_quiets() {
        let board = Board::start_pos();
        let list = board.generate_moves();
        let favored = list.iter().find(|m| m.stringify() == "d2d4").cloned().unwrap();

        let mut history = HistoryTable::new();
        history.record_attempt(favored);
        history.record_success(favored, 1 << 10);

        let mut picker = MovePicker::new(&board, &list, Move::null(), [Move::null(); 2], &history);
        assert_eq!(picker.next().unwrap(), favored);
    }

    #[test]
    fn yields_every_move_once() {
        let board = Board::start_pos();
        let list = board.generate_moves();
        let mut picker = MovePicker::new(
            &board,
            &list,
            Move::null(),
            [Move::null(); 2],
            &HistoryTable::new(),
        );
        let mut count = 0;
        while picker.next().is_some() {
            count += 1;
        }
        assert_eq!(count, list.len());
    }
}
