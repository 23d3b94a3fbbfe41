//! Root move bookkeeping.
//!
//! The moves at the root are fixed for the whole search; what changes is the
//! order each thread visits them in and the per-move subtree node counts,
//! which are shared atomic counters. Helpers serialize root transposition
//! stores and search-information updates on the single root lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crossbeam_utils::CachePadded;

use morphy::core::score::{Value, NEG_INFINITE};
use morphy::{Move, MoveList};

/// A root move as tracked locally by one search thread.
#[derive(Copy, Clone, Debug)]
pub struct RootMove {
    pub mv: Move,
    /// Index into the shared node counters.
    pub idx: usize,
    /// Score of the current iteration.
    pub score: Value,
    /// Score of the previous completed iteration.
    pub prev_score: Value,
}

impl RootMove {
    pub fn new(mv: Move, idx: usize) -> RootMove {
        RootMove {
            mv,
            idx,
            score: NEG_INFINITE,
            prev_score: NEG_INFINITE,
        }
    }

    /// Rolls the iteration score into the previous-score slot.
    #[inline]
    pub fn rollback(&mut self) {
        self.prev_score = self.score;
        self.score = NEG_INFINITE;
    }
}

/// The shared, cross-thread part of the root move list.
pub struct SharedRootMoves {
    moves: Vec<Move>,
    /// Padded so threads hammering neighboring counters don't false-share.
    nodes: Box<[CachePadded<AtomicU64>]>,
    /// Serializes root TT inserts and search-information updates.
    pub lock: Mutex<()>,
}

impl SharedRootMoves {
    pub fn new(list: &MoveList) -> SharedRootMoves {
        let moves: Vec<Move> = list.iter().cloned().collect();
        let nodes: Vec<CachePadded<AtomicU64>> = (0..moves.len())
            .map(|_| CachePadded::new(AtomicU64::new(0)))
            .collect();
        SharedRootMoves {
            moves,
            nodes: nodes.into_boxed_slice(),
            lock: Mutex::new(()),
        }
    }

    /// The fixed legal moves of the root position.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Adds `nodes` to the cumulative subtree count of root move `idx`.
    #[inline]
    pub fn add_nodes(&self, idx: usize, nodes: u64) {
        self.nodes[idx].fetch_add(nodes, Ordering::Relaxed);
    }

    /// Cumulative subtree nodes of root move `idx` over all iterations.
    #[inline]
    pub fn nodes_of(&self, idx: usize) -> u64 {
        self.nodes[idx].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphy::Board;

    #[test]
    fn node_counters_accumulate() {
        let board = Board::start_pos();
        let shared = SharedRootMoves::new(&board.generate_moves());
        assert_eq!(shared.len(), 20);
        shared.add_nodes(3, 100);
        shared.add_nodes(3, 50);
        assert_eq!(shared.nodes_of(3), 150);
        assert_eq!(shared.nodes_of(4), 0);
    }

    #[test]
    fn rollback_shifts_scores() {
        let board = Board::start_pos();
        let mv = board.generate_moves()[0];
        let mut rm = RootMove::new(mv, 0);
        rm.score = 42;
        rm.rollback();
        assert_eq!(rm.prev_score, 42);
        assert_eq!(rm.score, NEG_INFINITE);
    }
}
