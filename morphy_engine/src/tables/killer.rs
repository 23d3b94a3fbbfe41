//! The killer table: per distance-from-root, the two most recent quiet moves
//! that caused a beta cutoff. Slot one is always the newer of the two.

use crate::consts::MAX_PLY;
use morphy::Move;

/// Two killer slots for every ply distance from the root.
pub struct KillerTable {
    killers: [[Move; 2]; MAX_PLY as usize + 1],
}

impl Default for KillerTable {
    fn default() -> Self {
        KillerTable::new()
    }
}

impl KillerTable {
    pub fn new() -> KillerTable {
        KillerTable {
            killers: [[Move::null(); 2]; MAX_PLY as usize + 1],
        }
    }

    /// Records a quiet cutoff move at the given ply, demoting the current
    /// slot-one killer unless the move already holds it.
    #[inline]
    pub fn store(&mut self, ply: u16, mv: Move) {
        debug_assert!(!mv.is_null());
        let slots = &mut self.killers[ply as usize];
        if slots[0] != mv {
            slots[1] = slots[0];
            slots[0] = mv;
        }
    }

    /// Returns the two killers of the given ply, newest first.
    #[inline]
    pub fn get(&self, ply: u16) -> [Move; 2] {
        self.killers[ply as usize]
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.killers = [[Move::null(); 2]; MAX_PLY as usize + 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphy::core::piece_move::MoveKind;
    use morphy::{Piece, SQ};

    fn quiet(src: SQ, dst: SQ) -> Move {
        Move::new(src, dst, Piece::WhiteKnight, Piece::None, MoveKind::Normal)
    }

    #[test]
    fn insertion_demotes() {
        let mut kt = KillerTable::new();
        let a = quiet(SQ::B1, SQ::C3);
        let b = quiet(SQ::G1, SQ::F3);

        kt.store(3, a);
        assert_eq!(kt.get(3), [a, Move::null()]);

        kt.store(3, b);
        assert_eq!(kt.get(3), [b, a]);

        // Re-storing the slot-one move must not duplicate it.
        kt.store(3, b);
        assert_eq!(kt.get(3), [b, a]);

        // Other plies are untouched.
        assert_eq!(kt.get(4), [Move::null(); 2]);
    }
}
