//! Module for the `Castling` structure, which tracks the castling rights
//! still available to each player.
//!
//! At its core a `Castling` is a u8 with one bit per possible right. It marks
//! that castling remains a possibility, not that it is legal right now.

use crate::core::masks::*;
use crate::core::sq::SQ;
use crate::core::{CastleType, Player};
use std::fmt;

const ALL_CASTLING: u8 = 0b0000_1111;

bitflags! {
    /// Set of castling rights available to the two players.
    ///
    /// For internal use by the [`Board`] only.
    ///
    /// [`Board`]: ../struct.Board.html
    pub struct Castling: u8 {
        const WHITE_K      = C_WHITE_K_MASK;
        const WHITE_Q      = C_WHITE_Q_MASK;
        const BLACK_K      = C_BLACK_K_MASK;
        const BLACK_Q      = C_BLACK_Q_MASK;
        const WHITE_ALL    = Self::WHITE_K.bits | Self::WHITE_Q.bits;
        const BLACK_ALL    = Self::BLACK_K.bits | Self::BLACK_Q.bits;
    }
}

impl Castling {
    #[doc(hidden)]
    #[inline]
    pub const fn all_castling() -> Self {
        Castling { bits: ALL_CASTLING }
    }

    #[doc(hidden)]
    #[inline]
    pub const fn empty_set() -> Self {
        Castling { bits: 0 }
    }

    /// Removes all castling possibility for a single player.
    #[inline]
    pub fn remove_player_castling(&mut self, player: Player) {
        match player {
            Player::White => self.bits &= Self::BLACK_ALL.bits,
            Player::Black => self.bits &= Self::WHITE_ALL.bits,
        }
    }

    /// Returns if a player can castle on a given side.
    #[inline]
    pub fn castle_rights(self, player: Player, side: CastleType) -> bool {
        match player {
            Player::White => match side {
                CastleType::KingSide => self.contains(Self::WHITE_K),
                CastleType::QueenSide => self.contains(Self::WHITE_Q),
            },
            Player::Black => match side {
                CastleType::KingSide => self.contains(Self::BLACK_K),
                CastleType::QueenSide => self.contains(Self::BLACK_Q),
            },
        }
    }

    /// Returns if a player has any castling rights left.
    #[inline]
    pub fn player_can_castle(self, player: Player) -> bool {
        self.bits & (Castling::WHITE_ALL.bits >> (2 * player as u16)) != 0
    }

    /// Returns if both players have lost their ability to castle.
    #[inline]
    pub fn no_castling(self) -> bool {
        self.bits == 0
    }

    /// Clears the rights associated with the two squares a move touched.
    /// Returns the rights that were removed.
    #[inline]
    pub fn update_castling(&mut self, to: SQ, from: SQ) -> u8 {
        let mask_change: u8 = to.castle_rights_mask() | from.castle_rights_mask();
        let removed: u8 = self.bits & mask_change;
        self.bits &= !mask_change;
        removed
    }

    /// Adds the right to castle based on a FEN char.
    ///
    /// Returns false for an unrecognized character.
    pub fn add_castling_char(&mut self, c: char) -> bool {
        self.bits |= match c {
            'K' => Castling::WHITE_K.bits,
            'Q' => Castling::WHITE_Q.bits,
            'k' => Castling::BLACK_K.bits,
            'q' => Castling::BLACK_Q.bits,
            '-' => 0,
            _ => return false,
        };
        true
    }

    /// Returns the FEN string of the castling state: `KQkq` subsets, or `-`.
    pub fn pretty_string(self) -> String {
        if self.no_castling() {
            "-".to_owned()
        } else {
            let mut s = String::default();
            if self.contains(Castling::WHITE_K) {
                s.push('K');
            }
            if self.contains(Castling::WHITE_Q) {
                s.push('Q');
            }
            if self.contains(Castling::BLACK_K) {
                s.push('k');
            }
            if self.contains(Castling::BLACK_Q) {
                s.push('q');
            }
            s
        }
    }
}

impl fmt::Display for Castling {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_on_rook_move() {
        let mut c = Castling::all_castling();
        let removed = c.update_castling(SQ::A3, SQ::A1);
        assert_eq!(removed, C_WHITE_Q_MASK);
        assert!(!c.castle_rights(Player::White, CastleType::QueenSide));
        assert!(c.castle_rights(Player::White, CastleType::KingSide));
        assert!(c.player_can_castle(Player::Black));
    }

    #[test]
    fn update_on_king_move() {
        let mut c = Castling::all_castling();
        c.update_castling(SQ::E2, SQ::E1);
        assert!(!c.player_can_castle(Player::White));
        assert!(c.player_can_castle(Player::Black));
        assert_eq!(c.pretty_string(), "kq");
    }
}
