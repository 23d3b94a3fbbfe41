//! FEN parsing and validation for the `Board`.
//!
//! Standard six-field FEN is accepted, as well as the four-field shorthand
//! that omits the half-move clock and full-move number (defaulted to 0
//! and 1).

use std::error::Error;
use std::fmt;
use std::num;
use std::sync::Arc;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::sq::{SQ, NO_SQ};
use crate::core::{Piece, PieceType, Player, Rank};

use super::board_state::BoardState;
use super::castle_rights::Castling;
use super::piece_locations::PieceLocations;
use super::Board;

/// Represents possible errors encountered while building a `Board` from a
/// FEN string.
#[derive(Debug)]
pub enum FenBuildError {
    NotEnoughSections { sections: usize },
    IncorrectRankAmounts { ranks: usize },
    UnrecognizedTurn { turn: String },
    EPSquareUnreadable { ep: String },
    EPSquareInvalid { ep: String },
    SquareSmallerRank { rank: usize, square: String },
    SquareLargerRank { rank: usize, square: String },
    UnrecognizedPiece { piece: char },
    UnrecognizedCastles { castles: String },
    UnreadableMoves(num::ParseIntError),
    IllegalNumKings { player: Player, num: u8 },
    OppositeCheck,
    PawnOnLastRow,
}

impl fmt::Display for FenBuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FenBuildError::NotEnoughSections { sections } => {
                write!(f, "invalid number of fen sections: {}, expected 4 or 6", sections)
            }
            FenBuildError::IncorrectRankAmounts { ranks } => {
                write!(f, "invalid number of ranks: {}, expected 8", ranks)
            }
            FenBuildError::UnrecognizedTurn { turn } => {
                write!(f, "invalid turn: {}, expected 'w' or 'b'", turn)
            }
            FenBuildError::EPSquareUnreadable { ep } => {
                write!(f, "unreadable En-passant square: {}", ep)
            }
            FenBuildError::EPSquareInvalid { ep } => {
                write!(f, "invalid En-passant square: {}", ep)
            }
            FenBuildError::SquareSmallerRank { rank, square } => {
                write!(f, "square number too small for rank {}: {}", rank, square)
            }
            FenBuildError::SquareLargerRank { rank, square } => {
                write!(f, "square number too large for rank {}: {}", rank, square)
            }
            FenBuildError::UnrecognizedPiece { piece } => {
                write!(f, "unrecognized piece: {}", piece)
            }
            FenBuildError::UnrecognizedCastles { castles } => {
                write!(f, "unrecognized castling rights: {}", castles)
            }
            FenBuildError::UnreadableMoves(err) => {
                write!(f, "unreadable move counters: {}", err)
            }
            FenBuildError::IllegalNumKings { player, num } => {
                write!(f, "{} has {} kings, expected exactly 1", player, num)
            }
            FenBuildError::OppositeCheck => {
                write!(f, "the side not to move is in check")
            }
            FenBuildError::PawnOnLastRow => write!(f, "pawn on the first or last row"),
        }
    }
}

impl Error for FenBuildError {}

impl From<num::ParseIntError> for FenBuildError {
    fn from(err: num::ParseIntError) -> FenBuildError {
        FenBuildError::UnreadableMoves(err)
    }
}

/// Parses a FEN string into a `Board`.
pub(crate) fn parse_fen(fen: &str) -> Result<Board, FenBuildError> {
    let sections: Vec<&str> = fen.split_whitespace().collect();
    if sections.len() != 4 && sections.len() != 6 {
        return Err(FenBuildError::NotEnoughSections {
            sections: sections.len(),
        });
    }

    // Piece placement, ranks listed top (rank 8) first.
    let ranks: Vec<&str> = sections[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenBuildError::IncorrectRankAmounts { ranks: ranks.len() });
    }

    let mut piece_locations = PieceLocations::blank();
    let mut piece_counts = [[0u8; PIECE_TYPE_CNT]; PLAYER_CNT];
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx; // rank 8 comes first
        let mut file: usize = 0;
        for c in rank_str.chars() {
            if let Some(digit) = c.to_digit(10) {
                file += digit as usize;
                if file > 8 {
                    return Err(FenBuildError::SquareLargerRank {
                        rank,
                        square: rank_str.to_string(),
                    });
                }
            } else {
                let piece = Piece::from_character(c)
                    .ok_or(FenBuildError::UnrecognizedPiece { piece: c })?;
                if file >= 8 {
                    return Err(FenBuildError::SquareLargerRank {
                        rank,
                        square: rank_str.to_string(),
                    });
                }
                let sq = SQ((rank * 8 + file) as u8);
                let player = piece.player_lossy();
                let pt = piece.type_of();
                if pt == PieceType::P && (rank == 0 || rank == 7) {
                    return Err(FenBuildError::PawnOnLastRow);
                }
                piece_locations.place(sq, player, pt);
                piece_counts[player as usize][pt as usize] += 1;
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenBuildError::SquareSmallerRank {
                rank,
                square: rank_str.to_string(),
            });
        }
    }

    // Side to move.
    let turn = match sections[1] {
        "w" => Player::White,
        "b" => Player::Black,
        _ => {
            return Err(FenBuildError::UnrecognizedTurn {
                turn: sections[1].to_string(),
            })
        }
    };

    // Castling rights.
    let mut castling = Castling::empty_set();
    for c in sections[2].chars() {
        if !castling.add_castling_char(c) {
            return Err(FenBuildError::UnrecognizedCastles {
                castles: sections[2].to_string(),
            });
        }
    }

    // En-passant square.
    let ep_sq = parse_ep_square(sections[3])?;

    // Move counters; a four-field FEN defaults them.
    let (rule_50, total_moves) = if sections.len() == 6 {
        let rule_50 = sections[4].parse::<i16>()?;
        let move_num = sections[5].parse::<u16>()?.max(1);
        let mut total = (move_num - 1) * 2;
        if turn == Player::Black {
            total += 1;
        }
        (rule_50, total)
    } else {
        (0, if turn == Player::Black { 1 } else { 0 })
    };

    let mut board = Board {
        turn,
        bbs: [[BitBoard(0); PIECE_TYPE_CNT]; PLAYER_CNT],
        occ: [BitBoard(0); PLAYER_CNT],
        occ_all: BitBoard(0),
        half_moves: total_moves,
        depth: 0,
        piece_counts,
        piece_locations,
        state: Arc::new(BoardState::blank()),
    };

    // Fill the bitboards from the mailbox.
    for sq in 0..SQ_CNT as u8 {
        let s = SQ(sq);
        let piece = board.piece_locations.piece_at(s);
        if piece != Piece::None {
            let player = piece.player_lossy();
            let bb = s.to_bb();
            board.bbs[player as usize][piece.type_of() as usize] |= bb;
            board.occ[player as usize] |= bb;
            board.occ_all |= bb;
        }
    }

    for player in &[Player::White, Player::Black] {
        let kings = board.count_piece(*player, PieceType::K);
        if kings != 1 {
            return Err(FenBuildError::IllegalNumKings {
                player: *player,
                num: kings,
            });
        }
    }

    // The side that just moved must not still be in check.
    let them = turn.other_player();
    if (board.attackers_to(board.king_sq(them), board.occupied())
        & board.get_occupied_player(turn))
    .is_not_empty()
    {
        return Err(FenBuildError::OppositeCheck);
    }

    let mut state = BoardState::blank();
    state.castling = castling;
    state.rule_50 = rule_50;
    state.ep_square = ep_sq;
    state.checkers_bb =
        board.attackers_to(board.king_sq(turn), board.occupied()) & board.get_occupied_player(them);
    board.set_check_info(&mut state);
    state.zobrist = board.compute_zobrist(&state);
    board.state = Arc::new(state);

    debug_assert!(board.is_okay());
    Ok(board)
}

fn parse_ep_square(ep: &str) -> Result<SQ, FenBuildError> {
    if ep == "-" {
        return Ok(NO_SQ);
    }
    let mut chars = ep.chars();
    let file_c = chars.next().ok_or(FenBuildError::EPSquareUnreadable {
        ep: ep.to_string(),
    })?;
    let rank_c = chars.next().ok_or(FenBuildError::EPSquareUnreadable {
        ep: ep.to_string(),
    })?;
    if chars.next().is_some() {
        return Err(FenBuildError::EPSquareUnreadable { ep: ep.to_string() });
    }
    let file = match file_c {
        'a'..='h' => file_c as u8 - b'a',
        _ => return Err(FenBuildError::EPSquareUnreadable { ep: ep.to_string() }),
    };
    let rank = match rank_c.to_digit(10) {
        Some(d @ 1..=8) => d as u8 - 1,
        _ => return Err(FenBuildError::EPSquareUnreadable { ep: ep.to_string() }),
    };
    let sq = SQ(rank * 8 + file);
    if sq.rank() != Rank::R3 && sq.rank() != Rank::R6 {
        return Err(FenBuildError::EPSquareInvalid { ep: ep.to_string() });
    }
    Ok(sq)
}

/// A list of FEN strings covering a variety of positions, for testing.
pub static ALL_FENS: [&str; 6] = [
    super::START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_roundtrip() {
        for fen in ALL_FENS.iter() {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(&board.fen(), fen, "roundtrip failed for {}", fen);
        }
    }

    #[test]
    fn four_field_fen() {
        let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - -").unwrap();
        assert_eq!(board.rule_50(), 0);
        assert_eq!(board.moves_played(), 1);
        assert_eq!(board.turn(), Player::Black);
    }

    #[test]
    fn bad_fens_rejected() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("what is this").is_err());
        // Seven ranks.
        assert!(Board::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        // No kings.
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
        // Two white kings.
        assert!(Board::from_fen("K6k/8/8/8/8/8/8/K7 w - - 0 1").is_err());
        // Pawn on the last row.
        assert!(Board::from_fen("P3k3/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
        // Side not to move in check.
        assert!(Board::from_fen("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1").is_ok());
        assert!(Board::from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1").is_err());
        // Invalid ep square.
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - e4 0 1").is_err());
    }
}
