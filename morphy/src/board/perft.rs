//! Perft, or Performance Testing, is a way of counting the number of leaf
//! nodes reachable from a position at a fixed depth. It is used to verify
//! both move-generation soundness (no illegal moves) and completeness (no
//! missing moves) against published node counts.

use super::Board;

/// Returns the number of leaf nodes from a given depth.
pub fn perft(board: &Board, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut board = board.shallow_clone();
    inner_perft(&mut board, depth)
}

/// Returns the number of leaf nodes from a given depth, printing each root
/// move and its subtree count along the way.
pub fn perft_divide(board: &Board, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut board = board.shallow_clone();
    let moves = board.generate_moves();
    let mut total: u64 = 0;
    for mv in moves.iter() {
        board.apply_move(*mv);
        let count = if depth == 1 {
            1
        } else {
            inner_perft(&mut board, depth - 1)
        };
        board.undo_move();
        println!("{}: {}", mv, count);
        total += count;
    }
    println!("total: {}", total);
    total
}

fn inner_perft(board: &mut Board, depth: u16) -> u64 {
    let moves = board.generate_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut count: u64 = 0;
    for mv in moves.iter() {
        board.apply_move(*mv);
        count += inner_perft(board, depth - 1);
        board.undo_move();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deeper perft runs live in tests/move_generating.rs; these shallow ones
    // keep the unit suite quick.
    #[test]
    fn perft_start_shallow() {
        let board = Board::start_pos();
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
        assert_eq!(perft(&board, 3), 8902);
    }

    #[test]
    fn perft_kiwipete_shallow() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(perft(&board, 1), 48);
        assert_eq!(perft(&board, 2), 2039);
    }
}
