extern crate morphy;
extern crate rand;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use morphy::board::Board;

// The incrementally maintained key must always equal the from-scratch key.
// `Board::is_okay` checks exactly that, so random walks + the assertion
// cover the incremental updates of every special move kind.
#[test]
fn zobrist_incremental_matches_scratch() {
    let mut rng = StdRng::seed_from_u64(0x00C0FFEE);
    for _game in 0..20 {
        let mut board = Board::start_pos();
        for _ply in 0..120 {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            board.apply_move(mv);
            assert!(board.is_okay(), "after {} in {}", mv, board.fen());
        }
    }
}

#[test]
fn transpositions_hash_equal() {
    // Different move orders into the same position produce the same key.
    let mut a = Board::start_pos();
    for mv in ["g1f3", "g8f6", "b1c3", "b8c6"] {
        assert!(a.apply_uci_move(mv));
    }
    let mut b = Board::start_pos();
    for mv in ["b1c3", "b8c6", "g1f3", "g8f6"] {
        assert!(b.apply_uci_move(mv));
    }
    assert_eq!(a.zobrist(), b.zobrist());
    assert_eq!(a.fen(), b.fen());
}

#[test]
fn hash_differs_by_side_castling_ep() {
    let w = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1").unwrap();
    assert_ne!(w.zobrist(), b.zobrist());

    let some = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
    assert_ne!(w.zobrist(), some.zobrist());

    let ep = Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2")
        .unwrap();
    let no_ep =
        Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2").unwrap();
    assert_ne!(ep.zobrist(), no_ep.zobrist());
}

#[test]
fn undo_restores_hash_through_special_moves() {
    let mut rng = StdRng::seed_from_u64(987_654_321);
    for fen in morphy::board::fen::ALL_FENS.iter() {
        let mut board = Board::from_fen(fen).unwrap();
        let mut keys = vec![board.zobrist()];
        let mut played = 0;
        for _ in 0..60 {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            board.apply_move(mv);
            keys.push(board.zobrist());
            played += 1;
        }
        for _ in 0..played {
            keys.pop();
            board.undo_move();
            assert_eq!(board.zobrist(), *keys.last().unwrap());
        }
    }
}
