extern crate morphy;

use morphy::board::Board;
use morphy::core::*;

#[test]
fn test_init_counts() {
    let board = Board::start_pos();
    assert_eq!(board.count_piece(Player::White, PieceType::P), 8);
    assert_eq!(board.count_piece(Player::White, PieceType::N), 2);
    assert_eq!(board.count_piece(Player::White, PieceType::B), 2);
    assert_eq!(board.count_piece(Player::White, PieceType::R), 2);
    assert_eq!(board.count_piece(Player::White, PieceType::K), 1);
    assert_eq!(board.count_piece(Player::White, PieceType::Q), 1);
    assert_eq!(board.count_piece(Player::Black, PieceType::P), 8);
    assert_eq!(board.count_piece(Player::Black, PieceType::N), 2);
    assert_eq!(board.count_piece(Player::Black, PieceType::B), 2);
    assert_eq!(board.count_piece(Player::Black, PieceType::R), 2);
    assert_eq!(board.count_piece(Player::Black, PieceType::K), 1);
    assert_eq!(board.count_piece(Player::Black, PieceType::Q), 1);
    assert_eq!(
        board.count_pieces_player(Player::White),
        board.count_pieces_player(Player::Black)
    );
    assert_eq!(board.occupied().0, 0xFFFF00000000FFFF);
    assert_eq!(board.count_all_pieces(), 32);
}

#[test]
fn basic_move_apply_undo() {
    let mut b = Board::start_pos();
    let fen_before = b.fen();
    let zob_before = b.zobrist();

    assert!(b.apply_uci_move("e2e4"));
    assert_eq!(b.moves_played(), 1);
    assert_eq!(b.turn(), Player::Black);
    assert_ne!(b.zobrist(), zob_before);

    assert!(b.apply_uci_move("e7e5"));
    assert!(b.apply_uci_move("g1f3"));
    assert_eq!(b.moves_played(), 3);

    b.undo_move();
    b.undo_move();
    b.undo_move();
    assert_eq!(b.moves_played(), 0);
    assert_eq!(b.fen(), fen_before);
    assert_eq!(b.zobrist(), zob_before);
}

#[test]
fn make_unmake_roundtrip_every_move() {
    // For every legal move of a set of positions, unmake(make(p, m)) == p
    // as full state: fen, hash, rights, clocks.
    for fen in morphy::board::fen::ALL_FENS.iter() {
        let mut board = Board::from_fen(fen).unwrap();
        let moves = board.generate_moves();
        let fen_before = board.fen();
        let zob_before = board.zobrist();
        let ply_before = board.ply();
        for mv in moves.iter() {
            board.apply_move(*mv);
            assert_eq!(board.ply(), ply_before + 1);
            board.undo_move();
            assert_eq!(board.fen(), fen_before, "move {} on {}", mv, fen);
            assert_eq!(board.zobrist(), zob_before, "move {} on {}", mv, fen);
            assert_eq!(board.ply(), ply_before);
        }
    }
}

#[test]
fn null_move_roundtrip() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let fen = board.fen();
    let zob = board.zobrist();
    unsafe {
        board.apply_null_move();
        assert_eq!(board.turn(), Player::Black);
        assert_ne!(board.zobrist(), zob);
        board.undo_null_move();
    }
    assert_eq!(board.fen(), fen);
    assert_eq!(board.zobrist(), zob);
}

#[test]
fn ep_square_set_and_cleared() {
    let mut board = Board::start_pos();
    board.apply_uci_move("e2e4");
    assert_eq!(board.ep_square().to_string(), "e3");
    board.apply_uci_move("g8f6");
    assert!(!board.ep_square().is_okay());
}

#[test]
fn promotion_apply_undo() {
    let mut board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let before = board.fen();
    assert!(board.apply_uci_move("a7a8q"));
    assert_eq!(board.count_piece(Player::White, PieceType::Q), 1);
    assert_eq!(board.count_piece(Player::White, PieceType::P), 0);
    board.undo_move();
    assert_eq!(board.fen(), before);
}

#[test]
fn castle_apply_undo() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let before = board.fen();
    assert!(board.apply_uci_move("e1g1"));
    assert_eq!(board.piece_at_sq(morphy::SQ::F1).type_of(), PieceType::R);
    assert_eq!(board.king_sq(Player::White).to_string(), "g1");
    board.undo_move();
    assert_eq!(board.fen(), before);

    assert!(board.apply_uci_move("e1c1"));
    assert_eq!(board.king_sq(Player::White).to_string(), "c1");
    board.undo_move();
    assert_eq!(board.fen(), before);
}

#[test]
fn fifty_move_and_repetition() {
    let mut board = Board::start_pos();
    // Shuffle knights: after the fourth shuffle the start position has
    // repeated twice.
    for mv in [
        "b1c3", "b8c6", "c3b1", "c6b8", "b1c3", "b8c6", "c3b1", "c6b8",
    ] {
        assert!(board.apply_uci_move(mv));
    }
    assert!(board.repeated(0));

    let board = Board::from_fen("7k/8/8/8/8/8/8/R6K w - - 100 80").unwrap();
    assert!(board.fifty_move_rule());
}

#[test]
fn insufficient_material_cases() {
    assert!(Board::from_fen("7k/8/8/8/8/8/8/7K w - - 0 1")
        .unwrap()
        .insufficient_material());
    assert!(Board::from_fen("7k/8/8/8/8/8/8/6NK w - - 0 1")
        .unwrap()
        .insufficient_material());
    // Bishops all on the same color.
    assert!(Board::from_fen("6bk/8/8/8/8/8/8/2B4K w - - 0 1")
        .unwrap()
        .insufficient_material());
    // Opposite-colored bishops can mate in theory.
    assert!(!Board::from_fen("5b1k/8/8/8/8/8/8/2B4K w - - 0 1")
        .unwrap()
        .insufficient_material());
    assert!(!Board::start_pos().insufficient_material());
}

#[test]
fn stalemate_and_checkmate() {
    let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(board.generate_moves().len(), 0);
    assert!(board.stalemate());
    assert!(!board.checkmate());

    let board = Board::from_fen("R6k/5ppp/8/8/8/8/8/7K b - - 0 1").unwrap();
    assert!(board.checkmate());
}
