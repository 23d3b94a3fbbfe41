extern crate morphy;

use morphy::board::{see_value, Board};
use morphy::core::PieceType;

fn see_of(fen: &str, mv_str: &str) -> i32 {
    let board = Board::from_fen(fen).unwrap();
    let mv = board
        .generate_moves()
        .iter()
        .find(|m| m.stringify() == mv_str)
        .cloned()
        .unwrap_or_else(|| panic!("move {} not found in {}", mv_str, fen));
    board.see(mv)
}

#[test]
fn see_free_pawn_capture() {
    // White pawns on d5 and f3 against a lone black pawn on e4: capturing
    // it wins a clean pawn, no black recapture is available.
    let v = see_of("4k3/8/8/3P4/4p3/5P2/8/4K3 w - - 0 1", "f3e4");
    assert_eq!(v, see_value(PieceType::P));
}

#[test]
fn see_defended_pawn() {
    // Pawn e4 is defended by a pawn on d5; QxP loses the queen for a pawn.
    let v = see_of("4k3/8/8/3p4/4p3/8/8/4K2Q w - - 0 1", "h1e4");
    assert_eq!(v, see_value(PieceType::P) - see_value(PieceType::Q));
}

#[test]
fn see_exchange_sequence() {
    // NxP with the pawn defended by a knight: pawn gained, knight lost,
    // knight regained. Net: pawn.
    let v = see_of("4k3/2n5/8/3p4/8/4N3/8/4K3 w - - 0 1", "e3d5");
    assert_eq!(
        v,
        see_value(PieceType::P) - see_value(PieceType::N) + see_value(PieceType::N)
    );
}

#[test]
fn see_rook_behind_rook() {
    // Doubled white rooks on the e-file against an e5 pawn defended by the
    // e8 rook: RxP, RxR, RxR nets exactly the pawn, through the x-ray.
    let v = see_of("4r1k1/8/8/4p3/8/8/4R3/4R1K1 w - - 0 1", "e2e5");
    assert_eq!(v, see_value(PieceType::P));
}

#[test]
fn see_losing_capture_negative() {
    // RxP where the pawn is defended by another pawn.
    let v = see_of("4k3/8/3p4/4p3/8/8/8/4RK2 w - - 0 1", "e1e5");
    assert!(v < 0);
}

#[test]
fn see_quiet_move_zero() {
    let board = Board::start_pos();
    let mv = board
        .generate_moves()
        .iter()
        .find(|m| m.stringify() == "e2e4")
        .cloned()
        .unwrap();
    assert_eq!(board.see(mv), 0);
}

#[test]
fn gives_check_detection() {
    // Qd1-h5 does not give check; with a pawn off f7 it would.
    let board = Board::from_fen("rnbqkbnr/ppppp1pp/8/5p2/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
        .unwrap();
    let mv = board
        .generate_moves()
        .iter()
        .find(|m| m.stringify() == "d1h5")
        .cloned()
        .unwrap();
    assert!(board.gives_check(mv));

    let board = Board::start_pos();
    for mv in board.generate_moves().iter() {
        assert!(!board.gives_check(*mv), "{} cannot check", mv);
    }
}

#[test]
fn gives_check_matches_reality() {
    // gives_check agrees with in_check after applying, across varied
    // positions.
    for fen in morphy::board::fen::ALL_FENS.iter() {
        let mut board = Board::from_fen(fen).unwrap();
        let moves = board.generate_moves();
        for mv in moves.iter() {
            let predicted = board.gives_check(*mv);
            board.apply_move(*mv);
            assert_eq!(
                predicted,
                board.in_check(),
                "gives_check mismatch on {} in {}",
                mv,
                fen
            );
            board.undo_move();
        }
    }
}

#[test]
fn pinned_pieces_detected() {
    // The e8 rook pins the e4 knight against the e1 king.
    let board = Board::from_fen("4r1k1/8/8/8/4N3/8/8/4K3 w - - 0 1").unwrap();
    let pinned = board.pinned_pieces(morphy::Player::White);
    assert!((pinned & morphy::SQ::E4.to_bb()).is_not_empty());

    // The knight may not leave the file; sliding along it is impossible for
    // a knight, so every knight move is illegal.
    let moves = board.generate_moves();
    assert!(moves
        .iter()
        .all(|m| m.moved_piece().type_of() != PieceType::N));
}
