extern crate morphy;
extern crate morphy_engine;

use std::thread;
use std::time::Duration;

use morphy::core::score::{DRAW, MATE, MATE_IN_MAX_PLY};
use morphy_engine::engine::MorphyEngine;
use morphy_engine::search::info::ScoreKind;
use morphy_engine::time::{Limits, LimitsType};

fn depth_limits(d: u16) -> Limits {
    Limits {
        limits_type: LimitsType::Depth(d),
        search_moves: Vec::new(),
        ponder: false,
    }
}

#[test]
fn finds_mate_in_one() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&[
        "fen", "6k1/5ppp/8/8/8/8/5PPP/R6K", "w", "-", "-", "0", "1",
    ]));
    engine.go(depth_limits(3));
    let info = engine.await_search();

    assert_eq!(info.pv.first().map(|m| m.stringify()), Some("a1a8".into()));
    assert_eq!(info.score, MATE - 1);
    assert_eq!(info.score_kind, ScoreKind::Mate);
}

#[test]
fn finds_back_rank_mate_for_black() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&[
        "fen", "r6k/5ppp/8/8/8/8/5PPP/6K1", "b", "-", "-", "0", "1",
    ]));
    engine.go(depth_limits(3));
    let info = engine.await_search();
    assert_eq!(info.pv.first().map(|m| m.stringify()), Some("a8a1".into()));
    assert!(info.score >= MATE_IN_MAX_PLY);
}

#[test]
fn stalemate_position_yields_no_move() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["fen", "7k/5Q2/6K1/8/8/8/8/8", "b", "-", "-", "0", "1"]));
    engine.go(depth_limits(2));
    let info = engine.await_search();
    assert!(info.pv.is_empty());
    assert_eq!(info.depth, 0);
}

#[test]
fn fifty_move_clock_scores_draw() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["fen", "7k/8/8/8/8/8/8/R6K", "w", "-", "-", "100", "80"]));
    engine.go(depth_limits(4));
    let info = engine.await_search();
    // Every reply keeps the clock over the limit, so everything is the
    // claimed draw.
    assert_eq!(info.score, DRAW);
}

#[test]
fn repetition_shuffle_is_drawish() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&[
        "startpos", "moves", "b1c3", "b8c6", "c3b1", "c6b8", "b1c3", "b8c6", "c3b1", "c6b8",
    ]));
    engine.go(depth_limits(4));
    let info = engine.await_search();
    // The repetition machinery must keep this inside the draw margin, not
    // wander off into a material fantasy.
    assert!(info.score.abs() < 100, "score {}", info.score);
}

#[test]
fn deeper_search_finds_reasonable_opening_move() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["startpos"]));
    engine.go(depth_limits(5));
    let info = engine.await_search();

    assert_eq!(info.depth, 5);
    assert!(!info.pv.is_empty());
    assert!(info.nodes > 0);
    // Still a roughly balanced position.
    assert!(info.score.abs() < 200, "score {}", info.score);
}

#[test]
fn cancellation_terminates_promptly() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["startpos"]));
    engine.go(Limits {
        limits_type: LimitsType::Infinite,
        search_moves: Vec::new(),
        ponder: false,
    });
    thread::sleep(Duration::from_millis(100));
    engine.halt();
    let info = engine.await_search();
    // The search must have terminated and produced something.
    assert!(info.nodes > 0);
}

#[test]
fn node_limit_bounds_the_search() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["startpos"]));
    engine.go(Limits {
        limits_type: LimitsType::Nodes(20_000),
        search_moves: Vec::new(),
        ponder: false,
    });
    let info = engine.await_search();
    // The cooperative stop allows a bounded overshoot only.
    assert!(info.nodes < 2_000_000, "nodes {}", info.nodes);
}

#[test]
fn movetime_is_respected() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["startpos"]));
    let start = std::time::Instant::now();
    engine.go(Limits {
        limits_type: LimitsType::MoveTime(200),
        search_moves: Vec::new(),
        ponder: false,
    });
    let info = engine.await_search();
    let elapsed = start.elapsed().as_millis();
    assert!(info.nodes > 0);
    assert!(elapsed < 5_000, "took {}ms", elapsed);
}

#[test]
fn searchmoves_restricts_the_root() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&["startpos"]));
    engine.go(Limits {
        limits_type: LimitsType::Depth(3),
        search_moves: vec!["a2a3".into()],
        ponder: false,
    });
    let info = engine.await_search();
    assert_eq!(info.pv.first().map(|m| m.stringify()), Some("a2a3".into()));
}

#[test]
fn mate_limit_stops_on_found_mate() {
    let mut engine = MorphyEngine::init(false);
    assert!(engine.set_position(&[
        "fen", "6k1/5ppp/8/8/8/8/5PPP/R6K", "w", "-", "-", "0", "1",
    ]));
    engine.go(Limits {
        limits_type: LimitsType::Mate(1),
        search_moves: Vec::new(),
        ponder: false,
    });
    let info = engine.await_search();
    assert!(info.score >= MATE - 2);
}
