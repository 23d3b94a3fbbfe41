//! Functions for parsing UCI input: the `go` time parameters and the
//! `position` command.

use morphy::Board;

use crate::time::{Limits, LimitsType, UciTimer};

fn is_keyword(arg: &str) -> bool {
    matches!(
        arg,
        "searchmoves"
            | "ponder"
            | "wtime"
            | "btime"
            | "winc"
            | "binc"
            | "movestogo"
            | "depth"
            | "nodes"
            | "mate"
            | "movetime"
            | "infinite"
    )
}

/// Parses the arguments of a `go` command into search limits.
pub fn parse_go(args: &[&str]) -> Limits {
    let mut limits = Limits::blank();
    let mut timer = UciTimer::blank();
    let mut move_time: Option<u64> = None;
    let mut depth: Option<u16> = None;
    let mut nodes: Option<u64> = None;
    let mut mate: Option<u16> = None;
    let mut infinite = false;

    let mut idx = 0;
    while let Some(token) = args.get(idx) {
        match *token {
            "infinite" => infinite = true,
            "ponder" => limits.ponder = true,
            "wtime" => {
                if let Some(v) = parse_next::<i64>(args, idx) {
                    timer.time_msec[0] = v;
                    idx += 1;
                }
            }
            "btime" => {
                if let Some(v) = parse_next::<i64>(args, idx) {
                    timer.time_msec[1] = v;
                    idx += 1;
                }
            }
            "winc" => {
                if let Some(v) = parse_next::<i64>(args, idx) {
                    timer.inc_msec[0] = v;
                    idx += 1;
                }
            }
            "binc" => {
                if let Some(v) = parse_next::<i64>(args, idx) {
                    timer.inc_msec[1] = v;
                    idx += 1;
                }
            }
            "movestogo" => {
                if let Some(v) = parse_next::<u32>(args, idx) {
                    timer.moves_to_go = v;
                    idx += 1;
                }
            }
            "depth" => {
                if let Some(v) = parse_next::<u16>(args, idx) {
                    depth = Some(v);
                    idx += 1;
                }
            }
            "nodes" => {
                if let Some(v) = parse_next::<u64>(args, idx) {
                    nodes = Some(v);
                    idx += 1;
                }
            }
            "mate" => {
                if let Some(v) = parse_next::<u16>(args, idx) {
                    mate = Some(v);
                    idx += 1;
                }
            }
            "movetime" => {
                if let Some(v) = parse_next::<u64>(args, idx) {
                    move_time = Some(v);
                    idx += 1;
                }
            }
            "searchmoves" => {
                while let Some(mv) = args.get(idx + 1) {
                    if is_keyword(mv) {
                        break;
                    }
                    limits.search_moves.push((*mv).to_string());
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }

    limits.limits_type = if let Some(t) = move_time {
        LimitsType::MoveTime(t)
    } else if let Some(m) = mate {
        LimitsType::Mate(m)
    } else if let Some(d) = depth {
        LimitsType::Depth(d)
    } else if let Some(n) = nodes {
        LimitsType::Nodes(n)
    } else if infinite {
        LimitsType::Infinite
    } else if !timer.is_blank() {
        LimitsType::Time(timer)
    } else {
        LimitsType::Infinite
    };
    limits
}

fn parse_next<T: std::str::FromStr>(args: &[&str], idx: usize) -> Option<T> {
    args.get(idx + 1).and_then(|s| s.parse::<T>().ok())
}

/// Parses the arguments of a `position` command (`startpos` or `fen ...`,
/// optionally followed by `moves m1 m2 ...`) into a board. Returns `None`
/// for a malformed FEN or an illegal move in the list.
pub fn parse_position(args: &[&str]) -> Option<Board> {
    let mut board = match args.first() {
        Some(&"startpos") => Board::start_pos(),
        Some(&"fen") => {
            let fen: String = args[1..]
                .iter()
                .take_while(|t| **t != "moves")
                .cloned()
                .collect::<Vec<&str>>()
                .join(" ");
            Board::from_fen(&fen).ok()?
        }
        _ => return None,
    };

    if let Some(moves_at) = args.iter().position(|t| *t == "moves") {
        for mv in &args[moves_at + 1..] {
            if !board.apply_uci_move(mv) {
                return None;
            }
        }
    }
    Some(board)
}

/// Returns the portion of a `position` command that identifies the starting
/// point, without the move list. Used by the controller to tell a new game
/// from a continuation of the previous one.
pub fn position_base(args: &[&str]) -> String {
    args.iter()
        .take_while(|t| **t != "moves")
        .cloned()
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphy::Player;

    #[test]
    fn position_startpos_and_moves() {
        let line = "startpos moves e2e4 e7e5";
        let args: Vec<&str> = line.split_whitespace().collect();
        let board = parse_position(&args).unwrap();
        assert_eq!(board.moves_played(), 2);
        assert_eq!(board.turn(), Player::White);

        let board = parse_position(&["startpos"]).unwrap();
        assert_eq!(board.moves_played(), 0);
    }

    #[test]
    fn position_fen() {
        let line = "fen r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1 moves e1g1";
        let args: Vec<&str> = line.split_whitespace().collect();
        let board = parse_position(&args).unwrap();
        assert_eq!(board.turn(), Player::Black);
        assert_eq!(board.king_sq(Player::White).to_string(), "g1");
    }

    #[test]
    fn position_rejects_illegal_moves() {
        let args: Vec<&str> = "startpos moves e2e5".split_whitespace().collect();
        assert!(parse_position(&args).is_none());
        let args: Vec<&str> = "fen not a fen at all".split_whitespace().collect();
        assert!(parse_position(&args).is_none());
    }

    #[test]
    fn go_clock_parsing() {
        let args: Vec<&str> = "wtime 30000 btime 28000 winc 100 binc 100 movestogo 20"
            .split_whitespace()
            .collect();
        let limits = parse_go(&args);
        match limits.limits_type {
            LimitsType::Time(ref t) => {
                assert_eq!(t.time_msec, [30000, 28000]);
                assert_eq!(t.inc_msec, [100, 100]);
                assert_eq!(t.moves_to_go, 20);
            }
            _ => panic!("expected a clock limit"),
        }
    }

    #[test]
    fn go_other_limits() {
        let args: Vec<&str> = "depth 9".split_whitespace().collect();
        assert!(matches!(parse_go(&args).limits_type, LimitsType::Depth(9)));

        let args: Vec<&str> = "movetime 500".split_whitespace().collect();
        assert!(matches!(
            parse_go(&args).limits_type,
            LimitsType::MoveTime(500)
        ));

        let args: Vec<&str> = "infinite searchmoves e2e4 d2d4"
            .split_whitespace()
            .collect();
        let limits = parse_go(&args);
        assert!(matches!(limits.limits_type, LimitsType::Infinite));
        assert_eq!(limits.search_moves.len(), 2);

        let args: Vec<&str> = "ponder wtime 1000 btime 1000".split_whitespace().collect();
        let limits = parse_go(&args);
        assert!(limits.ponder);
    }

    #[test]
    fn base_strips_moves() {
        let args: Vec<&str> = "startpos moves e2e4".split_whitespace().collect();
        assert_eq!(position_base(&args), "startpos");
        let args: Vec<&str> = "fen 8/8/8/8/8/8/8/KQ5k w - - 0 1".split_whitespace().collect();
        assert!(position_base(&args).starts_with("fen 8/8"));
    }
}
