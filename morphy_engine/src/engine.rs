//! The search controller. Owns the live board, the caches and their
//! generation counters, the thread pool, and the UCI command loop.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use morphy::tools::tt::TranspositionTable;
use morphy::Board;

use crate::eval::game_phase;
use crate::params::SearchParams;
use crate::root_moves::SharedRootMoves;
use crate::search::info::InfoHandle;
use crate::search::SearchContext;
use crate::tables::EvalTable;
use crate::threadpool::ThreadPool;
use crate::time::{Limits, LimitsType, TimeManager};
use crate::uci::options::{OptionWork, UciOptions};
use crate::uci::parse;

pub static ID_NAME: &str = "Morphy";
pub static ID_AUTHORS: &str = "the morphy authors";
pub static VERSION: &str = env!("CARGO_PKG_VERSION");

/// The engine controller behind the UCI boundary.
pub struct MorphyEngine {
    options: UciOptions,
    board: Board,
    pool: ThreadPool,
    tt: Arc<TranspositionTable>,
    eval_cache: Arc<EvalTable>,
    timer: Arc<TimeManager>,
    info: Arc<InfoHandle>,
    params: Arc<SearchParams>,
    /// The `position` base last loaded, used to tell a fresh game from a
    /// continuation.
    last_position_base: Option<String>,
    debug: bool,
}

impl MorphyEngine {
    /// Builds a controller with default options.
    pub fn init(use_stdout: bool) -> MorphyEngine {
        morphy::helper::init_statics();
        let options = UciOptions::new();
        let (tt_mb, et_mb) = split_hash(options.hash_mb, SearchParams::default().trans_table_share);
        let mut pool = ThreadPool::new();
        pool.set_thread_count(options.threads);
        MorphyEngine {
            options,
            board: Board::start_pos(),
            pool,
            tt: Arc::new(TranspositionTable::new(tt_mb)),
            eval_cache: Arc::new(EvalTable::new(et_mb)),
            timer: Arc::new(TimeManager::uninitialized()),
            info: Arc::new(InfoHandle::new(use_stdout)),
            params: Arc::new(SearchParams::default()),
            last_position_base: None,
            debug: false,
        }
    }

    /// Runs the blocking UCI command loop until `quit`.
    pub fn uci(&mut self) {
        let mut line = String::new();
        loop {
            line.clear();
            if io::stdin().read_line(&mut line).is_err() {
                break;
            }
            if line.is_empty() {
                // EOF from the GUI side.
                break;
            }
            let args: Vec<&str> = line.split_whitespace().collect();
            let command: &str = args.first().unwrap_or(&"");
            match command {
                "" => continue,
                "uci" => self.uci_startup(),
                "debug" => self.debug = args.get(1) == Some(&"on"),
                "isready" => println!("readyok"),
                "setoption" => self.handle_setoption(&line),
                "ucinewgame" => self.new_game(),
                "position" => self.handle_position(&args[1..]),
                "go" => self.go(parse::parse_go(&args[1..])),
                "stop" => self.halt(),
                "ponderhit" => self.ponder_hit(),
                "quit" => {
                    self.halt();
                    self.pool.wait_for_finish();
                    break;
                }
                _ => {
                    if self.debug {
                        println!("info string unknown command: {}", line.trim());
                    }
                }
            }
            self.apply_pending_option_work();
        }
    }

    fn uci_startup(&self) {
        println!("id name {} {}", ID_NAME, VERSION);
        println!("id author {}", ID_AUTHORS);
        self.options.display_all();
        println!("uciok");
    }

    /// Resets the game: caches cleared, generations rewound, per-thread
    /// tables wiped.
    pub fn new_game(&mut self) {
        self.pool.wait_for_finish();
        self.tt.clear();
        self.eval_cache.clear();
        self.pool.clear_all();
        self.last_position_base = None;
        self.board = Board::start_pos();
    }

    fn handle_position(&mut self, args: &[&str]) {
        let base = parse::position_base(args);
        match parse::parse_position(args) {
            Some(board) => {
                if self.last_position_base.as_deref() != Some(base.as_str()) {
                    // New starting point: treat as a fresh game.
                    self.tt.clear();
                    self.eval_cache.clear();
                    self.last_position_base = Some(base);
                } else {
                    // Same game progressed: age the caches so stale entries
                    // lose replacement fights. The tables clear themselves
                    // when the generation wraps.
                    self.tt.bump_generation();
                    self.eval_cache.bump_generation();
                }
                self.board = board;
            }
            None => {
                if self.debug {
                    println!("info string unable to parse position");
                }
            }
        }
    }

    fn handle_setoption(&mut self, full_command: &str) {
        let mut args = full_command.split_whitespace();
        args.next(); // setoption
        if args.next() != Some("name") {
            if self.debug {
                println!("info string setoption name [name] value [value]");
            }
            return;
        }

        let mut name = String::new();
        let mut value = String::new();
        let mut in_value = false;
        for token in args {
            if token == "value" && !in_value {
                in_value = true;
            } else if in_value {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(token);
            } else {
                if !name.is_empty() {
                    name.push(' ');
                }
                name.push_str(token);
            }
        }

        if !self.options.apply(&name, &value) && self.debug {
            println!("info string unable to apply option '{}'", full_command.trim());
        }
    }

    fn apply_pending_option_work(&mut self) {
        while let Some(work) = self.options.work() {
            if self.is_searching() && !work.usable_while_searching() {
                if self.debug {
                    println!("info string option deferred while searching");
                }
                continue;
            }
            match work {
                OptionWork::ClearHash => {
                    self.tt.clear();
                    self.eval_cache.clear();
                }
                OptionWork::ResizeHash(mb) => {
                    let (tt_mb, et_mb) = split_hash(mb, self.params.trans_table_share);
                    // The pool is idle here, nothing else touches the tables.
                    unsafe {
                        self.tt.resize(tt_mb);
                        self.eval_cache.resize(et_mb);
                    }
                }
                OptionWork::Threads(n) => self.pool.set_thread_count(n),
            }
        }
    }

    /// Starts a search with the given limits. Returns immediately; the
    /// master thread reports `bestmove` when done.
    pub fn go(&mut self, limits: Limits) {
        self.pool.wait_for_finish();

        let root_list = self.board.generate_moves();
        let root = Arc::new(SharedRootMoves::new(&root_list));

        // An opening book would be consulted here when OwnBook is set; no
        // book backend is wired in, so the tree search always runs.

        let ponder = limits.ponder && self.options.ponder;
        let now = Instant::now();
        match limits.limits_type {
            LimitsType::MoveTime(ms) => self.timer.init_move_time(now, ms, ponder),
            LimitsType::Time(ref uci_timer) => self.timer.init(
                now,
                uci_timer,
                self.board.turn(),
                game_phase(&self.board),
                &self.params,
                ponder,
            ),
            _ => self.timer.start_timer(now, ponder),
        }

        self.info.reset();

        let ctx = Arc::new(SearchContext {
            stop: Arc::clone(&self.pool.stop),
            tt: Arc::clone(&self.tt),
            eval_cache: Arc::clone(&self.eval_cache),
            params: Arc::clone(&self.params),
            timer: Arc::clone(&self.timer),
            info: Arc::clone(&self.info),
            root,
            limits,
            thread_count: self.pool.size(),
            analyse_mode: self.options.analyse_mode,
            nodes: std::sync::atomic::AtomicU64::new(0),
        });
        self.pool.launch(&self.board, &ctx);
    }

    /// Cancels the running search, if any.
    pub fn halt(&mut self) {
        self.pool.set_stop(true);
    }

    /// Switches a pondering search onto the real clock.
    pub fn ponder_hit(&mut self) {
        self.timer.ponder_hit();
    }

    /// Returns whether a search is currently running.
    pub fn is_searching(&self) -> bool {
        self.pool.is_searching()
    }

    /// Blocks until the search finishes and returns the final information
    /// snapshot.
    pub fn await_search(&self) -> crate::search::info::SearchInfo {
        self.pool.wait_for_finish();
        self.info.snapshot()
    }

    /// The board the controller currently holds.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Loads a position directly; test/bench convenience mirroring the
    /// `position` command.
    pub fn set_position(&mut self, args: &[&str]) -> bool {
        if parse::parse_position(args).is_none() {
            return false;
        }
        self.handle_position(args);
        true
    }

    /// Shared info handle, for attaching listeners.
    pub fn info_handle(&self) -> &Arc<InfoHandle> {
        &self.info
    }
}

impl Drop for MorphyEngine {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Splits the total hash budget between the transposition table and the
/// evaluation cache by `share/16`.
fn split_hash(total_mb: usize, share: usize) -> (usize, usize) {
    let tt = (total_mb * share / 16).max(1);
    let et = (total_mb - tt).max(1);
    (tt, et)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_split_shares() {
        let (tt, et) = split_hash(64, 15);
        assert_eq!(tt, 60);
        assert_eq!(et, 4);
        let (tt, et) = split_hash(1, 15);
        assert_eq!(tt, 1);
        assert_eq!(et, 1);
    }

    #[test]
    fn position_command_updates_board() {
        let mut engine = MorphyEngine::init(false);
        assert!(engine.set_position(&["startpos", "moves", "e2e4"]));
        assert_eq!(engine.board().moves_played(), 1);

        // Malformed command leaves the board untouched.
        let fen_before = engine.board().fen();
        engine.handle_position(&["fen", "garbage"]);
        assert_eq!(engine.board().fen(), fen_before);
    }
}
