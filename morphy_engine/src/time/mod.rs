//! Search limits and time management.
//!
//! The base budget for a timed search is
//! `remaining * time_fraction / max(1, moves_to_go)`, where `moves_to_go`
//! falls back to a game-phase interpolation between configured bounds when
//! the GUI does not provide one. The search may overrun the base budget up
//! to a hard maximum when an iteration ends on a fail-high or fail-low.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use morphy::core::masks::PLAYER_CNT;
use morphy::Player;

use crate::params::SearchParams;

/// Clock state as sent by the GUI with `go`.
#[derive(Clone, Debug)]
pub struct UciTimer {
    /// Remaining time per player, in milliseconds.
    pub time_msec: [i64; PLAYER_CNT],
    /// Increment per move per player, in milliseconds.
    pub inc_msec: [i64; PLAYER_CNT],
    /// Moves until the next time control, 0 if unknown.
    pub moves_to_go: u32,
}

impl UciTimer {
    pub fn blank() -> Self {
        UciTimer {
            time_msec: [0; PLAYER_CNT],
            inc_msec: [0; PLAYER_CNT],
            moves_to_go: 0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.time_msec == [0; PLAYER_CNT] && self.inc_msec == [0; PLAYER_CNT]
    }
}

/// What bounds the search.
#[derive(Clone, Debug)]
pub enum LimitsType {
    /// Clock-based search.
    Time(UciTimer),
    /// Search for exactly this many milliseconds.
    MoveTime(u64),
    /// Search for a mate in at most this many moves.
    Mate(u16),
    /// Search exactly this many plies.
    Depth(u16),
    /// Search at most this many nodes.
    Nodes(u64),
    /// Search until told to stop.
    Infinite,
}

/// The complete bounds of one `go` command.
#[derive(Clone, Debug)]
pub struct Limits {
    pub limits_type: LimitsType,
    pub search_moves: Vec<String>,
    pub ponder: bool,
}

impl Limits {
    pub fn blank() -> Limits {
        Limits {
            limits_type: LimitsType::Infinite,
            search_moves: Vec::new(),
            ponder: false,
        }
    }

    /// Maximum nominal depth for this search, if bounded.
    pub fn depth_limit(&self) -> Option<u16> {
        match self.limits_type {
            LimitsType::Depth(d) => Some(d),
            _ => None,
        }
    }

    /// Node budget for this search, if bounded.
    pub fn node_limit(&self) -> Option<u64> {
        match self.limits_type {
            LimitsType::Nodes(n) => Some(n),
            _ => None,
        }
    }

    /// Mate-distance target, if any.
    pub fn mate_limit(&self) -> Option<u16> {
        match self.limits_type {
            LimitsType::Mate(m) => Some(m),
            _ => None,
        }
    }
}

/// Shared time-management state for one search.
pub struct TimeManager {
    start: Mutex<Instant>,
    /// Base budget: stop after a completed iteration past this point.
    ideal_time: AtomicI64,
    /// Hard budget: abort mid-iteration past this point.
    maximum_time: AtomicI64,
    /// Fixed `movetime` budget, -1 when unused.
    move_time: AtomicI64,
    /// True for infinite/depth/node searches: the clock never stops them.
    untimed: AtomicBool,
    /// True while pondering; flips false on `ponderhit`.
    pondering: AtomicBool,
}

impl Default for TimeManager {
    fn default() -> Self {
        TimeManager::uninitialized()
    }
}

impl TimeManager {
    pub fn uninitialized() -> TimeManager {
        TimeManager {
            start: Mutex::new(Instant::now()),
            ideal_time: AtomicI64::new(0),
            maximum_time: AtomicI64::new(0),
            move_time: AtomicI64::new(-1),
            untimed: AtomicBool::new(true),
            pondering: AtomicBool::new(false),
        }
    }

    /// Restarts the clock for a new search.
    pub fn start_timer(&self, start: Instant, ponder: bool) {
        *self.start.lock().unwrap() = start;
        self.pondering.store(ponder, Ordering::Relaxed);
        self.move_time.store(-1, Ordering::Relaxed);
        self.untimed.store(true, Ordering::Relaxed);
    }

    /// Configures a clock-based budget.
    pub fn init(
        &self,
        start: Instant,
        timer: &UciTimer,
        turn: Player,
        phase: i32,
        params: &SearchParams,
        ponder: bool,
    ) {
        let remaining = timer.time_msec[turn as usize].max(0);
        let inc = timer.inc_msec[turn as usize].max(0);

        let moves_to_go = if timer.moves_to_go > 0 {
            timer.moves_to_go as i64
        } else {
            params.min_moves_to_go
                + (params.max_moves_to_go - params.min_moves_to_go) * phase as i64 / 256
        };

        let spendable = remaining * params.time_fraction_permill / 1000;
        let base = (spendable / moves_to_go.max(1) + inc).max(1);
        let maximum = (base * params.max_time_factor).min(spendable.max(1));

        *self.start.lock().unwrap() = start;
        self.ideal_time.store(base, Ordering::Relaxed);
        self.maximum_time.store(maximum.max(base), Ordering::Relaxed);
        self.move_time.store(-1, Ordering::Relaxed);
        self.untimed.store(false, Ordering::Relaxed);
        self.pondering.store(ponder, Ordering::Relaxed);
    }

    /// Configures a fixed `movetime` budget: wait exactly that long.
    pub fn init_move_time(&self, start: Instant, msec: u64, ponder: bool) {
        *self.start.lock().unwrap() = start;
        self.move_time.store(msec as i64, Ordering::Relaxed);
        self.untimed.store(false, Ordering::Relaxed);
        self.pondering.store(ponder, Ordering::Relaxed);
    }

    /// Milliseconds elapsed since the search started.
    pub fn elapsed(&self) -> i64 {
        let start = *self.start.lock().unwrap();
        chrono::Duration::from_std(start.elapsed())
            .map(|d| d.num_milliseconds())
            .unwrap_or(i64::MAX)
    }

    /// Lifts ponder mode: the clock starts counting for real.
    pub fn ponder_hit(&self) {
        self.pondering.store(false, Ordering::Relaxed);
    }

    pub fn is_pondering(&self) -> bool {
        self.pondering.load(Ordering::Relaxed)
    }

    /// Hard cutoff check, polled from inside the search.
    pub fn out_of_time(&self) -> bool {
        if self.pondering.load(Ordering::Relaxed) {
            return false;
        }
        let fixed = self.move_time.load(Ordering::Relaxed);
        if fixed >= 0 {
            return self.elapsed() >= fixed;
        }
        if self.untimed.load(Ordering::Relaxed) {
            return false;
        }
        self.elapsed() >= self.maximum_time.load(Ordering::Relaxed)
    }

    /// Whether to begin another iteration. `score_is_bound` grants the
    /// extension: when the last iteration ended on a fail-high or fail-low
    /// the search may stretch toward the hard maximum.
    pub fn enough_time_for_another(&self, score_is_bound: bool) -> bool {
        if self.pondering.load(Ordering::Relaxed) {
            return true;
        }
        let fixed = self.move_time.load(Ordering::Relaxed);
        if fixed >= 0 {
            return self.elapsed() < fixed;
        }
        if self.untimed.load(Ordering::Relaxed) {
            return true;
        }
        let budget = if score_is_bound {
            self.maximum_time.load(Ordering::Relaxed)
        } else {
            self.ideal_time.load(Ordering::Relaxed)
        };
        self.elapsed() < budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_budget_is_positive_and_bounded() {
        let tm = TimeManager::uninitialized();
        let timer = UciTimer {
            time_msec: [120_000, 120_000],
            inc_msec: [2_000, 2_000],
            moves_to_go: 0,
        };
        let params = SearchParams::default();
        tm.init(Instant::now(), &timer, Player::White, 256, &params, false);

        let ideal = tm.ideal_time.load(Ordering::Relaxed);
        let max = tm.maximum_time.load(Ordering::Relaxed);
        assert!(ideal > 0);
        assert!(max >= ideal);
        assert!(max <= 120_000);
        assert!(!tm.out_of_time());
    }

    #[test]
    fn moves_to_go_respected() {
        let tm = TimeManager::uninitialized();
        let timer = UciTimer {
            time_msec: [10_000, 10_000],
            inc_msec: [0, 0],
            moves_to_go: 10,
        };
        let params = SearchParams::default();
        tm.init(Instant::now(), &timer, Player::Black, 128, &params, false);
        let ideal = tm.ideal_time.load(Ordering::Relaxed);
        // Roughly a tenth of the spendable clock.
        assert!(ideal <= 1_000);
        assert!(ideal >= 500);
    }

    #[test]
    fn pondering_never_times_out() {
        let tm = TimeManager::uninitialized();
        tm.init_move_time(Instant::now() - std::time::Duration::from_secs(5), 1, true);
        assert!(!tm.out_of_time());
        tm.ponder_hit();
        assert!(tm.out_of_time());
    }

    #[test]
    fn untimed_always_continues() {
        let tm = TimeManager::uninitialized();
        tm.start_timer(Instant::now(), false);
        assert!(!tm.out_of_time());
        assert!(tm.enough_time_for_another(false));
    }
}
