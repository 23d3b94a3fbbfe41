//! The search information record: what the engine currently believes about
//! the search in flight. Guarded by a reader-writer lock; writers publish a
//! new value and observers receive immutable snapshots through listener
//! callbacks, so no observer ever holds a reference back into the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use morphy::core::score::{Value, MATE, MATE_IN_MAX_PLY};
use morphy::Move;

/// The kind of a reported score.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ScoreKind {
    Exact,
    LowerBound,
    UpperBound,
    Mate,
}

impl ScoreKind {
    /// A bound score marks an unfinished aspiration iteration; the time
    /// manager may grant an extension for it.
    #[inline]
    pub fn is_bound(self) -> bool {
        matches!(self, ScoreKind::LowerBound | ScoreKind::UpperBound)
    }
}

/// A snapshot of the search state.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    /// The principal variation, best move first.
    pub pv: Vec<Move>,
    /// The root move currently being searched, and its ordinal (1-based).
    pub current_move: Move,
    pub current_move_number: usize,
    /// Nominal and selective depth reached.
    pub depth: u16,
    pub sel_depth: u16,
    /// Score of the last completed iteration and its kind.
    pub score: Value,
    pub score_kind: ScoreKind,
    /// Nodes searched across all threads.
    pub nodes: u64,
    pub elapsed_ms: i64,
    /// Endgame-tablebase hits (always zero without a probing backend).
    pub tb_hits: u64,
    /// Free-form statistics, e.g. hash occupancy.
    pub stats: String,
}

impl Default for SearchInfo {
    fn default() -> SearchInfo {
        SearchInfo {
            pv: Vec::new(),
            current_move: Move::null(),
            current_move_number: 0,
            depth: 0,
            sel_depth: 0,
            score: 0,
            score_kind: ScoreKind::Exact,
            nodes: 0,
            elapsed_ms: 0,
            tb_hits: 0,
            stats: String::new(),
        }
    }
}

impl SearchInfo {
    /// The move the engine would play right now, if any.
    pub fn best_move(&self) -> Option<Move> {
        self.pv.first().copied()
    }

    /// The expected reply, used as the ponder move.
    pub fn ponder_move(&self) -> Option<Move> {
        self.pv.get(1).copied()
    }

    /// Formats the record as a UCI `info` line.
    pub fn uci_line(&self) -> String {
        let mut s = format!("info depth {} seldepth {}", self.depth, self.sel_depth);
        if self.score.abs() >= MATE_IN_MAX_PLY {
            let plies = MATE - self.score.abs();
            let mut mate_in = (plies + 1) / 2;
            if self.score < 0 {
                mate_in = -mate_in;
            }
            s.push_str(&format!(" score mate {}", mate_in));
        } else {
            s.push_str(&format!(" score cp {}", self.score));
        }
        match self.score_kind {
            ScoreKind::LowerBound => s.push_str(" lowerbound"),
            ScoreKind::UpperBound => s.push_str(" upperbound"),
            _ => {}
        }
        let nps = if self.elapsed_ms > 0 {
            self.nodes * 1000 / self.elapsed_ms as u64
        } else {
            self.nodes
        };
        s.push_str(&format!(
            " nodes {} nps {} time {}",
            self.nodes, nps, self.elapsed_ms
        ));
        if !self.pv.is_empty() {
            s.push_str(" pv");
            for mv in &self.pv {
                s.push(' ');
                s.push_str(&mv.stringify());
            }
        }
        s
    }
}

/// Observer callback receiving search-info snapshots.
pub type InfoListener = Box<dyn Fn(&SearchInfo) + Send + Sync>;

/// Shared handle around the search information record.
pub struct InfoHandle {
    info: RwLock<SearchInfo>,
    listeners: Mutex<Vec<InfoListener>>,
    /// Whether UCI `info` lines should go to stdout.
    pub use_stdout: AtomicBool,
}

impl Default for InfoHandle {
    fn default() -> Self {
        InfoHandle::new(true)
    }
}

impl InfoHandle {
    pub fn new(use_stdout: bool) -> InfoHandle {
        InfoHandle {
            info: RwLock::new(SearchInfo::default()),
            listeners: Mutex::new(Vec::new()),
            use_stdout: AtomicBool::new(use_stdout),
        }
    }

    /// Registers an observer. Every subsequent write notifies it with a
    /// fresh snapshot.
    pub fn add_listener(&self, listener: InfoListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Applies `f` to the record under the write lock, then notifies
    /// observers.
    pub fn update<F: FnOnce(&mut SearchInfo)>(&self, f: F) {
        let snapshot = {
            let mut guard = self.info.write().unwrap();
            f(&mut guard);
            guard.clone()
        };
        for listener in self.listeners.lock().unwrap().iter() {
            listener(&snapshot);
        }
    }

    /// Returns a snapshot of the current record.
    pub fn snapshot(&self) -> SearchInfo {
        self.info.read().unwrap().clone()
    }

    /// Resets the record for a fresh search.
    pub fn reset(&self) {
        *self.info.write().unwrap() = SearchInfo::default();
    }

    /// Prints the current record as a UCI info line, if stdout is on.
    pub fn print_uci(&self) {
        if self.use_stdout.load(Ordering::Relaxed) {
            println!("{}", self.snapshot().uci_line());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn listeners_receive_snapshots() {
        let handle = InfoHandle::new(false);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = Arc::clone(&hits);
        handle.add_listener(Box::new(move |info| {
            assert_eq!(info.depth, 7);
            hits2.fetch_add(1, Ordering::SeqCst);
        }));
        handle.update(|info| info.depth = 7);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(handle.snapshot().depth, 7);
    }

    #[test]
    fn uci_line_formats_cp_and_mate() {
        let mut info = SearchInfo {
            depth: 10,
            sel_depth: 14,
            score: 33,
            nodes: 2000,
            elapsed_ms: 100,
            ..SearchInfo::default()
        };
        let line = info.uci_line();
        assert!(line.contains("depth 10"));
        assert!(line.contains("score cp 33"));
        assert!(line.contains("nps 20000"));

        info.score = MATE - 3;
        let line = info.uci_line();
        assert!(line.contains("score mate 2"), "{}", line);

        info.score = -(MATE - 4);
        let line = info.uci_line();
        assert!(line.contains("score mate -2"), "{}", line);
    }

    #[test]
    fn bound_kinds() {
        assert!(ScoreKind::LowerBound.is_bound());
        assert!(ScoreKind::UpperBound.is_bound());
        assert!(!ScoreKind::Exact.is_bound());
        assert!(!ScoreKind::Mate.is_bound());
    }
}
