//! The search thread pool: one master thread plus up to `N-1` helpers.
//!
//! Workers are long-lived OS threads parked on a job channel. Every search
//! hands each worker its own clone of the root position; the transposition
//! table, root node counters, stop flag and search-information record are
//! the only shared state. Helpers own their killer and history tables
//! across searches, exactly as the master does.
//!
//! Completion is tracked with a per-worker sent/done job counter rather
//! than a boolean, so a search that finishes before the caller begins
//! waiting can never be missed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use rand::seq::SliceRandom;

use morphy::Board;

use crate::consts::MAX_THREADS;
use crate::search::{SearchContext, Searcher};
use crate::tables::{HistoryTable, KillerTable};

enum Job {
    Search {
        board: Board,
        ctx: Arc<SearchContext>,
    },
    NewGame,
    Quit,
}

/// Count of search jobs a worker has fully completed.
struct DoneCounter {
    count: Mutex<u64>,
    cv: Condvar,
}

impl DoneCounter {
    fn new() -> DoneCounter {
        DoneCounter {
            count: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    fn bump(&self) {
        let mut guard = self.count.lock().unwrap();
        *guard += 1;
        self.cv.notify_all();
    }

    fn wait_until(&self, target: u64) {
        let mut guard = self.count.lock().unwrap();
        while *guard < target {
            guard = self.cv.wait(guard).unwrap();
        }
    }
}

struct Worker {
    tx: Sender<Job>,
    /// Search jobs handed to this worker.
    sent: AtomicU64,
    /// Search jobs this worker has finished.
    done: Arc<DoneCounter>,
    /// Pollable search-in-progress flag.
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// The thread pool for the chess engine.
///
/// The pool is non-blocking: starting a search returns immediately, and the
/// caller awaits completion through [`ThreadPool::wait_for_finish`].
pub struct ThreadPool {
    workers: Vec<Worker>,
    pub stop: Arc<AtomicBool>,
}

impl ThreadPool {
    /// Creates a pool with a single (master) thread.
    pub fn new() -> ThreadPool {
        let mut pool = ThreadPool {
            workers: Vec::new(),
            stop: Arc::new(AtomicBool::new(true)),
        };
        pool.attach_thread();
        pool
    }

    fn attach_thread(&mut self) {
        let id = self.workers.len();
        let (tx, rx) = channel::<Job>();
        let done = Arc::new(DoneCounter::new());
        let busy = Arc::new(AtomicBool::new(false));

        let thread_done = Arc::clone(&done);
        let thread_busy = Arc::clone(&busy);
        let handle = thread::Builder::new()
            .name(format!("morphy-search-{}", id))
            .stack_size(8 * 1024 * 1024)
            .spawn(move || {
                // Ordering tables live as long as the worker.
                let mut killers = KillerTable::new();
                let mut history = HistoryTable::new();

                while let Ok(job) = rx.recv() {
                    match job {
                        Job::Search { board, ctx } => {
                            thread_busy.store(true, Ordering::Relaxed);
                            {
                                let mut searcher = Searcher::new(
                                    board,
                                    Arc::clone(&ctx),
                                    id,
                                    &mut killers,
                                    &mut history,
                                );
                                searcher.search_root();
                            }
                            history.decay(ctx.params.history_decay_shift);
                            if id == 0 {
                                // The master owns the terminal protocol: it
                                // stops the helpers and reports the result.
                                ctx.stop.store(true, Ordering::Relaxed);
                                report_best_move(&ctx);
                            }
                            thread_busy.store(false, Ordering::Relaxed);
                            thread_done.bump();
                        }
                        Job::NewGame => {
                            killers.clear();
                            history.clear();
                        }
                        Job::Quit => break,
                    }
                }
            })
            .expect("failed to spawn search thread");

        self.workers.push(Worker {
            tx,
            sent: AtomicU64::new(0),
            done,
            busy,
            handle: Some(handle),
        });
    }

    /// Returns the number of threads.
    #[inline]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Grows or shrinks the pool to `num` threads. Must not be called while
    /// a search is running.
    pub fn set_thread_count(&mut self, num: usize) {
        let num = num.clamp(1, MAX_THREADS);
        self.wait_for_finish();
        while self.size() < num {
            self.attach_thread();
        }
        while self.size() > num {
            let mut worker = self.workers.pop().unwrap();
            let _ = worker.tx.send(Job::Quit);
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }

    /// Sets the cooperative stop flag.
    #[inline]
    pub fn set_stop(&self, stop: bool) {
        self.stop.store(stop, Ordering::Relaxed);
    }

    /// Blocks until every thread has finished every search handed to it.
    pub fn wait_for_finish(&self) {
        for worker in &self.workers {
            worker.done.wait_until(worker.sent.load(Ordering::Acquire));
        }
    }

    /// Returns whether any thread is currently searching.
    pub fn is_searching(&self) -> bool {
        self.workers.iter().any(|w| w.busy.load(Ordering::Relaxed))
    }

    /// Resets the per-thread ordering tables for a new game.
    pub fn clear_all(&self) {
        for worker in &self.workers {
            let _ = worker.tx.send(Job::NewGame);
        }
    }

    /// Starts a search on every thread. Returns immediately.
    pub fn launch(&self, board: &Board, ctx: &Arc<SearchContext>) {
        debug_assert_eq!(ctx.thread_count, self.size());
        self.stop.store(false, Ordering::Relaxed);
        for worker in &self.workers {
            let job = Job::Search {
                board: board.parallel_clone(),
                ctx: Arc::clone(ctx),
            };
            worker.sent.fetch_add(1, Ordering::AcqRel);
            let _ = worker.tx.send(job);
        }
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        ThreadPool::new()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.set_stop(true);
        for worker in &self.workers {
            let _ = worker.tx.send(Job::Quit);
        }
        for worker in self.workers.iter_mut() {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Emits `bestmove` (and `ponder`) for a finished search, falling back to a
/// uniformly random legal move when the search produced nothing, so the UCI
/// contract is always met.
fn report_best_move(ctx: &Arc<SearchContext>) {
    let snapshot = ctx.info.snapshot();
    let best = snapshot.best_move().or_else(|| {
        let moves = ctx.root.moves();
        moves.choose(&mut rand::thread_rng()).copied()
    });

    if !ctx.info.use_stdout.load(Ordering::Relaxed) {
        return;
    }
    match best {
        Some(mv) => {
            if let Some(ponder) = snapshot.ponder_move() {
                println!("bestmove {} ponder {}", mv, ponder);
            } else {
                println!("bestmove {}", mv);
            }
        }
        None => println!("bestmove 0000"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_counter_blocks_until_target() {
        let counter = Arc::new(DoneCounter::new());
        let c2 = Arc::clone(&counter);
        let handle = thread::spawn(move || {
            c2.bump();
            c2.bump();
        });
        counter.wait_until(2);
        handle.join().unwrap();
    }

    #[test]
    fn pool_resizes() {
        let mut pool = ThreadPool::new();
        assert_eq!(pool.size(), 1);
        pool.set_thread_count(3);
        assert_eq!(pool.size(), 3);
        pool.set_thread_count(1);
        assert_eq!(pool.size(), 1);
        assert!(!pool.is_searching());
    }
}
