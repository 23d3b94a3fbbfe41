//! The main searching functions: iterative deepening with aspiration
//! windows over a principal-variation search with null-move pruning,
//! late-move reductions, futility and reverse-futility pruning, razoring,
//! internal iterative deepening, fractional extensions, and a delta-pruned
//! quiescence search.
//!
//! Depth is measured in fractional plies (`FULL_PLY` units) so that
//! extensions may be worth fractions of a ply.
//!
//! One master thread (id 0) runs the loop that owns reporting and time
//! management; helper threads run the same loop against the same root,
//! sharing only the transposition table, the root node counters and the
//! search-information record. Cancellation is cooperative: every node polls
//! the shared stop flag and unwinds by returning a discarded score, never by
//! panicking or allocating.

pub mod info;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use morphy::core::score::*;
use morphy::core::sq::SQ;
use morphy::tools::tt::{NodeBound, TranspositionTable};
use morphy::tools::PreFetchable;
use morphy::{Board, GenTypes, Move};

use crate::consts::*;
use crate::eval::Evaluation;
use crate::movepick::MovePicker;
use crate::params::SearchParams;
use crate::root_moves::{RootMove, SharedRootMoves};
use crate::tables::{EvalTable, HistoryTable, KillerTable};
use crate::time::{Limits, TimeManager};

use self::info::{InfoHandle, ScoreKind};

/// How many nodes pass between limit checks on the master thread.
const LIMIT_CHECK_INTERVAL: u64 = 4096;

/// Upper bound on deferred (busy) moves buffered per node.
const MAX_DEFERRED: usize = 32;

/// Everything a search thread shares with its siblings and the controller.
pub struct SearchContext {
    pub stop: Arc<AtomicBool>,
    pub tt: Arc<TranspositionTable>,
    pub eval_cache: Arc<EvalTable>,
    pub params: Arc<SearchParams>,
    pub timer: Arc<TimeManager>,
    pub info: Arc<InfoHandle>,
    pub root: Arc<SharedRootMoves>,
    pub limits: Limits,
    pub thread_count: usize,
    /// Analysis mode disables tablebase shortcuts and searches single-reply
    /// positions like any other.
    pub analyse_mode: bool,
    /// Nodes searched by all threads together.
    pub nodes: AtomicU64,
}

impl SearchContext {
    #[inline]
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// A single search thread.
pub struct Searcher<'a> {
    board: Board,
    ctx: Arc<SearchContext>,
    id: usize,
    killers: &'a mut KillerTable,
    history: &'a mut HistoryTable,
    /// Locally counted nodes, flushed into the shared counter.
    nodes: u64,
    sel_depth: u16,
    root_moves: Vec<RootMove>,
}

impl<'a> Searcher<'a> {
    pub fn new(
        board: Board,
        ctx: Arc<SearchContext>,
        id: usize,
        killers: &'a mut KillerTable,
        history: &'a mut HistoryTable,
    ) -> Searcher<'a> {
        Searcher {
            board,
            ctx,
            id,
            killers,
            history,
            nodes: 0,
            sel_depth: 0,
            root_moves: Vec::new(),
        }
    }

    #[inline(always)]
    fn main_thread(&self) -> bool {
        self.id == 0
    }

    #[inline(always)]
    fn stop(&self) -> bool {
        self.ctx.stopped()
    }

    /// The per-thread entry point: iterative deepening with aspiration
    /// windows over the root moves.
    pub fn search_root(&mut self) {
        let ctx = Arc::clone(&self.ctx);
        let params = Arc::clone(&ctx.params);

        self.killers.clear();
        self.sel_depth = 0;
        self.nodes = 0;

        // Local root ordering: seeded by SEE, later iterations order by the
        // shared cumulative subtree node counts.
        self.root_moves = ctx
            .root
            .moves()
            .iter()
            .enumerate()
            .filter(|(_, mv)| {
                ctx.limits.search_moves.is_empty()
                    || ctx.limits.search_moves.contains(&mv.stringify())
            })
            .map(|(idx, mv)| RootMove::new(*mv, idx))
            .collect();
        if self.root_moves.is_empty() {
            return;
        }
        let board = self.board.shallow_clone();
        self.root_moves
            .sort_by_key(|rm| -(board.see(rm.mv) + if rm.mv.is_tactical() { 1 } else { 0 }));

        let max_depth = ctx
            .limits
            .depth_limit()
            .unwrap_or(MAX_PLY - 1)
            .min(MAX_PLY - 1);

        // Helpers with odd ids run the half-iteration one ply deeper.
        let mut depth: u16 = 1 + (self.id % 2) as u16;
        let mut last_score: Value = NONE;

        'deepening: while depth <= max_depth && !self.stop() {
            for rm in self.root_moves.iter_mut() {
                rm.rollback();
            }

            // Aspiration window around the previous iteration's score, full
            // width on the first iterations and for mate scores.
            let mut delta = params.aspiration_delta;
            let (mut alpha, mut beta) = if depth >= 5
                && last_score != NONE
                && last_score.abs() < MATE_IN_MAX_PLY
            {
                (
                    (last_score - delta).max(NEG_INFINITE),
                    (last_score + delta).min(INFINITE),
                )
            } else {
                (NEG_INFINITE, INFINITE)
            };
            let mut fails_low: u32 = 0;
            let mut fails_high: u32 = 0;

            let score = 'aspiration: loop {
                let score = self.root_search(depth, alpha, beta);
                if self.stop() {
                    break 'aspiration score;
                }

                if score <= alpha {
                    // Fail low: widen downward, two strikes open the bound.
                    fails_low += 1;
                    alpha = if fails_low >= 2 || score.abs() >= MATE_IN_MAX_PLY {
                        NEG_INFINITE
                    } else {
                        (score - delta).max(NEG_INFINITE)
                    };
                    self.publish_iteration(depth, score, ScoreKind::UpperBound);
                } else if score >= beta {
                    fails_high += 1;
                    beta = if fails_high >= 2 || score.abs() >= MATE_IN_MAX_PLY {
                        INFINITE
                    } else {
                        (score + delta).min(INFINITE)
                    };
                    self.publish_iteration(depth, score, ScoreKind::LowerBound);
                } else {
                    break 'aspiration score;
                }
                delta += delta / 2;
            };

            if self.stop() {
                break 'deepening;
            }

            last_score = score;
            self.root_moves.sort_by_key(|rm| -rm.score);

            let kind = if score.abs() >= MATE_IN_MAX_PLY {
                ScoreKind::Mate
            } else {
                ScoreKind::Exact
            };
            self.publish_iteration(depth, score, kind);

            // A finished bounded search stops everyone, master or helper.
            if depth >= max_depth {
                ctx.stop.store(true, Ordering::Relaxed);
                break 'deepening;
            }
            if let Some(mate_in_moves) = ctx.limits.mate_limit() {
                if score >= MATE - 2 * mate_in_moves as Value {
                    ctx.stop.store(true, Ordering::Relaxed);
                    break 'deepening;
                }
            }

            if self.main_thread() {
                // Time management between iterations: the pre-emptive stop
                // when the remaining budget no longer covers another
                // iteration, unless a bound score earned an extension.
                let bound = self.ctx.info.snapshot().score_kind.is_bound();
                if !ctx.timer.enough_time_for_another(bound) {
                    ctx.stop.store(true, Ordering::Relaxed);
                    break 'deepening;
                }
                // Nothing to deliberate with a forced reply, unless the GUI
                // asked for analysis.
                if self.root_moves.len() == 1 && !ctx.analyse_mode && ctx.limits.depth_limit().is_none()
                {
                    ctx.stop.store(true, Ordering::Relaxed);
                    break 'deepening;
                }
            }

            // Next iteration orders root moves by their cumulative subtree
            // node counts, descending.
            let shared = Arc::clone(&ctx.root);
            self.root_moves
                .sort_by_key(|rm| u64::MAX - shared.nodes_of(rm.idx));

            depth += 1;
        }

        self.flush_nodes();
    }

    /// Searches all root moves at `depth` plies against `(alpha, beta)`.
    fn root_search(&mut self, depth: u16, mut alpha: Value, beta: Value) -> Value {
        let fractional = depth as i32 * FULL_PLY;
        let orig_alpha = alpha;
        let mut best: Value = NEG_INFINITE;
        let mut best_move = Move::null();
        self.sel_depth = 0;

        for i in 0..self.root_moves.len() {
            let rm = self.root_moves[i];

            if self.main_thread() {
                self.ctx.info.update(|info| {
                    info.current_move = rm.mv;
                    info.current_move_number = i + 1;
                });
            }

            let nodes_before = self.nodes;
            self.board.apply_move(rm.mv);
            let score = if i == 0 {
                let v = self.pv_search(fractional - FULL_PLY, 1, -beta, -alpha, true, false);
                -v
            } else {
                let v = self.pv_search(fractional - FULL_PLY, 1, -alpha - 1, -alpha, true, false);
                let mut s = -v;
                if s > alpha && s < beta {
                    let v = self.pv_search(fractional - FULL_PLY, 1, -beta, -alpha, true, false);
                    s = -v;
                }
                s
            };
            self.board.undo_move();
            self.ctx.root.add_nodes(rm.idx, self.nodes - nodes_before);

            if self.stop() {
                return best;
            }

            self.root_moves[i].score = score;
            if score > best {
                best = score;
                best_move = rm.mv;
                // Keep the best root move in front for the next pass.
                self.root_moves[..=i].rotate_right(1);
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        // Root transposition inserts are serialized across threads.
        if !best_move.is_null() {
            let _guard = self.ctx.root.lock.lock().unwrap();
            let bound = if best >= beta {
                NodeBound::FailHigh
            } else if best <= orig_alpha {
                NodeBound::FailLow
            } else {
                NodeBound::Exact
            };
            self.ctx.tt.store(
                self.board.zobrist(),
                best_move,
                value_to_tt(best, 0) as i16,
                depth as u8,
                bound,
            );
        }
        best
    }

    /// Publishes a completed (or fail-bounded) iteration to the shared
    /// search information record, and lets the master print it.
    fn publish_iteration(&mut self, depth: u16, score: Value, kind: ScoreKind) {
        self.flush_nodes();
        let ctx = &self.ctx;
        let _guard = ctx.root.lock.lock().unwrap();

        // Never regress the published depth; helpers additionally yield ties
        // to the master.
        let current_depth = ctx.info.snapshot().depth;
        if depth < current_depth || (!self.main_thread() && depth == current_depth) {
            return;
        }

        let pv = extract_pv(&self.board, &ctx.tt, depth);
        let pv = if pv.is_empty() && !self.root_moves.is_empty() {
            vec![self.root_moves[0].mv]
        } else {
            pv
        };
        let nodes = ctx.nodes.load(Ordering::Relaxed);
        let elapsed = ctx.timer.elapsed();
        let sel_depth = self.sel_depth;
        let hash_full = ctx.tt.hash_full();
        ctx.info.update(|info| {
            info.depth = depth;
            info.sel_depth = sel_depth.max(depth);
            info.score = score;
            info.score_kind = kind;
            info.pv = pv.clone();
            info.nodes = nodes;
            info.elapsed_ms = elapsed;
            info.stats = format!("hashfull {}", hash_full);
        });
        ctx.info.print_uci();
    }

    /// Flushes locally counted nodes into the shared counter.
    fn flush_nodes(&mut self) {
        if self.nodes > 0 {
            self.ctx.nodes.fetch_add(self.nodes, Ordering::Relaxed);
            self.nodes = 0;
        }
    }

    /// Periodic limit polling on the master thread.
    fn check_limits(&mut self) {
        self.flush_nodes();
        if let Some(limit) = self.ctx.limits.node_limit() {
            if self.ctx.nodes.load(Ordering::Relaxed) >= limit {
                self.ctx.stop.store(true, Ordering::Relaxed);
                return;
            }
        }
        if self.ctx.timer.out_of_time() {
            self.ctx.stop.store(true, Ordering::Relaxed);
        }
    }

    #[inline]
    fn count_node(&mut self) {
        self.nodes += 1;
        if self.main_thread() && self.nodes % LIMIT_CHECK_INTERVAL == 0 {
            self.check_limits();
        }
    }

    #[inline]
    fn eval(&self, alpha: Value, beta: Value) -> Value {
        Evaluation::evaluate(
            &self.board,
            &self.ctx.eval_cache,
            &self.ctx.params,
            alpha,
            beta,
        )
    }

    /// The principal-variation search over fractional depth.
    ///
    /// Returns `BUSY` when `exclusive` was requested and another thread is
    /// expanding this node; returns a discarded score when the stop flag is
    /// observed.
    #[allow(clippy::too_many_arguments)]
    fn pv_search(
        &mut self,
        mut depth: i32,
        dist: u16,
        mut alpha: Value,
        mut beta: Value,
        null_allowed: bool,
        exclusive: bool,
    ) -> Value {
        self.count_node();
        if self.stop() {
            return ZERO;
        }
        let is_pv = beta - alpha > 1;
        let params = Arc::clone(&self.ctx.params);

        // Step 1: claimable draws end the node outright.
        if self.board.fifty_move_rule()
            || self.board.repeated(dist)
            || self.board.insufficient_material()
        {
            return DRAW;
        }
        if dist >= MAX_PLY {
            return self.eval(alpha, beta);
        }

        // Step 2: mate-distance pruning.
        alpha = alpha.max(mated_in(dist));
        beta = beta.min(mate_in(dist + 1));
        if alpha >= beta {
            return alpha;
        }

        // Step 3 would probe endgame tablebases here; no backend is linked,
        // so the probe is permanently disabled.

        let in_check = self.board.in_check();

        // Step 4: check extension.
        if in_check {
            depth += params.check_extension;
        }
        // Step 5: pawn-push extension for a previous move onto the last two
        // relative ranks.
        if let Some(prev) = self.board.last_move() {
            if prev.moved_piece().type_of() == morphy::PieceType::P {
                let rank = prev.player().relative_rank_of_sq(prev.get_dest());
                if rank >= morphy::Rank::R7 {
                    depth += params.pawn_push_extension;
                }
            }
        }

        // Step 6: drop to quiescence past the horizon.
        if depth < FULL_PLY {
            return self.qsearch(alpha, beta, dist, 0);
        }
        let plies = depth / FULL_PLY;

        // Step 7: transposition-table probe.
        let zob = self.board.zobrist();
        let mut tt_move = Move::null();
        if let Some(entry) = self.ctx.tt.probe(zob) {
            tt_move = entry.mv;
            if !is_pv && entry.depth as i32 >= plies {
                let score = value_from_tt(entry.score as Value, dist);
                if entry.bound.cuts(score, alpha, beta) {
                    return score;
                }
            }
            if exclusive
                && plies >= params.node_business_check_min_depth_left
                && entry.busy
            {
                return BUSY;
            }
        }
        let busy_marked =
            plies >= params.node_business_check_min_depth_left && self.ctx.tt.mark_busy(zob);

        let stand_pat = if in_check {
            NONE
        } else {
            self.eval(alpha, beta)
        };

        if !in_check && !is_pv && self.board.non_pawn_material(self.board.turn()) {
            // Step 8: reverse futility / static null-move pruning.
            if plies <= params.reverse_futility_max_depth && beta.abs() < MATE_IN_MAX_PLY {
                let margin = params.reverse_futility_margin(plies);
                if stand_pat - margin >= beta {
                    if busy_marked {
                        self.ctx.tt.clear_busy(zob);
                    }
                    return stand_pat - margin;
                }
            }

            // Razoring: hopeless nodes drop straight into quiescence.
            if plies <= params.razoring_max_depth && stand_pat + params.razoring_margin <= alpha {
                let v = self.qsearch(alpha, alpha + 1, dist, 0);
                if v <= alpha {
                    if busy_marked {
                        self.ctx.tt.clear_busy(zob);
                    }
                    return v;
                }
            }

            // Step 9: null-move pruning. Null moves never chain.
            if null_allowed && plies >= params.null_move_min_depth {
                unsafe {
                    self.board.apply_null_move();
                }
                let reduced = depth - (params.null_move_reduction + 1) * FULL_PLY;
                let v = self.pv_search(reduced, dist + 1, -beta, -beta + 1, false, false);
                let v = -v;
                unsafe {
                    self.board.undo_null_move();
                }
                if self.stop() {
                    if busy_marked {
                        self.ctx.tt.clear_busy(zob);
                    }
                    return ZERO;
                }
                if v >= beta && v.abs() < MATE_IN_MAX_PLY {
                    if busy_marked {
                        self.ctx.tt.clear_busy(zob);
                    }
                    return beta;
                }
            }
        }

        // Step 10: internal iterative deepening at PV nodes without a hash
        // move.
        if is_pv && tt_move.is_null() && plies >= params.iid_min_depth {
            let reduced = depth - params.iid_reduction * FULL_PLY;
            self.pv_search(reduced, dist, alpha, beta, false, false);
            if self.stop() {
                if busy_marked {
                    self.ctx.tt.clear_busy(zob);
                }
                return ZERO;
            }
            if let Some(entry) = self.ctx.tt.probe(zob) {
                tt_move = entry.mv;
            }
        }

        // Step 11: the move loop.
        let list = self.board.generate_moves();
        if list.is_empty() {
            if busy_marked {
                self.ctx.tt.clear_busy(zob);
            }
            // Step 14: mate or stalemate.
            return if in_check { mated_in(dist) } else { DRAW };
        }
        if list.len() == 1 && !self.ctx.analyse_mode {
            depth += params.single_reply_extension;
        }

        let killers = self.killers.get(dist);
        let mut picker = MovePicker::new(&self.board, &list, tt_move, killers, self.history);

        let prev_capture_sq: Option<SQ> = self
            .board
            .last_move()
            .filter(|m| m.is_capture())
            .map(|m| m.get_dest());

        let orig_alpha = alpha;
        let mut best: Value = NEG_INFINITE;
        let mut best_move = Move::null();
        let mut moves_played: usize = 0;
        let mut deferred: [Move; MAX_DEFERRED] = [Move::null(); MAX_DEFERRED];
        let mut deferred_len: usize = 0;

        while let Some(mv) = picker.next() {
            let result = self.search_one(
                mv,
                depth,
                dist,
                alpha,
                beta,
                in_check,
                is_pv,
                stand_pat,
                prev_capture_sq,
                moves_played,
                true,
            );
            match result {
                MoveResult::Pruned => {
                    moves_played += 1;
                    continue;
                }
                MoveResult::Busy => {
                    // The subtree is being expanded elsewhere; retry after
                    // the main pass.
                    if deferred_len < MAX_DEFERRED {
                        deferred[deferred_len] = mv;
                        deferred_len += 1;
                        continue;
                    }
                    // Buffer full: search it now, non-exclusively.
                    match self.search_one(
                        mv,
                        depth,
                        dist,
                        alpha,
                        beta,
                        in_check,
                        is_pv,
                        stand_pat,
                        prev_capture_sq,
                        moves_played,
                        false,
                    ) {
                        MoveResult::Score(score) => {
                            moves_played += 1;
                            if self.stop() {
                                if busy_marked {
                                    self.ctx.tt.clear_busy(zob);
                                }
                                return ZERO;
                            }
                            if score > best {
                                best = score;
                                best_move = mv;
                                if score > alpha {
                                    alpha = score;
                                }
                            }
                        }
                        _ => unreachable!(),
                    }
                    if alpha >= beta {
                        break;
                    }
                }
                MoveResult::Score(score) => {
                    moves_played += 1;
                    if self.stop() {
                        if busy_marked {
                            self.ctx.tt.clear_busy(zob);
                        }
                        return ZERO;
                    }
                    if score > best {
                        best = score;
                        best_move = mv;
                        if score > alpha {
                            alpha = score;
                            if alpha >= beta {
                                break;
                            }
                        }
                    }
                }
            }
        }

        // Deferred retry pass, non-exclusive this time.
        let mut i = 0;
        while i < deferred_len && alpha < beta {
            let mv = deferred[i];
            i += 1;
            match self.search_one(
                mv,
                depth,
                dist,
                alpha,
                beta,
                in_check,
                is_pv,
                stand_pat,
                prev_capture_sq,
                moves_played,
                false,
            ) {
                MoveResult::Score(score) => {
                    moves_played += 1;
                    if self.stop() {
                        if busy_marked {
                            self.ctx.tt.clear_busy(zob);
                        }
                        return ZERO;
                    }
                    if score > best {
                        best = score;
                        best_move = mv;
                        if score > alpha {
                            alpha = score;
                        }
                    }
                }
                MoveResult::Pruned => {
                    moves_played += 1;
                }
                MoveResult::Busy => unreachable!(),
            }
        }

        // Steps 12 and 13: store the result. The store replaces the slot,
        // implicitly dropping any busy mark we held. Killers and history
        // were already credited inside `search_one` on the cutoff.
        if alpha >= beta {
            self.ctx.tt.store(
                zob,
                best_move,
                value_to_tt(beta, dist) as i16,
                plies.min(255) as u8,
                NodeBound::FailHigh,
            );
            return beta;
        }

        if best == NEG_INFINITE {
            // Nothing was actually searched (stop races); report the bound
            // we came in with rather than storing garbage.
            if busy_marked {
                self.ctx.tt.clear_busy(zob);
            }
            return alpha;
        }

        let bound = if best > orig_alpha {
            NodeBound::Exact
        } else {
            NodeBound::FailLow
        };
        self.ctx.tt.store(
            zob,
            best_move,
            value_to_tt(best, dist) as i16,
            plies.min(255) as u8,
            bound,
        );
        best
    }

    /// Credits a quiet cutoff move to the killer and history tables.
    fn finish_cutoff(&mut self, mv: Move, dist: u16) {
        if !mv.is_null() && mv.is_quiet() {
            self.killers.store(dist, mv);
            self.history
                .record_success(mv, self.ctx.params.history_success_bonus);
        }
    }

    /// Searches a single move from the current node: extensions, futility
    /// pruning, PVS window handling and late-move reductions.
    #[allow(clippy::too_many_arguments)]
    fn search_one(
        &mut self,
        mv: Move,
        depth: i32,
        dist: u16,
        alpha: Value,
        beta: Value,
        in_check: bool,
        is_pv: bool,
        stand_pat: Value,
        prev_capture_sq: Option<SQ>,
        moves_played: usize,
        may_be_exclusive: bool,
    ) -> MoveResult {
        let params = &self.ctx.params;
        let plies = depth / FULL_PLY;

        // Recapture extension.
        let mut ext = 0;
        if mv.is_capture() && prev_capture_sq == Some(mv.get_dest()) {
            ext += params.recapture_extension;
        }

        let gives_check = self.board.gives_check(mv);

        // Futility pruning of quiet moves at shallow, calm nodes.
        if !is_pv
            && !in_check
            && !gives_check
            && mv.is_quiet()
            && ext == 0
            && moves_played > 0
            && plies <= params.futility_max_depth
            && stand_pat != NONE
            && alpha.abs() < MATE_IN_MAX_PLY
            && stand_pat + params.futility_margin(plies) <= alpha
        {
            self.history.record_attempt(mv);
            self.history.record_failure(mv);
            return MoveResult::Pruned;
        }

        if mv.is_quiet() {
            self.history.record_attempt(mv);
        }

        let new_depth = depth - FULL_PLY + ext;
        let child_exclusive = may_be_exclusive
            && moves_played > 0
            && self.ctx.thread_count > 1
            && plies >= params.node_business_check_min_depth_left;

        self.board.apply_move(mv);
        self.ctx.tt.prefetch(self.board.zobrist());

        let score = if moves_played == 0 {
            let v = self.pv_search(new_depth, dist + 1, -beta, -alpha, true, false);
            -v
        } else {
            // Late-move reduction for quiet, unexciting moves.
            let mut reduction = 0;
            if !is_pv
                && !in_check
                && !gives_check
                && mv.is_quiet()
                && ext == 0
                && moves_played >= params.min_moves_searched_for_lmr
            {
                reduction = params.late_move_reduction
                    + params.extra_late_move_reduction
                        * plies.min(params.extra_late_move_reduction_depth_limit)
                        / (params.extra_late_move_reduction_depth_limit + 1);
            }

            let v = self.pv_search(
                new_depth - reduction,
                dist + 1,
                -alpha - 1,
                -alpha,
                true,
                child_exclusive,
            );
            if v == BUSY {
                self.board.undo_move();
                return MoveResult::Busy;
            }
            let mut s = -v;

            // A reduced search that raised alpha is repeated at full depth.
            if s > alpha && reduction > 0 {
                let v = self.pv_search(new_depth, dist + 1, -alpha - 1, -alpha, true, false);
                s = -v;
            }
            // A null-window fail inside the window is re-searched wide.
            if s > alpha && s < beta {
                let v = self.pv_search(new_depth, dist + 1, -beta, -alpha, true, false);
                s = -v;
            }
            s
        };

        self.board.undo_move();

        if score >= beta && mv.is_quiet() && !self.stop() {
            self.finish_cutoff(mv, dist);
        }
        MoveResult::Score(score)
    }

    /// Quiescence search: stand pat plus tactical noise, with SEE and delta
    /// pruning, full evasions while in check, and a hard ply cap.
    fn qsearch(&mut self, mut alpha: Value, beta: Value, dist: u16, qdepth: u16) -> Value {
        self.count_node();
        if self.stop() {
            return ZERO;
        }
        self.sel_depth = self.sel_depth.max(dist);

        if self.board.fifty_move_rule()
            || self.board.repeated(dist)
            || self.board.insufficient_material()
        {
            return DRAW;
        }

        let in_check = self.board.in_check();
        if dist >= MAX_PLY || qdepth >= MAX_QUIESCENCE_PLY {
            return if in_check {
                DRAW
            } else {
                self.eval(alpha, beta)
            };
        }

        let mut best;
        let stand_pat;
        if in_check {
            best = NEG_INFINITE;
            stand_pat = NEG_INFINITE;
        } else {
            stand_pat = self.eval(alpha, beta);
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            best = stand_pat;
        }

        let list = if in_check {
            self.board.generate_moves()
        } else {
            self.board.generate_moves_of_type(GenTypes::Captures)
        };
        if in_check && list.is_empty() {
            return mated_in(dist);
        }

        let params = Arc::clone(&self.ctx.params);
        let mut picker = MovePicker::new_quiescence(&list);
        while let Some(mv) = picker.next() {
            if !in_check {
                // Delta pruning: skip material-losing captures and captures
                // that cannot lift the score near alpha even if won cleanly.
                let see = self.board.see(mv);
                if see < 0 {
                    continue;
                }
                if stand_pat + see <= alpha - params.delta_pruning_margin {
                    continue;
                }
            }

            self.board.apply_move(mv);
            let v = self.qsearch(-beta, -alpha, dist + 1, qdepth + 1);
            let score = -v;
            self.board.undo_move();

            if self.stop() {
                return ZERO;
            }
            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        best
    }
}

/// Outcome of searching one move at a node.
enum MoveResult {
    Score(Value),
    Pruned,
    Busy,
}

/// Walks the transposition table's best-move chain from the given position
/// to recover the principal variation.
pub fn extract_pv(board: &Board, tt: &TranspositionTable, max_len: u16) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut board = board.shallow_clone();
    for _ in 0..max_len.min(MAX_PLY) {
        let entry = match tt.probe(board.zobrist()) {
            Some(e) => e,
            None => break,
        };
        if entry.mv.is_null() {
            break;
        }
        // The stored move must still be legal here; a hash collision or a
        // stale entry otherwise derails the walk.
        let legal = board.generate_moves();
        if !legal.contains(entry.mv) {
            break;
        }
        board.apply_move(entry.mv);
        pv.push(entry.mv);
        if board.repeated(board.depth()) {
            break;
        }
    }
    pv
}
