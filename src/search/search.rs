use crate::board::Board;
use crate::moves::execute::{
    generate_legal, make_move_basic, make_null_move, undo_move_basic, undo_null_move,
};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::static_eval;
use crate::search::picker::MovePicker;
use crate::search::see::SeeExt;
use crate::search::tt::{NodeType, TranspositionTable, score_from_tt, score_to_tt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const INF: i32 = 32000;
const MATE_SCORE: i32 = 31000;
const MATE_THRESHOLD: i32 = MATE_SCORE - 1000; // 30000 - buffer for mate distance
const MAX_Q_SEARCH_DEPTH: usize = 100;
const DRAW_SCORE: i32 = -50;
const PAWN_VAL: i32 = 82;

// --- Tuning Constants ---

// Reverse Futility Pruning (RFP)
const RFP_DEPTH_LIMIT: i32 = 9;
const RFP_MARGIN_BASE: i32 = 80;
const RFP_MARGIN_MULT: i32 = 90;

// Razoring
const RAZOR_MARGIN: i32 = 300;

// Futility Pruning (FP)
const FP_DEPTH_LIMIT: i32 = 7;
const FP_MARGIN_BASE: i32 = 100;
const FP_MARGIN_MULT: i32 = 100;
const FP_HISTORY_THRESHOLD: i32 = 512;

// Late Move Pruning (LMP)
const LMP_DEPTH_LIMIT: i32 = 14;
const LMP_BASE_MOVES: i32 = 3;
const LMP_MOVE_MULTIPLIER: i32 = 6;

// Late Move Reduction (LMR)
const LMR_MIN_DEPTH: i32 = 2;
const LMR_MIN_MOVES: i32 = 4;

// Null Move Pruning
const NULL_MOVE_VERIFY_DEPTH: i32 = 10;

// Probcut
const PROBCUT_DEPTH_LIMIT: i32 = 4;
const PROBCUT_MARGIN: i32 = 160;

// Singular extensions
const SINGULAR_DEPTH_LIMIT: i32 = 8;
const SINGULAR_TT_DEPTH_MARGIN: i32 = 3;

/// Shared wall-clock budget plus a stop flag every lazy-SMP helper thread
/// polls. The flag is `Arc`-shared rather than per-instance so the main
/// thread finishing first (or a `stop` UCI command) halts every helper.
pub struct TimeManager {
    pub start_time: Instant,
    pub allotted: Option<Duration>,
    pub stop_signal: Arc<AtomicBool>,
}

impl TimeManager {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_stop_flag(limit: Option<Duration>, stop_signal: Arc<AtomicBool>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal,
        }
    }

    #[inline(always)]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn check_time(&mut self) {
        if self.should_stop() {
            return;
        }

        if let Some(limit) = self.allotted {
            let elapsed = self.start_time.elapsed();

            // Hard Stop: Abort immediately if we hit the limit
            if elapsed >= limit {
                self.stop_signal.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Returns the allocated time limit
    #[inline(always)]
    pub fn allocated_time(&self) -> Option<Duration> {
        self.allotted
    }

    /// Returns elapsed time since search started
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Quiescence search. `qdepth` counts plies of recursion *within*
/// quiescence itself (0 at the node where `alpha_beta` first drops into
/// it) and is distinct from `ply`, which keeps counting full-search plies
/// from the root — it's what gates the one-time quiet-check sweep below.
#[allow(clippy::too_many_arguments, clippy::only_used_in_recursion)]
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &TranspositionTable,
    ply: usize,
    qdepth: u32,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    // SAFETY BRAKE: Prevent Q-search explosions
    if ply > MAX_Q_SEARCH_DEPTH {
        return static_eval(board, tables, alpha, beta);
    }

    let in_check_now = in_check(board, board.side_to_move, tables);

    // In check, standing pat is meaningless — we might be getting mated, so
    // every evasion has to be examined rather than assumed "at least this
    // good". Fall back to full legal move generation (no capture/SEE
    // filtering, since a check response is rarely a pure sideline capture).
    if in_check_now {
        let mut moves = Vec::with_capacity(64);
        let mut scratch = Vec::with_capacity(64);
        generate_legal(board, tables, &mut moves, &mut scratch);

        if moves.is_empty() {
            return -MATE_SCORE + ply as i32;
        }

        for mv in moves {
            *nodes += 1;
            if *nodes & 63 == 0 {
                time.check_time();
            }
            if time.should_stop() {
                return alpha;
            }

            let undo = make_move_basic(board, mv);
            let score = -quiescence(
                board,
                tables,
                ctx,
                tt,
                ply + 1,
                qdepth + 1,
                -beta,
                -alpha,
                nodes,
                time,
            );
            undo_move_basic(board, undo);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        return alpha;
    }

    let stand_pat = static_eval(board, tables, alpha, beta);

    if stand_pat >= beta {
        return beta;
    }
    if stand_pat >= alpha {
        alpha = stand_pat;
    }

    // Use MovePicker in captures-only mode for quiescence
    let empty_killers = [None, None];
    let mut picker = MovePicker::new(None, empty_killers, true);

    while let Some(mv) = picker.next(board, tables, &ctx.history) {
        *nodes += 1;
        if *nodes & 63 == 0 {
            time.check_time();
        }
        if time.should_stop() {
            return stand_pat;
        }

        let mut captured_value = 0;
        if let Some(piece) = board.piece_type_at(mv.to) {
            captured_value = piece.value();
        }

        // DELTA PRUNING SAFETY
        // Don't prune if it's a promotion (potentially huge value)
        // Don't prune if it's En Passant (captured_value is 0, but it captures a pawn)
        let is_prom = mv.is_promotion();
        let is_ep = mv.is_en_passant();

        // "Blindness" Fix: Only prune standard captures.
        if !is_prom && !is_ep && stand_pat + captured_value + 200 < alpha {
            continue;
        }

        // SEE Pruning: Skip captures that lose material
        // Note: MovePicker already filters bad captures for us, but we keep this
        // for promotions and en passant which bypass SEE classification
        if !is_prom && !is_ep && !board.static_exchange_eval(mv, 0, tables) {
            continue;
        }

        let undo = make_move_basic(board, mv);
        let score = -quiescence(
            board,
            tables,
            ctx,
            tt,
            ply + 1,
            qdepth + 1,
            -beta,
            -alpha,
            nodes,
            time,
        );
        undo_move_basic(board, undo);

        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    // Quiet checks only at the first quiescence ply: captures are exhausted
    // above, so fold in non-capture moves that give check — a quiet check
    // can open a forced sequence standing pat would otherwise hide, and
    // allowing it only at qdepth 0 keeps the search from exploding.
    if qdepth == 0 {
        let mut moves = Vec::with_capacity(64);
        let mut scratch = Vec::with_capacity(64);
        generate_legal(board, tables, &mut moves, &mut scratch);

        for mv in moves {
            if mv.is_capture() || mv.is_promotion() {
                continue;
            }

            let undo = make_move_basic(board, mv);
            let gives_check = in_check(board, board.side_to_move, tables);
            if !gives_check {
                undo_move_basic(board, undo);
                continue;
            }

            *nodes += 1;
            if *nodes & 63 == 0 {
                time.check_time();
            }
            if time.should_stop() {
                undo_move_basic(board, undo);
                return alpha;
            }

            let score = -quiescence(
                board,
                tables,
                ctx,
                tt,
                ply + 1,
                qdepth + 1,
                -beta,
                -alpha,
                nodes,
                time,
            );
            undo_move_basic(board, undo);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
    }

    alpha
}

#[allow(clippy::too_many_arguments, clippy::only_used_in_recursion)]
pub fn alpha_beta(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &TranspositionTable,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
    allow_null: bool,
    excluded_move: Option<Move>,
    prev_move: Option<Move>,
    two_ply_move: Option<Move>,
) -> (i32, Option<Move>) {
    // Check every 64 nodes instead of waiting on a longer mask for tighter control
    if *nodes & 63 == 0 {
        time.check_time();
    }

    if time.should_stop() {
        return (0, None);
    }
    *nodes += 1;

    // Repetition & TT probing
    if ply > 0 && board.is_repetition() {
        return (DRAW_SCORE, None);
    }

    // MATE-DISTANCE PRUNING
    // No line from here can deliver or avoid mate faster than the ply count
    // already guarantees, so tighten alpha/beta to the feasible mating
    // range before spending any work on a TT probe.
    if ply > 0 {
        alpha = alpha.max(-MATE_SCORE + ply as i32);
        beta = beta.min(MATE_SCORE - ply as i32);
        if alpha >= beta {
            return (alpha, None);
        }
    }

    let hash = board.zobrist;
    let mut hash_move = None;
    let mut tt_hit = None;

    // A singular-extension probe searches the same position with one move
    // excluded; that search must not also read the hash entry the outer
    // search is about to (re-)write, so it skips the TT cutoff entirely.
    if excluded_move.is_none() {
        tt_hit = tt.probe(hash, board);
        if let Some(hit) = tt_hit {
            if let Some(tm) = hit.best_move {
                hash_move = Some(tm);
            }

            if hit.depth as i32 >= depth {
                let tt_score = score_from_tt(hit.score, ply as i32);

                if ply > 0 {
                    match hit.bound {
                        NodeType::Exact => return (tt_score, hit.best_move),
                        NodeType::LowerBound if tt_score >= beta => {
                            return (tt_score, hit.best_move);
                        }
                        NodeType::UpperBound if tt_score <= alpha => {
                            return (tt_score, hit.best_move);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    let in_check_now = in_check(board, board.side_to_move, tables);

    // FIX 6: CHECK EXTENSION
    // If we are in check, extend the search by 1 ply.
    // This resolves forced mates and prevents the horizon effect.
    let extension = if in_check_now { 1 } else { 0 };

    if depth <= 0 && !in_check_now {
        let score = quiescence(board, tables, ctx, tt, ply, 0, alpha, beta, nodes, time);
        return (score, None);
    }

    // [STEP 1] Calculate Eval Early
    // We lift this out so both RFP and SFP can share it.
    let static_eval_val = if !in_check_now {
        static_eval(board, tables, alpha, beta)
    } else {
        0 // Dummy value, we won't use it if in check
    };

    let is_pv = beta - alpha > 1;

    // [STEP 2] Update Reverse Futility Pruning (RFP) to use the variable
    if depth < RFP_DEPTH_LIMIT && !in_check_now && ply > 0 {
        let margin = RFP_MARGIN_BASE + RFP_MARGIN_MULT * depth;
        if static_eval_val - margin >= beta {
            return (beta, None);
        }
    }

    // =============================================================
    // RAZORING
    // At the shallowest depths, a static eval this far below alpha is
    // essentially never going to recover in a full-width search — drop
    // straight to quiescence instead of spending a ply confirming it.
    // =============================================================
    if depth < 2 && !is_pv && !in_check_now && static_eval_val + RAZOR_MARGIN <= alpha {
        let score = quiescence(board, tables, ctx, tt, ply, 0, alpha, beta, nodes, time);
        return (score, None);
    }

    // =============================================================
    // NULL MOVE PRUNING
    // R grows with depth and with how far the static eval already clears
    // beta, so a position that's crushing gets pruned harder.
    // =============================================================
    if allow_null
        && depth >= 4
        && !in_check_now
        && board.has_major_pieces(board.side_to_move)
        && static_eval_val >= beta
    {
        let eval_margin = ((static_eval_val - beta) / PAWN_VAL).clamp(0, 3);
        let r = 3 + depth / 4 + eval_margin;

        let undo = make_null_move(board);

        let (val, _) = alpha_beta(
            board,
            tables,
            ctx,
            tt,
            depth - r - 1,
            ply + 1,
            -beta,
            -beta + 1,
            nodes,
            time,
            false,
            None,
            None,
            None,
        );
        let mut score = -val;
        undo_null_move(board, undo);

        if score >= beta && !time.should_stop() {
            if score >= MATE_THRESHOLD {
                score = beta; // Don't trust mate scores from a null-move line
            }

            // Verification: at high depth, confirm the cutoff still holds
            // with null-move pruning disabled for this subtree.
            if depth >= NULL_MOVE_VERIFY_DEPTH {
                let (verify, _) = alpha_beta(
                    board, tables, ctx, tt, depth - r, ply, alpha, beta, nodes, time, false, None,
                    prev_move, two_ply_move,
                );
                if verify >= beta {
                    return (beta, None);
                }
            } else {
                return (beta, None);
            }
        }
    }

    // =============================================================
    // PROBCUT
    // A capture that beats a raised beta by a wide margin in a reduced
    // search almost always beats the real beta too — confirm that cheaply
    // before committing every capture to a full-depth search.
    // =============================================================
    if depth > PROBCUT_DEPTH_LIMIT
        && !in_check_now
        && excluded_move.is_none()
        && beta.abs() < MATE_THRESHOLD
    {
        let rbeta = beta + PROBCUT_MARGIN;
        let see_threshold = rbeta - static_eval_val;
        let mut pc_picker = MovePicker::new(None, [None, None], true);

        while let Some(mv) = pc_picker.next(board, tables, &ctx.history) {
            if !board.static_exchange_eval(mv, see_threshold, tables) {
                continue;
            }

            let undo = make_move_basic(board, mv);
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - PROBCUT_DEPTH_LIMIT,
                ply + 1,
                -rbeta,
                -rbeta + 1,
                nodes,
                time,
                true,
                None,
                Some(mv),
                prev_move,
            );
            let score = -val;
            undo_move_basic(board, undo);

            if time.should_stop() {
                return (0, None);
            }

            if score >= rbeta {
                return (score, Some(mv));
            }
        }
    }

    // Use MovePicker for staged move generation
    let mut picker = MovePicker::new(hash_move, ctx.killer_moves[ply], false);

    let mut best_move = None;
    let mut best_score = -INF;
    let original_alpha = alpha;
    let mut move_count = 0;
    let mut quiets_tried: Vec<Move> = Vec::new();

    while let Some(mv) = picker.next(board, tables, &ctx.history) {
        if Some(mv) == excluded_move {
            continue;
        }

        // [STEP 3] OPTIMIZED FUTILITY PRUNING
        // Logic: If the move is quiet and our position is hopelessly below Alpha, skip it.
        if depth < FP_DEPTH_LIMIT
            && !in_check_now
            && !mv.is_capture()
            && !mv.is_promotion()
            && move_count > 0
        {
            let margin = FP_MARGIN_BASE + FP_MARGIN_MULT * depth;

            // HISTORY PROTECTION (The Optimization):
            // We retrieve the history score for this move.
            let history = ctx.history[mv.from.index() as usize][mv.to.index() as usize];

            // If the move has a high history score (> 2000), it has been good in other nodes.
            // We should NOT prune it, even if static eval says it's bad.
            if history < FP_HISTORY_THRESHOLD && static_eval_val + margin <= alpha {
                continue; // PRUNE: Skip to next move
            }
        }

        // =========================================================
        // LATE MOVE PRUNING (LMP)
        // =========================================================
        // Logic: If we have searched many quiet moves and haven't found a
        // good one yet, it's highly unlikely the remaining (unsorted) moves
        // will be any better. Just cut them off.
        if depth < LMP_DEPTH_LIMIT
            && !in_check_now
            && !mv.is_capture()
            && !mv.is_promotion()
            && alpha == original_alpha
        {
            let lmp_threshold = LMP_BASE_MOVES + LMP_MOVE_MULTIPLIER * depth;
            if move_count > lmp_threshold as usize {
                break;
            }
        }
        // =========================================================

        // =========================================================
        // SINGULAR EXTENSION
        // If the hash move is the only move that doesn't immediately fall
        // well below the hash entry's own score, it's "singular" — extend
        // the search by a ply instead of letting a razor-thin margin hide
        // a forced line. Probed on the pre-move position, so it must run
        // before `make_move_basic`.
        // =========================================================
        let mut move_extension = extension;
        if move_count == 0
            && depth >= SINGULAR_DEPTH_LIMIT
            && excluded_move.is_none()
            && Some(mv) == hash_move
            && let Some(hit) = tt_hit
            && hit.bound != NodeType::UpperBound
            && (hit.depth as i32) >= depth - SINGULAR_TT_DEPTH_MARGIN
        {
            let hit_score = score_from_tt(hit.score, ply as i32);
            if hit_score.abs() < MATE_THRESHOLD {
                let singular_beta = hit_score - 2 * depth;
                let (singular_score, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    (depth - 1) / 2,
                    ply,
                    singular_beta - 1,
                    singular_beta,
                    nodes,
                    time,
                    false,
                    Some(mv),
                    prev_move,
                    two_ply_move,
                );
                if singular_score < singular_beta {
                    move_extension += 1;
                }
            }
        }

        let undo = make_move_basic(board, mv);
        let mut score;

        if move_count == 0 {
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 + move_extension,
                ply + 1,
                -beta,
                -alpha,
                nodes,
                time,
                true,
                None,
                Some(mv),
                prev_move,
            );
            score = -val;
        } else {
            // =========================================================
            // LATE MOVE REDUCTION
            // =========================================================
            let mut r = 0;
            if depth > LMR_MIN_DEPTH
                && move_count > LMR_MIN_MOVES as usize
                && !mv.is_capture()
                && !mv.is_promotion()
                && !in_check_now
            // Don't reduce if we are escaping check!
            {
                r = 1 + (depth / 8) + (move_count as i32 / 20);

                let history = ctx.history[mv.from.index() as usize][mv.to.index() as usize];
                if history > FP_HISTORY_THRESHOLD {
                    r -= 1; // Trust history
                }

                // PV Node Safety: if we're in a PV node (open window), reduce less
                if is_pv {
                    r -= 1;
                }

                if r < 0 {
                    r = 0;
                }
                if r > depth - 2 {
                    r = depth - 2; // Leave at least depth 1
                }
            }

            // Perform the Reduced Search (Zero Window)
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 - r,
                ply + 1,
                -alpha - 1,
                -alpha,
                nodes,
                time,
                true,
                None,
                Some(mv),
                prev_move,
            );
            score = -val;

            // Re-search if the reduced search found a surprisingly good move
            if score > alpha && r > 0 {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    nodes,
                    time,
                    true,
                    None,
                    Some(mv),
                    prev_move,
                );
                score = -val;
            }

            if score > alpha && score < beta {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1 + extension,
                    ply + 1,
                    -beta,
                    -alpha,
                    nodes,
                    time,
                    true,
                    None,
                    Some(mv),
                    prev_move,
                );
                score = -val;
            }
        }

        undo_move_basic(board, undo);
        move_count += 1;

        if !mv.is_capture() && !mv.is_promotion() {
            quiets_tried.push(mv);
        }

        if time.should_stop() {
            return (0, None);
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
            }
            if score >= beta {
                if excluded_move.is_none() {
                    let tt_score = score_to_tt(beta, ply as i32);
                    tt.save(
                        hash,
                        Some(mv),
                        tt_score,
                        static_eval_val,
                        depth as i8,
                        NodeType::LowerBound,
                    );
                }

                if !mv.is_capture() {
                    ctx.update_killer(ply, mv);

                    let bonus = depth * depth;
                    ctx.update_history(mv, bonus);
                    ctx.update_counter_move(prev_move, mv);
                    ctx.update_counter_history(prev_move, mv, depth);
                    ctx.update_followup_history(two_ply_move, mv, depth);

                    // Quiets that were tried and failed to cut off take a
                    // malus, so history reflects relative, not just
                    // cumulative, success.
                    for &quiet in quiets_tried.iter().filter(|&&q| q != mv) {
                        ctx.penalize_history(quiet, depth);
                        ctx.penalize_counter_history(prev_move, quiet, depth);
                        ctx.penalize_followup_history(two_ply_move, quiet, depth);
                    }
                }

                return (beta, Some(mv));
            }
        }
    }

    // No legal moves found - checkmate or stalemate
    if move_count == 0 {
        if excluded_move.is_some() {
            // Every legal move was excluded for the singular probe: treat
            // as "nothing beats the excluded move" rather than mate.
            return (alpha, None);
        }
        if in_check_now {
            return (-MATE_SCORE + ply as i32, None);
        }
        return (0, None);
    }

    if time.should_stop() {
        return (0, None);
    }

    let node_type = if best_score >= beta {
        NodeType::LowerBound
    } else if best_score > original_alpha {
        NodeType::Exact
    } else {
        NodeType::UpperBound
    };

    if excluded_move.is_none() {
        let tt_score = score_to_tt(best_score, ply as i32);
        tt.save(
            hash,
            best_move,
            tt_score,
            static_eval_val,
            depth as i8,
            node_type,
        );
    }

    (best_score, best_move)
}

pub fn search(
    board: &mut Board,
    tables: &MagicTables,
    tt: &TranspositionTable,
    ctx: &mut SearchContext,
    max_depth: i32,
    time: &mut TimeManager,
) -> (i32, Option<Move>) {
    let mut last_completed_best_move = None;
    let mut last_completed_best_score = 0;
    let mut nodes = 0u64;
    let mut last_iter_duration = Duration::from_millis(0);

    for depth in 1..=max_depth {
        let iter_start = Instant::now();

        // --- ITERATIVE DEEPENING SAFETY CHECK ---
        // Predict if we can afford the next depth before starting it.
        // Conservative estimate: Next depth takes ~3x longer than previous.
        if depth > 1
            && let Some(limit) = time.allocated_time()
        {
            let total_elapsed = time.elapsed();
            let predicted_next = last_iter_duration * 3;

            if total_elapsed + predicted_next > limit {
                break;
            }
        }
        // -----------------------------------------

        for from in 0..64 {
            for to in 0..64 {
                ctx.history[from][to] /= 8;
            }
        }

        // --- Aspiration Window Logic ---
        let mut alpha = -INF;
        let mut beta = INF;
        let window = 50; // Window size (50cp)

        // Only apply aspiration windows at depth > 4 for stability
        if depth > 4 {
            alpha = last_completed_best_score - window;
            beta = last_completed_best_score + window;
        }

        let mut score;
        let mut mv;

        loop {
            let result = alpha_beta(
                board, tables, ctx, tt, depth, 0, alpha, beta, &mut nodes, time, true, None, None,
                None,
            );

            score = result.0;
            mv = result.1;

            if time.should_stop() {
                break;
            }

            // Fail Low: widen alpha downwards, keep beta for stability.
            if score <= alpha {
                alpha = -INF;
                continue;
            }

            // Fail High: widen beta upwards, keep alpha for stability.
            if score >= beta {
                beta = INF;
                continue;
            }

            break;
        }
        // -------------------------------

        last_iter_duration = iter_start.elapsed();

        // CRITICAL FIX: If the stop signal was triggered, DO NOT update the best move.
        if time.should_stop() {
            break;
        }

        last_completed_best_score = score;
        last_completed_best_move = mv;

        if let Some(valid_mv) = last_completed_best_move {
            let score_str = if last_completed_best_score.abs() >= MATE_THRESHOLD {
                let moves = (MATE_SCORE - last_completed_best_score.abs() + 1) / 2;
                if last_completed_best_score > 0 {
                    format!("mate {}", moves)
                } else {
                    format!("mate -{}", moves)
                }
            } else {
                format!("cp {}", last_completed_best_score)
            };

            let elapsed_ms = time.start_time.elapsed().as_millis().max(1);
            let nps = (nodes as u128 * 1000) / elapsed_ms;

            println!(
                "info depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {} pv {}",
                depth,
                depth,
                score_str,
                nodes,
                nps,
                tt.hashfull(),
                elapsed_ms,
                valid_mv.to_uci()
            );
        }

        // Optimization: If we found a mate, stop searching deeper
        if score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    (last_completed_best_score, last_completed_best_move)
}
