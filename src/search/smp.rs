//! Lazy-SMP scheduling: plain OS threads race independent searches of the
//! same position against a shared transposition table. There is no work
//! distribution or stealing — each thread just runs the regular
//! `alpha_beta` search, and the shared table is what lets them cooperate,
//! since a helper's TT writes speed up the main thread's probes and vice
//! versa.

use crate::board::Board;
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::search::{TimeManager, search};
use crate::search::tt::TranspositionTable;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Depth offsets applied to helper threads so they explore slightly
/// different trees than the main thread rather than duplicating its work
/// move for move.
const HELPER_DEPTH_OFFSETS: [i32; 8] = [0, 1, 2, 3, 3, 4, 4, 5];

/// Runs a lazy-SMP search and returns the main thread's result — the
/// authoritative move, since only thread 0 searches the exact requested
/// depth sequence.
pub fn think(
    board: &Board,
    tables: &MagicTables,
    tt: Arc<TranspositionTable>,
    max_depth: i32,
    time_limit: Option<Duration>,
    num_threads: usize,
) -> (i32, Option<Move>) {
    let num_threads = num_threads.max(1);
    tt.new_search();

    let stop_signal = Arc::new(AtomicBool::new(false));

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_threads.saturating_sub(1));

        for helper_id in 1..num_threads {
            let tt = Arc::clone(&tt);
            let stop_signal = Arc::clone(&stop_signal);
            let mut helper_board = board.clone();
            let offset = HELPER_DEPTH_OFFSETS[(helper_id - 1) % HELPER_DEPTH_OFFSETS.len()];
            let helper_depth = (max_depth + offset).max(1);

            handles.push(scope.spawn(move || {
                let mut ctx = SearchContext::new();
                let mut time = TimeManager::with_stop_flag(time_limit, stop_signal);
                search(
                    &mut helper_board,
                    tables,
                    &tt,
                    &mut ctx,
                    helper_depth,
                    &mut time,
                );
            }));
        }

        let mut main_board = board.clone();
        let mut main_ctx = SearchContext::new();
        let mut main_time = TimeManager::with_stop_flag(time_limit, Arc::clone(&stop_signal));
        let result = search(
            &mut main_board,
            tables,
            &tt,
            &mut main_ctx,
            max_depth,
            &mut main_time,
        );

        // Main thread finished its allotted depth (or ran out of time):
        // signal every helper to stop and join them before returning.
        stop_signal.store(true, Ordering::Relaxed);
        for handle in handles {
            let _ = handle.join();
        }

        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::loader::load_magic_tables;

    #[test]
    fn single_thread_think_finds_a_legal_move() {
        let board = Board::new();
        let tables = load_magic_tables();
        let tt = Arc::new(TranspositionTable::new(1));
        let (_, mv) = think(
            &board,
            &tables,
            tt,
            4,
            Some(Duration::from_millis(200)),
            1,
        );
        assert!(mv.is_some());
    }

    #[test]
    fn multi_thread_think_finds_a_legal_move() {
        let board = Board::new();
        let tables = load_magic_tables();
        let tt = Arc::new(TranspositionTable::new(1));
        let (_, mv) = think(
            &board,
            &tables,
            tt,
            4,
            Some(Duration::from_millis(200)),
            3,
        );
        assert!(mv.is_some());
    }
}
