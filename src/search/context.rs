use crate::board::Piece;
use crate::moves::types::Move;

const HISTORY_MAX: i32 = 16384;
const PIECE_COUNT: usize = 6;
const SQUARE_COUNT: usize = 64;
const PIECE_SQ: usize = PIECE_COUNT * SQUARE_COUNT;

#[inline]
fn piece_sq_index(piece: Piece, sq_index: u8) -> usize {
    piece as usize * SQUARE_COUNT + sq_index as usize
}

/// Combined index for a (prior move, this move) pair, shared by the
/// counter-move-history and follow-up-history tables — both are keyed the
/// same way, just on a different "prior move" (one ply back vs. two).
#[inline]
fn combined_index(prior: Move, piece: Piece, to_index: u8) -> usize {
    piece_sq_index(prior.piece, prior.to.index()) * PIECE_SQ + piece_sq_index(piece, to_index)
}

pub struct SearchContext {
    pub killer_moves: Vec<[Option<Move>; 2]>,
    pub history: [[i32; 64]; 64],
    pub counter_moves: [[Option<Move>; 64]; 64],
    /// Indexed by `(prev.piece, prev.to, mv.piece, mv.to)` — how well `mv`
    /// answers the specific piece/destination the opponent just played,
    /// not just its own geometry.
    counter_history: Vec<i32>,
    /// Same shape as `counter_history` but keyed on the mover's OWN move
    /// two plies ago, rewarding a quiet move that continues a plan its own
    /// previous move started rather than just replying to the opponent.
    followup_history: Vec<i32>,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchContext {
    pub fn new() -> Self {
        Self {
            killer_moves: vec![[None; 2]; 64],
            history: [[0; 64]; 64],
            counter_moves: [[None; 64]; 64],
            counter_history: vec![0; PIECE_SQ * PIECE_SQ],
            followup_history: vec![0; PIECE_SQ * PIECE_SQ],
        }
    }

    pub fn update_killer(&mut self, ply: usize, mv: Move) {
        if self.killer_moves[ply][0] != Some(mv) {
            self.killer_moves[ply][1] = self.killer_moves[ply][0];
            self.killer_moves[ply][0] = Some(mv);
        }
    }

    /// Gravity-style update: moves toward `bonus` instead of accumulating
    /// without bound, so a move that stops cutting off decays back down
    /// rather than keeping a score it earned ply's ago forever.
    fn apply_bonus(entry: &mut i32, bonus: i32) {
        let decay = *entry * bonus.abs() / HISTORY_MAX;
        *entry += bonus - decay;
        *entry = (*entry).clamp(-HISTORY_MAX, HISTORY_MAX);
    }

    pub fn update_history(&mut self, mv: Move, depth: i32) {
        let bonus = (depth * depth).min(400);
        Self::apply_bonus(
            &mut self.history[mv.from.index() as usize][mv.to.index() as usize],
            bonus,
        );
    }

    /// Penalizes a quiet move that was tried but did not cause a cutoff,
    /// so alternatives that keep failing sink relative to ones that work.
    pub fn penalize_history(&mut self, mv: Move, depth: i32) {
        let malus = -(depth * depth).min(400);
        Self::apply_bonus(
            &mut self.history[mv.from.index() as usize][mv.to.index() as usize],
            malus,
        );
    }

    pub fn update_counter_move(&mut self, prev: Option<Move>, mv: Move) {
        if let Some(prev) = prev {
            self.counter_moves[prev.from.index() as usize][prev.to.index() as usize] = Some(mv);
        }
    }

    pub fn counter_move(&self, prev: Option<Move>) -> Option<Move> {
        prev.and_then(|p| self.counter_moves[p.from.index() as usize][p.to.index() as usize])
    }

    pub fn update_counter_history(&mut self, prev: Option<Move>, mv: Move, depth: i32) {
        if let Some(prev) = prev {
            let bonus = (depth * depth).min(400);
            let idx = combined_index(prev, mv.piece, mv.to.index());
            Self::apply_bonus(&mut self.counter_history[idx], bonus);
        }
    }

    pub fn penalize_counter_history(&mut self, prev: Option<Move>, mv: Move, depth: i32) {
        if let Some(prev) = prev {
            let malus = -(depth * depth).min(400);
            let idx = combined_index(prev, mv.piece, mv.to.index());
            Self::apply_bonus(&mut self.counter_history[idx], malus);
        }
    }

    pub fn counter_history_score(&self, prev: Option<Move>, mv: Move) -> i32 {
        match prev {
            Some(p) => self.counter_history[combined_index(p, mv.piece, mv.to.index())],
            None => 0,
        }
    }

    pub fn update_followup_history(&mut self, two_ply_prior: Option<Move>, mv: Move, depth: i32) {
        if let Some(prior) = two_ply_prior {
            let bonus = (depth * depth).min(400);
            let idx = combined_index(prior, mv.piece, mv.to.index());
            Self::apply_bonus(&mut self.followup_history[idx], bonus);
        }
    }

    pub fn penalize_followup_history(&mut self, two_ply_prior: Option<Move>, mv: Move, depth: i32) {
        if let Some(prior) = two_ply_prior {
            let malus = -(depth * depth).min(400);
            let idx = combined_index(prior, mv.piece, mv.to.index());
            Self::apply_bonus(&mut self.followup_history[idx], malus);
        }
    }

    pub fn followup_history_score(&self, two_ply_prior: Option<Move>, mv: Move) -> i32 {
        match two_ply_prior {
            Some(p) => self.followup_history[combined_index(p, mv.piece, mv.to.index())],
            None => 0,
        }
    }
}
