//! Mixed-radix material index: a compact encoding of "how many of each minor
//! and major piece does each side have" used to look up phase, a static
//! imbalance bonus, and known-draw status in one array read instead of
//! recomputing them from the board every node.
use crate::board::{Board, Color, Piece};
use once_cell::sync::OnceCell;

const PAWN_RADIX: u32 = 9; // 0..=8
const MINOR_RADIX: u32 = 3; // 0..=2
const ROOK_RADIX: u32 = 3; // 0..=2
const QUEEN_RADIX: u32 = 2; // 0..=1

const KNIGHT_PHASE: i32 = 1;
const BISHOP_PHASE: i32 = 1;
const ROOK_PHASE: i32 = 2;
const QUEEN_PHASE: i32 = 4;
const TOTAL_PHASE: i32 = 24;

const BISHOP_PAIR_BONUS: i16 = 30;
const ROOK_REDUNDANCY_PENALTY: i16 = -10;
const KNIGHT_REDUNDANCY_PENALTY: i16 = -8;

pub const TABLE_SIZE: usize =
    (PAWN_RADIX * PAWN_RADIX * MINOR_RADIX.pow(4) * ROOK_RADIX * ROOK_RADIX * QUEEN_RADIX * QUEEN_RADIX) as usize;

/// Per-index precomputed facts: midgame phase weight (0..=24), a static
/// material imbalance bonus in centipawns (bishop pair, piece redundancy),
/// and whether this exact material count is a known theoretical draw
/// regardless of piece placement.
#[derive(Debug, Clone, Copy)]
pub struct MaterialEntry {
    pub phase: u8,
    pub imbalance_mg: i16,
    pub known_draw: bool,
}

struct Counts {
    pawn: [u32; 2],
    knight: [u32; 2],
    bishop: [u32; 2],
    rook: [u32; 2],
    queen: [u32; 2],
}

fn clamp_radix(count: u32, radix: u32) -> u32 {
    count.min(radix - 1)
}

/// Encodes the board's piece counts into the mixed-radix material index.
/// Counts beyond each radix's ceiling (e.g. 3+ queens from underpromotion)
/// saturate at the top bucket rather than overflowing into the next field.
pub fn encode_material_index(board: &Board) -> u32 {
    let counts = Counts {
        pawn: [
            board.pieces(Piece::Pawn, Color::White).count_ones(),
            board.pieces(Piece::Pawn, Color::Black).count_ones(),
        ],
        knight: [
            board.pieces(Piece::Knight, Color::White).count_ones(),
            board.pieces(Piece::Knight, Color::Black).count_ones(),
        ],
        bishop: [
            board.pieces(Piece::Bishop, Color::White).count_ones(),
            board.pieces(Piece::Bishop, Color::Black).count_ones(),
        ],
        rook: [
            board.pieces(Piece::Rook, Color::White).count_ones(),
            board.pieces(Piece::Rook, Color::Black).count_ones(),
        ],
        queen: [
            board.pieces(Piece::Queen, Color::White).count_ones(),
            board.pieces(Piece::Queen, Color::Black).count_ones(),
        ],
    };
    encode_counts(&counts)
}

fn encode_counts(c: &Counts) -> u32 {
    let pw = clamp_radix(c.pawn[0], PAWN_RADIX);
    let pb = clamp_radix(c.pawn[1], PAWN_RADIX);
    let nw = clamp_radix(c.knight[0], MINOR_RADIX);
    let nb = clamp_radix(c.knight[1], MINOR_RADIX);
    let bw = clamp_radix(c.bishop[0], MINOR_RADIX);
    let bb = clamp_radix(c.bishop[1], MINOR_RADIX);
    let rw = clamp_radix(c.rook[0], ROOK_RADIX);
    let rb = clamp_radix(c.rook[1], ROOK_RADIX);
    let qw = clamp_radix(c.queen[0], QUEEN_RADIX);
    let qb = clamp_radix(c.queen[1], QUEEN_RADIX);

    let mut idx = pw;
    idx = idx * PAWN_RADIX + pb;
    idx = idx * MINOR_RADIX + nw;
    idx = idx * MINOR_RADIX + nb;
    idx = idx * MINOR_RADIX + bw;
    idx = idx * MINOR_RADIX + bb;
    idx = idx * ROOK_RADIX + rw;
    idx = idx * ROOK_RADIX + rb;
    idx = idx * QUEEN_RADIX + qw;
    idx = idx * QUEEN_RADIX + qb;
    idx
}

fn decode_counts(mut idx: u32) -> Counts {
    let qb = idx % QUEEN_RADIX;
    idx /= QUEEN_RADIX;
    let qw = idx % QUEEN_RADIX;
    idx /= QUEEN_RADIX;
    let rb = idx % ROOK_RADIX;
    idx /= ROOK_RADIX;
    let rw = idx % ROOK_RADIX;
    idx /= ROOK_RADIX;
    let bb = idx % MINOR_RADIX;
    idx /= MINOR_RADIX;
    let bw = idx % MINOR_RADIX;
    idx /= MINOR_RADIX;
    let nb = idx % MINOR_RADIX;
    idx /= MINOR_RADIX;
    let nw = idx % MINOR_RADIX;
    idx /= MINOR_RADIX;
    let pb = idx % PAWN_RADIX;
    idx /= PAWN_RADIX;
    let pw = idx % PAWN_RADIX;

    Counts {
        pawn: [pw, pb],
        knight: [nw, nb],
        bishop: [bw, bb],
        rook: [rw, rb],
        queen: [qw, qb],
    }
}

fn build_entry(c: &Counts) -> MaterialEntry {
    let phase_material = (c.knight[0] + c.knight[1]) as i32 * KNIGHT_PHASE
        + (c.bishop[0] + c.bishop[1]) as i32 * BISHOP_PHASE
        + (c.rook[0] + c.rook[1]) as i32 * ROOK_PHASE
        + (c.queen[0] + c.queen[1]) as i32 * QUEEN_PHASE;
    let phase = phase_material.clamp(0, TOTAL_PHASE) as u8;

    let mut imbalance_mg = 0i16;
    for side in 0..2 {
        let sign: i16 = if side == 0 { 1 } else { -1 };
        if c.bishop[side] >= 2 {
            imbalance_mg += sign * BISHOP_PAIR_BONUS;
        }
        if c.rook[side] >= 2 {
            imbalance_mg += sign * ROOK_REDUNDANCY_PENALTY;
        }
        if c.knight[side] >= 2 {
            imbalance_mg += sign * KNIGHT_REDUNDANCY_PENALTY;
        }
    }

    let non_pawn_major = c.rook[0] + c.rook[1] + c.queen[0] + c.queen[1];
    let non_pawn_minor = c.knight[0] + c.knight[1] + c.bishop[0] + c.bishop[1];
    let no_pawns = c.pawn[0] == 0 && c.pawn[1] == 0;
    let known_draw = no_pawns && non_pawn_major == 0 && non_pawn_minor <= 1;

    MaterialEntry {
        phase,
        imbalance_mg,
        known_draw,
    }
}

fn build_table() -> Vec<MaterialEntry> {
    (0..TABLE_SIZE as u32)
        .map(|idx| build_entry(&decode_counts(idx)))
        .collect()
}

/// Process-wide material table, indexed by [`encode_material_index`]. Built
/// once on first use, the same way [`crate::hash::zobrist::zobrist_keys`] is.
pub fn material_table() -> &'static [MaterialEntry] {
    static TABLE: OnceCell<Vec<MaterialEntry>> = OnceCell::new();
    TABLE.get_or_init(build_table)
}

/// Looks up `(phase, imbalance_mg, known_draw)` for a material index.
pub fn phase_and_imbalance(material_index: u32) -> (u8, i16, bool) {
    let entry = &material_table()[material_index as usize];
    (entry.phase, entry.imbalance_mg, entry.known_draw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_index_round_trips_through_counts() {
        let board = Board::new();
        let idx = encode_material_index(&board);
        let decoded = decode_counts(idx);
        assert_eq!(decoded.pawn, [8, 8]);
        assert_eq!(decoded.knight, [2, 2]);
        assert_eq!(decoded.bishop, [2, 2]);
        assert_eq!(decoded.rook, [2, 2]);
        assert_eq!(decoded.queen, [1, 1]);
    }

    #[test]
    fn startpos_phase_is_full() {
        let board = Board::new();
        let idx = encode_material_index(&board);
        let (phase, _, known_draw) = phase_and_imbalance(idx);
        assert_eq!(phase, 24);
        assert!(!known_draw);
    }

    #[test]
    fn bare_kings_is_known_draw() {
        let board: Board = "8/8/4k3/8/8/8/4K3/8 w - - 0 1".parse().unwrap();
        let idx = encode_material_index(&board);
        let (_, _, known_draw) = phase_and_imbalance(idx);
        assert!(known_draw);
    }

    #[test]
    fn lone_minor_vs_king_is_known_draw() {
        let board: Board = "8/8/4k3/8/3N4/8/4K3/8 w - - 0 1".parse().unwrap();
        let idx = encode_material_index(&board);
        let (_, _, known_draw) = phase_and_imbalance(idx);
        assert!(known_draw);
    }

    #[test]
    fn rook_vs_king_is_not_known_draw() {
        let board: Board = "8/8/4k3/8/3R4/8/4K3/8 w - - 0 1".parse().unwrap();
        let idx = encode_material_index(&board);
        let (_, _, known_draw) = phase_and_imbalance(idx);
        assert!(!known_draw);
    }

    #[test]
    fn clamp_radix_saturates_at_ceiling() {
        assert_eq!(clamp_radix(5, QUEEN_RADIX), QUEEN_RADIX - 1);
    }
}
