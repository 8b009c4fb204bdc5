use crate::moves::magic::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use crate::moves::magic::search::find_magic_number_for_square;
use crate::moves::magic::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// How to seed the magic-number search's RNG.
pub enum MagicTableSeed {
    /// Deterministic search, used by tests and the `deterministic_magic` feature
    /// so magic numbers (and therefore table layout) are reproducible.
    Fixed(u64),
    /// Seeds from the OS entropy source. Slower to converge since different
    /// runs explore different candidates, but nothing depends on the result
    /// being stable across runs.
    Random,
}

fn make_rng(seed: MagicTableSeed) -> StdRng {
    match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => {
            let mut seed = [0u8; 32];
            rand::rng().fill_bytes(&mut seed);
            StdRng::from_seed(seed)
        }
    }
}

fn rook_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;
    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in (1..rank).rev() {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in (1..file).rev() {
        mask |= 1u64 << (rank * 8 + f);
    }
    mask
}

fn bishop_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;

    let (mut r, mut f) = (rank + 1, file + 1);
    while r <= 6 && f <= 6 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    let (mut r, mut f) = (rank + 1, file - 1);
    while r <= 6 && f >= 1 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    let (mut r, mut f) = (rank - 1, file + 1);
    while r >= 1 && f <= 6 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f += 1;
    }
    let (mut r, mut f) = (rank - 1, file - 1);
    while r >= 1 && f >= 1 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }
    mask
}

/// Scatters the bits of `index` into the set bits of `mask` (Carry-Rippler
/// subset enumeration), producing the `index`th blocker subset of `mask`.
fn occupancy_subset(index: usize, bits_in_mask: u32, mask: u64) -> u64 {
    let mut result = 0u64;
    let mut m = mask;
    for i in 0..bits_in_mask {
        let sq = m.trailing_zeros();
        m &= m - 1;
        if index & (1 << i) != 0 {
            result |= 1u64 << sq;
        }
    }
    result
}

fn build_entry(
    square: usize,
    mask: u64,
    scan: impl Fn(usize, u64) -> u64,
    rng: &mut StdRng,
) -> Result<MagicEntry, String> {
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let size = 1usize << bits;

    let mut blockers = Vec::with_capacity(size);
    let mut attacks = Vec::with_capacity(size);
    for idx in 0..size {
        let blocker = occupancy_subset(idx, bits, mask);
        blockers.push(blocker);
        attacks.push(scan(square, blocker));
    }

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let mut table = vec![0u64; size];
    for idx in 0..size {
        let table_index = (blockers[idx].wrapping_mul(magic) >> shift) as usize;
        table[table_index] = attacks[idx];
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

/// Searches magic numbers for every square and builds the full rook + bishop
/// attack tables. Each attempt degrades gracefully by retrying with the same
/// RNG stream since `find_magic_number_for_square` only fails after exhausting
/// its own attempt budget.
pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = make_rng(seed);

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        let r_mask = rook_mask(square);
        rook_entries.push(build_entry(
            square,
            r_mask,
            rook_attacks_per_square,
            &mut rng,
        )?);

        let b_mask = bishop_mask(square);
        bishop_entries.push(build_entry(
            square,
            b_mask,
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_corner_mask_excludes_edges() {
        let mask = rook_mask(0);
        // a1's rook mask should exclude a8, h1 (the far edge squares).
        assert_eq!(mask & (1u64 << 56), 0);
        assert_eq!(mask & (1u64 << 7), 0);
    }

    #[test]
    fn bishop_center_mask_has_no_edge_squares() {
        let mask = bishop_mask(27); // d4
        for edge in [0u8, 7, 56, 63] {
            assert_eq!(mask & (1u64 << edge), 0);
        }
    }

    #[test]
    fn occupancy_subset_zero_is_empty() {
        let mask = rook_mask(27);
        assert_eq!(occupancy_subset(0, mask.count_ones(), mask), 0);
    }

    #[test]
    fn fixed_seed_builds_full_tables() {
        let tables = generate_magic_tables(MagicTableSeed::Fixed(0x45)).unwrap();
        assert_eq!(tables.rook.entries.len(), 64);
        assert_eq!(tables.bishop.entries.len(), 64);
    }
}
