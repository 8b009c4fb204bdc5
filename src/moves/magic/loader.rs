use crate::moves::magic::precompute::{MagicTableSeed, generate_magic_tables};
use crate::moves::magic::structs::MagicTables;
use once_cell::sync::OnceCell;

#[cfg(feature = "deterministic_magic")]
const FIXED_MAGIC_SEED: u64 = 0x1F2E_3D4C_5B6A_7988;

fn build_tables() -> MagicTables {
    #[cfg(feature = "deterministic_magic")]
    {
        generate_magic_tables(MagicTableSeed::Fixed(FIXED_MAGIC_SEED))
            .expect("deterministic magic search should always converge")
    }
    #[cfg(not(feature = "deterministic_magic"))]
    {
        generate_magic_tables(MagicTableSeed::Random)
            .expect("magic number search should always converge")
    }
}

/// Returns the process-wide rook/bishop magic tables, generating them once on
/// first use and reusing the same search result for the lifetime of the
/// process. Gated behind the `load_magic` feature so callers that want a
/// fresh table per call (tests exercising the search itself) can generate one
/// directly via [`generate_magic_tables`] instead.
#[cfg(feature = "load_magic")]
pub fn load_magic_tables() -> MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(build_tables).clone()
}

#[cfg(not(feature = "load_magic"))]
pub fn load_magic_tables() -> MagicTables {
    build_tables()
}
