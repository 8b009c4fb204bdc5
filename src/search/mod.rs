pub mod context;
pub mod eval;
pub mod material;
pub mod ordering;
pub mod pesto;
pub mod picker;
pub mod search;
pub mod see;
pub mod smp;
pub mod tt;
