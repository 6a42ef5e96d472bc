//! Desugaring passes (spec §4.6): `with_desugar` runs before type checking,
//! `closure_inline` runs after.

pub mod closure_inline;
pub mod errors;
pub mod with_desugar;

pub use closure_inline::ClosureInliner;
pub use errors::DesugarError;
pub use with_desugar::desugar_program;
