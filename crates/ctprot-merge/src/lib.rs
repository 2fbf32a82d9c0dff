//! Structure analysis and the section merge engine.
//!
//! The core of the protocol comparison tool: [`structure::classify`]
//! digests one protocol sequence into section counts, and [`engine::merge`]
//! walks two classified sequences in lockstep to produce the ordered
//! render-instruction stream the report crate turns into a workbook.

pub mod engine;
pub mod error;
pub mod structure;

pub use engine::merge;
pub use error::{MergeError, Result};
pub use structure::{ReconPair, SectionCounts, classify, pair_recon_counts};
