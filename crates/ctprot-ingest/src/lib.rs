//! Protocol extraction from vendor CT protocol files.
//!
//! Three source formats are supported: Siemens Force hierarchical XML,
//! Siemens SPECT-CT semi-structured text, and GE Optima brace-delimited
//! text. All three drive their extraction from ordered parameter lookup
//! tables, so the set and order of compared parameters is data, not code.

mod apply;
pub mod discovery;
pub mod error;
pub mod ge_optima;
pub mod interchange;
pub mod lookup;
pub mod siemens_force;
pub mod siemens_spect;
pub mod xml;

pub use discovery::{SnapshotPair, SnapshotPairs, pair_snapshots};
pub use error::{IngestError, Result};
pub use interchange::{read_interchange, write_interchange};
pub use lookup::{LookupRule, LookupSet, LookupTable, MatchRule};
