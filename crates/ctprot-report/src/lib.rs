//! xlsx rendering for protocol comparisons.

mod styles;
pub mod workbook;

pub use workbook::write_workbook;
