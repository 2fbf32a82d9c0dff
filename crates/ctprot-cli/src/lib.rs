//! CLI library components for the CT protocol comparator.

pub mod logging;
