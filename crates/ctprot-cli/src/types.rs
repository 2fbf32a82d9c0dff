//! Result types shared between batch commands and the summary printer.

use std::path::PathBuf;

/// Outcome of one protocol comparison within a batch run.
pub struct PairOutcome {
    /// Protocol path relative to the snapshot roots.
    pub relative: PathBuf,
    /// Workbook path when the comparison succeeded.
    pub output: Option<PathBuf>,
    /// Failure detail when it did not.
    pub error: Option<String>,
}

/// Outcome of a full batch run.
pub struct BatchOutcome {
    pub output_dir: PathBuf,
    pub pairs: Vec<PairOutcome>,
    /// Protocol files present only in the first snapshot.
    pub only_first: Vec<PathBuf>,
    /// Protocol files present only in the second snapshot.
    pub only_second: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn failed_count(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.error.is_some()).count()
    }
}
