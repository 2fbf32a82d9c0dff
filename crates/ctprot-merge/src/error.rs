use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// A recon pairing slot with no main scan on either side indicates an
    /// analyzer bug, not missing input data, so it is fatal.
    #[error("recon pairing slot {index} is absent on both sides; structure analysis is inconsistent")]
    PairingInvariant { index: usize },
}

pub type Result<T> = std::result::Result<T, MergeError>;
