//! Protocol sequences and comparison pairs.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// One protocol variant: an ordered sequence of scan and recon entries.
///
/// Invariant: recon-job entries immediately follow the main scan they
/// belong to, with no intervening main scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub name: String,
    pub entries: Vec<Entry>,
}

impl Protocol {
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }
}

/// Two protocol snapshots aligned for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolPair {
    pub protocols: [Protocol; 2],
    /// True when only one protocol was supplied and it occupies both
    /// slots. The merge logic runs unchanged; the sink renders a single
    /// data column.
    pub single: bool,
}

impl ProtocolPair {
    pub fn new(first: Protocol, second: Protocol) -> Self {
        Self {
            protocols: [first, second],
            single: false,
        }
    }

    /// Duplicate one protocol into both slots so the two-column merge
    /// logic can run unchanged. The self-comparison is intentional.
    pub fn single(protocol: Protocol) -> Self {
        Self {
            protocols: [protocol.clone(), protocol],
            single: true,
        }
    }

    pub fn entries(&self, slot: usize) -> &[Entry] {
        &self.protocols[slot].entries
    }

    pub fn names(&self) -> [&str; 2] {
        [
            self.protocols[0].name.as_str(),
            self.protocols[1].name.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_duplicates_both_slots() {
        let protocol = Protocol::new("Abdomen", vec![Entry::new()]);
        let pair = ProtocolPair::single(protocol.clone());
        assert!(pair.single);
        assert_eq!(pair.protocols[0], protocol);
        assert_eq!(pair.protocols[1], protocol);
    }
}
