//! Intermediate JSON interchange.
//!
//! Extraction and rendering are separate steps; the interchange file holds
//! one or two extracted protocols as a JSON array so a comparison can be
//! re-rendered (or inspected) without re-parsing the vendor files.

use std::fs;
use std::path::Path;

use ctprot_model::{Protocol, ProtocolPair};

use crate::error::{IngestError, Result};

/// Write protocols to an interchange file.
pub fn write_interchange(path: &Path, protocols: &[Protocol]) -> Result<()> {
    let json = serde_json::to_string_pretty(protocols).map_err(|source| {
        IngestError::InterchangeJson {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an interchange file into a comparison pair.
///
/// A single-protocol file yields a self-comparison pair; anything other
/// than one or two protocols is rejected.
pub fn read_interchange(path: &Path) -> Result<ProtocolPair> {
    let json = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut protocols: Vec<Protocol> =
        serde_json::from_str(&json).map_err(|source| IngestError::InterchangeJson {
            path: path.to_path_buf(),
            source,
        })?;

    match protocols.len() {
        1 => Ok(ProtocolPair::single(protocols.remove(0))),
        2 => {
            let second = protocols.remove(1);
            Ok(ProtocolPair::new(protocols.remove(0), second))
        }
        count => Err(IngestError::ProtocolCount {
            path: path.to_path_buf(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctprot_model::Entry;

    fn protocol(name: &str) -> Protocol {
        let mut entry = Entry::new();
        entry.push("Range", "\"Abdomen\"");
        entry.push("kVp", "120");
        Protocol::new(name, vec![entry])
    }

    #[test]
    fn pair_round_trips_with_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.json");
        write_interchange(&path, &[protocol("before"), protocol("after")]).unwrap();

        let pair = read_interchange(&path).unwrap();
        assert!(!pair.single);
        assert_eq!(pair.names(), ["before", "after"]);
        let fields: Vec<&str> = pair.entries(0)[0].fields().map(|(key, _)| key).collect();
        assert_eq!(fields, vec!["Range", "kVp"]);
    }

    #[test]
    fn single_protocol_becomes_a_self_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.json");
        write_interchange(&path, &[protocol("only")]).unwrap();

        let pair = read_interchange(&path).unwrap();
        assert!(pair.single);
        assert_eq!(pair.names(), ["only", "only"]);
    }

    #[test]
    fn empty_and_oversized_arrays_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");

        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            read_interchange(&path).unwrap_err(),
            IngestError::ProtocolCount { count: 0, .. }
        ));

        write_interchange(&path, &[protocol("a"), protocol("b"), protocol("c")]).unwrap();
        assert!(matches!(
            read_interchange(&path).unwrap_err(),
            IngestError::ProtocolCount { count: 3, .. }
        ));
    }
}
