//! Snapshot-folder discovery and pairing.
//!
//! A batch comparison takes two protocol-tree snapshots (for example a
//! before and an after export) and compares files that exist in both,
//! matched by relative path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, Result};

/// One protocol present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    /// Path relative to either snapshot root.
    pub relative: PathBuf,
    pub first: PathBuf,
    pub second: PathBuf,
}

/// Result of pairing two snapshot folders.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPairs {
    pub common: Vec<SnapshotPair>,
    pub only_first: Vec<PathBuf>,
    pub only_second: Vec<PathBuf>,
}

fn collect_files(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if path.is_file() {
            // Relative path is the pairing key across both snapshots.
            if let Ok(relative) = path.strip_prefix(root) {
                out.insert(relative.to_path_buf(), path.clone());
            }
        }
    }
    Ok(())
}

/// Recursively pair the protocol files of two snapshot folders.
pub fn pair_snapshots(first_dir: &Path, second_dir: &Path) -> Result<SnapshotPairs> {
    for dir in [first_dir, second_dir] {
        if !dir.is_dir() {
            return Err(IngestError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
    }

    let mut first = BTreeMap::new();
    collect_files(first_dir, first_dir, &mut first)?;
    let mut second = BTreeMap::new();
    collect_files(second_dir, second_dir, &mut second)?;

    let mut pairs = SnapshotPairs::default();
    for (relative, first_path) in first {
        match second.remove(&relative) {
            Some(second_path) => pairs.common.push(SnapshotPair {
                relative,
                first: first_path,
                second: second_path,
            }),
            None => pairs.only_first.push(relative),
        }
    }
    pairs.only_second.extend(second.into_keys());

    debug!(
        common = pairs.common.len(),
        only_first = pairs.only_first.len(),
        only_second = pairs.only_second.len(),
        "paired snapshots"
    );
    Ok(pairs)
}
