//! Siemens SPECT-CT extractor: semi-structured key/value text exports.
//!
//! Files are flat line dumps. Each scan entry opens with a line containing
//! `PROTOCOL_ENTRY_NO`; a block mentioning `MlTopo` is a localizer,
//! everything else is a scan block whose reconstruction jobs open with
//! `MlModeRecon_Begin` lines.

use std::fs;
use std::path::Path;

use ctprot_model::{Entry, Protocol};
use tracing::debug;

use crate::apply;
use crate::error::{IngestError, Result};
use crate::lookup::LookupSet;

const ENTRY_MARKER: &str = "PROTOCOL_ENTRY_NO";
const TOPO_MARKER: &str = "MlTopo";
const RECON_MARKER: &str = "MlModeRecon_Begin";

fn protocol_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Indices of lines containing `marker`.
fn marker_positions(lines: &[&str], marker: &str) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(marker))
        .map(|(index, _)| index)
        .collect()
}

/// Extract one protocol from a SPECT-CT text file.
pub fn extract(path: &Path, tables: &LookupSet) -> Result<Protocol> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let lines: Vec<&str> = text.lines().collect();

    let starts = marker_positions(&lines, ENTRY_MARKER);
    if starts.is_empty() {
        return Err(IngestError::Malformed {
            path: path.to_path_buf(),
            detail: format!("no {ENTRY_MARKER} blocks"),
        });
    }
    debug!(path = %path.display(), blocks = starts.len(), "parsed SPECT-CT protocol");

    let mut entries = Vec::new();
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(lines.len());
        let block = &lines[start..end];
        let context = format!("{} block {}", path.display(), index + 1);

        if block.iter().any(|line| line.contains(TOPO_MARKER)) {
            let mut entry = Entry::new();
            apply::line_table(&tables.localizer, block, &mut entry, &context)?;
            entries.push(entry);
            continue;
        }

        let mut scan = Entry::new();
        apply::line_table(&tables.scan, block, &mut scan, &context)?;
        entries.push(scan);

        let recon_starts = marker_positions(block, RECON_MARKER);
        for (job, &recon_start) in recon_starts.iter().enumerate() {
            let recon_end = recon_starts.get(job + 1).copied().unwrap_or(block.len());
            let recon_block = &block[recon_start..recon_end];
            let recon_context = format!("{context} recon {}", job + 1);

            let mut recon = Entry::new();
            recon.push("ReconJob", (job + 1).to_string());
            apply::line_table(&tables.recon, recon_block, &mut recon, &recon_context)?;
            entries.push(recon);
        }
    }
    Ok(Protocol::new(protocol_name(path), entries))
}
