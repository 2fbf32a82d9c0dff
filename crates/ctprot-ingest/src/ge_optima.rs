//! GE Optima extractor: brace-delimited `key = value` text exports.
//!
//! A file holds `Series {` blocks; each series holds `Group {` blocks (one
//! per acquisition) which in turn hold `Recon {` blocks. A group with
//! `groupType = Scout` is a localizer. Recon blocks without a usable
//! series description are scanner bookkeeping and are dropped.

use std::fs;
use std::path::Path;

use ctprot_model::{Entry, Protocol};
use tracing::debug;

use crate::apply;
use crate::error::{IngestError, Result};
use crate::lookup::LookupSet;

const SERIES_MARKER: &str = "Series {";
const GROUP_MARKER: &str = "Group {";
const RECON_MARKER: &str = "Recon {";
const SCOUT_MARKER: &str = "groupType = Scout";

fn protocol_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn marker_positions(lines: &[&str], marker: &str) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(marker))
        .map(|(index, _)| index)
        .collect()
}

/// Consecutive slices starting at each marker line.
fn split_blocks<'a>(lines: &[&'a str], marker: &str) -> Vec<Vec<&'a str>> {
    let starts = marker_positions(lines, marker);
    starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(lines.len());
            lines[start..end].to_vec()
        })
        .collect()
}

fn is_blank_description(value: Option<&str>) -> bool {
    value.is_none_or(|text| text.replace('"', "").trim().is_empty())
}

/// Extract one protocol from a GE text file.
pub fn extract(path: &Path, tables: &LookupSet) -> Result<Protocol> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let series_blocks = split_blocks(&lines, SERIES_MARKER);
    if series_blocks.is_empty() {
        return Err(IngestError::Malformed {
            path: path.to_path_buf(),
            detail: format!("no `{SERIES_MARKER}` blocks"),
        });
    }
    debug!(path = %path.display(), series = series_blocks.len(), "parsed GE protocol");

    let mut entries = Vec::new();
    for (series_no, series) in series_blocks.iter().enumerate() {
        for (group_no, group) in split_blocks(series, GROUP_MARKER).iter().enumerate() {
            let context = format!(
                "{} series {} group {}",
                path.display(),
                series_no + 1,
                group_no + 1
            );
            // Group lines first so a key present in both scopes resolves
            // to the acquisition value, then the series-level fallback.
            let mut scope: Vec<&str> = group.clone();
            scope.extend(series.iter().copied());

            if group.iter().any(|line| line.contains(SCOUT_MARKER)) {
                let mut entry = Entry::new();
                apply::line_table(&tables.localizer, &scope, &mut entry, &context)?;
                entries.push(entry);
                continue;
            }

            let mut scan = Entry::new();
            apply::line_table(&tables.scan, &scope, &mut scan, &context)?;
            entries.push(scan);

            for (recon_no, recon_block) in split_blocks(group, RECON_MARKER).iter().enumerate() {
                let recon_context = format!("{context} recon {}", recon_no + 1);
                let mut recon_scope: Vec<&str> = recon_block.clone();
                recon_scope.extend(group.iter().copied());

                let mut recon = Entry::new();
                match apply::line_table(&tables.recon, &recon_scope, &mut recon, &recon_context) {
                    Ok(()) if is_blank_description(recon.get("Series Description")) => {
                        debug!(context = %recon_context, "dropping recon without description");
                    }
                    Ok(()) => entries.push(recon),
                    Err(IngestError::MissingParameter { parameter, .. })
                        if parameter == "Series Description" =>
                    {
                        debug!(context = %recon_context, "dropping recon without description");
                    }
                    Err(error) => return Err(error),
                }
            }
        }
    }
    Ok(Protocol::new(protocol_name(path), entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = "Series {\n\
        seriesDescription = \"Chest Routine\"\n\
        Group {\n\
        groupType = Scout\n\
        scanType = \"Scout\"\n\
        kv = 120\n\
        ma = 10\n\
        }\n\
        Group {\n\
        groupType = Axial\n\
        scanType = \"Helical\"\n\
        kv = 120\n\
        ma = 250\n\
        rotationTime = 0.5\n\
        pitch = 0.984\n\
        sliceThickness = 0.625\n\
        scanFov = \"Large Body\"\n\
        Recon {\n\
        seriesDescription = \"AXIAL 2.5mm\"\n\
        iterReconType = \"ASIR\"\n\
        iterReconStrength = \"30%\"\n\
        reconKernel = \"Standard\"\n\
        reconFov = 360\n\
        }\n\
        Recon {\n\
        seriesDescription = \"\"\n\
        iterReconType = \"ASIR\"\n\
        iterReconStrength = \"30%\"\n\
        reconKernel = \"Standard\"\n\
        reconFov = 360\n\
        }\n\
        }\n\
        }\n";

    fn write_fixture(text: &str) -> tempfile::TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn scout_group_becomes_a_localizer_entry() {
        let path = write_fixture(FIXTURE);
        let protocol = extract(&path, &LookupSet::ge_optima()).unwrap();
        assert_eq!(protocol.entries[0].get("Group Type"), Some("Scout"));
        // Series-level fallback for keys missing from the group.
        assert_eq!(
            protocol.entries[0].get("Series Description"),
            Some("\"Chest Routine\"")
        );
    }

    #[test]
    fn blank_description_recons_are_dropped() {
        let path = write_fixture(FIXTURE);
        let protocol = extract(&path, &LookupSet::ge_optima()).unwrap();
        // Scout, main scan, and exactly one of the two recons.
        assert_eq!(protocol.entries.len(), 3);
        assert_eq!(
            protocol.entries[2].get("Series Description"),
            Some("\"AXIAL 2.5mm\"")
        );
        assert_eq!(protocol.entries[2].get("Iter.Recon Type"), Some("\"ASIR\""));
    }

    #[test]
    fn group_value_wins_over_series_value() {
        let text = "Series {\n\
            kv = 80\n\
            seriesDescription = \"S\"\n\
            Group {\n\
            groupType = Scout\n\
            scanType = \"Scout\"\n\
            kv = 120\n\
            ma = 10\n\
            }\n\
            }\n";
        let path = write_fixture(text);
        let protocol = extract(&path, &LookupSet::ge_optima()).unwrap();
        assert_eq!(protocol.entries[0].get("kVp"), Some("120"));
    }
}
