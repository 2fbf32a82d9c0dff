//! Siemens Force extractor: hierarchical XML protocol definitions.
//!
//! A protocol file holds one `MlModeEntryType` element per scan entry, in
//! acquisition order. Each entry wraps an `MlModeScanType` with the scan
//! parameters and, for main scans, a list of `MlModeReconType`
//! reconstruction jobs. The first recon of every main scan is the
//! scanner's own real-time QA recon and is not part of the clinical
//! protocol, so it is skipped.

use std::fs;
use std::path::Path;

use ctprot_model::{Entry, Protocol};
use tracing::debug;

use crate::apply;
use crate::error::{IngestError, Result};
use crate::lookup::LookupSet;
use crate::xml::{self, Element};

const LOCALIZER_RANGES: [&str; 3] = ["\"Topogram\"", "\"Topogram LAT\"", "\"Topogram AP\""];

fn protocol_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract one protocol from a Force XML file.
pub fn extract(path: &Path, tables: &LookupSet) -> Result<Protocol> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let root = xml::parse(&text)?;

    let entry_elements = root.find_descendants("MlModeEntryType");
    if entry_elements.is_empty() {
        return Err(IngestError::Malformed {
            path: path.to_path_buf(),
            detail: "no MlModeEntryType entries".into(),
        });
    }
    debug!(path = %path.display(), entries = entry_elements.len(), "parsed Force protocol");

    let mut entries = Vec::new();
    for (index, element) in entry_elements.iter().enumerate() {
        let entry_no = index + 1;
        let context = format!("{} entry {entry_no}", path.display());
        extract_entry(element, entry_no, tables, &context, &mut entries)?;
    }
    Ok(Protocol::new(protocol_name(path), entries))
}

fn extract_entry(
    element: &Element,
    entry_no: usize,
    tables: &LookupSet,
    context: &str,
    out: &mut Vec<Entry>,
) -> Result<()> {
    // Scan parameters live under the entry's MlModeScanType; recon tags
    // would otherwise shadow scan tags in a whole-entry search.
    let scan_scope = element
        .find_descendants("MlModeScanType")
        .first()
        .copied()
        .ok_or_else(|| IngestError::MissingParameter {
            parameter: "MlModeScanType".into(),
            context: context.to_string(),
        })?;
    let range = scan_scope.descendant_text("RangeName").unwrap_or("");
    let range_lower = range.to_lowercase();

    let mut entry = Entry::new();
    entry.push("EntryNo", entry_no.to_string());

    if LOCALIZER_RANGES.contains(&range) {
        apply::xml_table(&tables.localizer, scan_scope, &mut entry, context)?;
        out.push(entry);
    } else if range_lower.contains("monitoring") {
        apply::xml_table(&tables.monitoring, scan_scope, &mut entry, context)?;
        out.push(entry);
    } else if range_lower.contains("control scan") || range_lower.contains("test bolus") {
        // Contrast timing acquisitions use the plain scan vocabulary and
        // never carry clinical recon jobs.
        apply::xml_table(&tables.scan, scan_scope, &mut entry, context)?;
        out.push(entry);
    } else {
        // Main scan. ModeScans="2" marks a dual-energy entry with tube A/B
        // parameters.
        let table = if element.attribute("ModeScans") == Some("2") {
            tables.scan_ab.as_ref().unwrap_or(&tables.scan)
        } else {
            &tables.scan
        };
        apply::xml_table(table, scan_scope, &mut entry, context)?;
        out.push(entry);

        for (job, recon) in element.find_descendants("MlModeReconType").iter().enumerate() {
            if job == 0 {
                continue;
            }
            let recon_context = format!("{context} recon {job}");
            let mut recon_entry = Entry::new();
            recon_entry.push("ReconJob", job.to_string());
            apply::xml_table(&tables.recon, recon, &mut recon_entry, &recon_context)?;
            out.push(recon_entry);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scan_body(range: &str) -> String {
        format!(
            "<RangeName>{range}</RangeName>\
             <QualityReferenceVoltage>120</QualityReferenceVoltage>\
             <Voltage>100</Voltage>\
             <QualityReferencemAs>210</QualityReferencemAs>\
             <EffectiveMAs>180</EffectiveMAs>\
             <AutokVMode>\"On\"</AutokVMode>\
             <Care>\"On\"</Care>\
             <CareDoseType>\"CareDose\"</CareDoseType>\
             <ExposureTimePerRotation>0.5</ExposureTimePerRotation>\
             <StartDelay>4</StartDelay>\
             <PitchFactor>0.6</PitchFactor>\
             <NoOfSlicesEffective>192</NoOfSlicesEffective>\
             <NoOfSlicesActual>96</NoOfSlicesActual>\
             <SliceWidthCollimated>0.6</SliceWidthCollimated>\
             <SpiralFeedRot>34.5</SpiralFeedRot>\
             <FOVLimitForThreshold>500</FOVLimitForThreshold>"
        )
    }

    fn recon_body(description: &str) -> String {
        format!(
            "<SeriesDescription>{description}</SeriesDescription>\
             <SliceEffective>3.0</SliceEffective>\
             <SliceEffectiveTiltCorrected>2.0</SliceEffectiveTiltCorrected>\
             <Kernel>\"Br40\"</Kernel>\
             <WindowName>\"Abdomen\"</WindowName>\
             <ReconMode>\"Spiral\"</ReconMode>\
             <ImageReconType>\"ADMIRE_3\"</ImageReconType>\
             <FoVHorLength>350</FoVHorLength>\
             <FoVVertLength>350</FoVVertLength>"
        )
    }

    fn write_fixture(xml: &str) -> tempfile::TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn main_scan_skips_the_qa_recon() {
        let xml = format!(
            "<MlModeProt>\
               <MlModeEntryType EntryNo=\"1\" ModeScans=\"1\">\
                 <MlModeScanType>{}</MlModeScanType>\
                 <MlModeReconType ReconJob=\"0\">{}</MlModeReconType>\
                 <MlModeReconType ReconJob=\"1\">{}</MlModeReconType>\
                 <MlModeReconType ReconJob=\"2\">{}</MlModeReconType>\
               </MlModeEntryType>\
             </MlModeProt>",
            scan_body("\"Abdomen\""),
            recon_body("\"QA RT\""),
            recon_body("\"Axial 3mm\""),
            recon_body("\"Coronal 2mm\""),
        );
        let path = write_fixture(&xml);
        let protocol = extract(&path, &LookupSet::siemens_force()).unwrap();

        // One scan entry plus two clinical recons; the ReconJob=0 QA recon
        // never appears.
        assert_eq!(protocol.entries.len(), 3);
        assert_eq!(protocol.entries[0].get("EntryNo"), Some("1"));
        assert_eq!(protocol.entries[1].get("ReconJob"), Some("1"));
        assert_eq!(
            protocol.entries[1].get("Series Description"),
            Some("\"Axial 3mm\"")
        );
        assert_eq!(protocol.entries[2].get("ReconJob"), Some("2"));
        assert!(!protocol.entries.iter().any(|e| {
            e.get("Series Description") == Some("\"QA RT\"")
        }));
    }

    #[test]
    fn localizer_uses_the_localizer_table() {
        let xml = "<MlModeProt>\
               <MlModeEntryType EntryNo=\"1\" ModeScans=\"1\">\
                 <MlModeScanType>\
                   <RangeName>\"Topogram\"</RangeName>\
                   <AngleType>\"Top\"</AngleType>\
                   <Voltage>120</Voltage>\
                   <Current>35</Current>\
                   <Kernel>\"T20\"</Kernel>\
                   <SeriesDescription>\"Topogram\"</SeriesDescription>\
                 </MlModeScanType>\
               </MlModeEntryType>\
             </MlModeProt>";
        let path = write_fixture(xml);
        let protocol = extract(&path, &LookupSet::siemens_force()).unwrap();
        assert_eq!(protocol.entries.len(), 1);
        let fields: Vec<&str> = protocol.entries[0].fields().map(|(key, _)| key).collect();
        assert_eq!(
            fields,
            vec![
                "EntryNo",
                "Range",
                "Tube Position (Angle)",
                "kVp",
                "mA",
                "Kernel",
                "Series Description",
            ]
        );
    }

    #[test]
    fn missing_parameter_is_fatal() {
        // Scan body without Voltage.
        let xml = "<MlModeProt>\
               <MlModeEntryType EntryNo=\"1\" ModeScans=\"1\">\
                 <MlModeScanType><RangeName>\"Abdomen\"</RangeName></MlModeScanType>\
               </MlModeEntryType>\
             </MlModeProt>";
        let path = write_fixture(xml);
        let err = extract(&path, &LookupSet::siemens_force()).unwrap_err();
        assert!(matches!(err, IngestError::MissingParameter { .. }));
    }

    #[test]
    fn dual_energy_entry_uses_the_ab_table() {
        let xml = format!(
            "<MlModeProt>\
               <MlModeEntryType EntryNo=\"1\" ModeScans=\"2\">\
                 <MlModeScanType>{}\
                   <AutokVOptiCriteria>\"Vascular\"</AutokVOptiCriteria>\
                   <AutokVVoltageMin>70</AutokVVoltageMin>\
                   <AutokVVoltageMax>150</AutokVVoltageMax>\
                   <FoVMaxFlashTotal>330</FoVMaxFlashTotal>\
                 </MlModeScanType>\
               </MlModeEntryType>\
             </MlModeProt>",
            scan_body("\"DE Abdomen\"")
        );
        let path = write_fixture(&xml);
        let protocol = extract(&path, &LookupSet::siemens_force()).unwrap();
        assert_eq!(protocol.entries[0].get("Auto kV Max"), Some("150"));
    }
}
