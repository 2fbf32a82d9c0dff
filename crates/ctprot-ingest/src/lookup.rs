//! Parameter lookup tables.
//!
//! A lookup table maps display names (the field labels shown in the
//! report) to extraction rules, in presentation order. Tables are stored
//! as JSON objects of the form
//! `{"Display Name": ["rule_name", {"pattern": "..."}]}` and can be
//! overridden per run; rule names are resolved against the fixed registry
//! when the table is loaded, so a typo fails the load instead of the
//! extraction.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{IngestError, Result};

/// How a rule locates its value inside a protocol source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// First descendant XML element whose tag equals the pattern; value is
    /// its text content.
    TagText,
    /// First line starting with the pattern; value follows the first `:`.
    LinePrefix,
    /// First line containing the pattern; value follows the first `:`.
    LineContains,
    /// First `key = value` line whose key equals the pattern.
    KeyEquals,
}

impl MatchRule {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tag_text" => Some(Self::TagText),
            "line_prefix" => Some(Self::LinePrefix),
            "line_contains" => Some(Self::LineContains),
            "key_equals" => Some(Self::KeyEquals),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TagText => "tag_text",
            Self::LinePrefix => "line_prefix",
            Self::LineContains => "line_contains",
            Self::KeyEquals => "key_equals",
        }
    }
}

/// One display name with its resolved extraction rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRule {
    pub display: String,
    pub rule: MatchRule,
    pub pattern: String,
}

/// An ordered set of rules for one section kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    pub name: String,
    pub rules: Vec<LookupRule>,
}

/// Raw table shape: `{"Display": ["rule_name", {params}]}` with the object
/// order preserved.
struct RawTable(Vec<(String, (String, BTreeMap<String, String>))>);

impl<'de> Deserialize<'de> for RawTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RawTableVisitor;

        impl<'de> Visitor<'de> for RawTableVisitor {
            type Value = RawTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of display names to [rule_name, params] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut rules = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((display, rule)) = access.next_entry()? {
                    rules.push((display, rule));
                }
                Ok(RawTable(rules))
            }
        }

        deserializer.deserialize_map(RawTableVisitor)
    }
}

impl LookupTable {
    /// Parse a table from its JSON text, resolving every rule name.
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let raw: RawTable = serde_json::from_str(json).map_err(|source| IngestError::TableJson {
            table: name.to_string(),
            source,
        })?;

        let mut rules = Vec::with_capacity(raw.0.len());
        for (display, (rule_name, params)) in raw.0 {
            let rule = MatchRule::from_name(&rule_name).ok_or_else(|| IngestError::UnknownRule {
                table: name.to_string(),
                rule: rule_name,
            })?;
            let pattern = params
                .get("pattern")
                .ok_or_else(|| IngestError::MissingPattern {
                    table: name.to_string(),
                    name: display.clone(),
                })?
                .clone();
            rules.push(LookupRule {
                display,
                rule,
                pattern,
            });
        }
        Ok(Self {
            name: name.to_string(),
            rules,
        })
    }

    fn from_pairs(name: &str, pairs: &[(&str, MatchRule, &str)]) -> Self {
        Self {
            name: name.to_string(),
            rules: pairs
                .iter()
                .map(|(display, rule, pattern)| LookupRule {
                    display: (*display).to_string(),
                    rule: *rule,
                    pattern: (*pattern).to_string(),
                })
                .collect(),
        }
    }
}

/// The per-section tables one extractor works from.
#[derive(Debug, Clone)]
pub struct LookupSet {
    pub localizer: LookupTable,
    pub scan: LookupTable,
    /// Dual-energy (tube A/B) main scans, when the vendor has them.
    pub scan_ab: Option<LookupTable>,
    pub monitoring: LookupTable,
    pub recon: LookupTable,
}

impl LookupSet {
    /// Load a table set from a directory of JSON files. `scan_ab.json` is
    /// optional; the other four are required.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let load = |stem: &str| -> Result<LookupTable> {
            let path = dir.join(format!("{stem}.json"));
            let json = fs::read_to_string(&path).map_err(|source| IngestError::FileRead {
                path: path.clone(),
                source,
            })?;
            LookupTable::from_json(stem, &json)
        };

        let scan_ab_path = dir.join("scan_ab.json");
        let scan_ab = if scan_ab_path.is_file() {
            Some(load("scan_ab")?)
        } else {
            None
        };

        Ok(Self {
            localizer: load("localizer")?,
            scan: load("scan")?,
            scan_ab,
            monitoring: load("monitoring")?,
            recon: load("recon")?,
        })
    }

    /// Built-in tables for Siemens Force XML protocol files.
    pub fn siemens_force() -> Self {
        use MatchRule::TagText;
        let scan_common: &[(&str, MatchRule, &str)] = &[
            ("Range", TagText, "RangeName"),
            ("Reference kVp", TagText, "QualityReferenceVoltage"),
            ("kVp", TagText, "Voltage"),
            ("Qref mAs", TagText, "QualityReferencemAs"),
            ("Eff. mAs", TagText, "EffectiveMAs"),
            ("Auto kV Mode", TagText, "AutokVMode"),
            ("Dose Modulation On/Off", TagText, "Care"),
            ("Dose Modulation", TagText, "CareDoseType"),
            ("Rotation Time (s)", TagText, "ExposureTimePerRotation"),
            ("Delay Time (s)", TagText, "StartDelay"),
            ("Pitch", TagText, "PitchFactor"),
            ("Slice No (Nominal)", TagText, "NoOfSlicesEffective"),
            ("Slice No (Actual)", TagText, "NoOfSlicesActual"),
            ("Slice Width (mm)", TagText, "SliceWidthCollimated"),
            ("Table Feed/Rotation (mm)", TagText, "SpiralFeedRot"),
            ("Scan FOV (mm)", TagText, "FOVLimitForThreshold"),
        ];
        let mut scan_ab: Vec<(&str, MatchRule, &str)> = scan_common.to_vec();
        scan_ab.extend_from_slice(&[
            ("Auto kV Tissue", TagText, "AutokVOptiCriteria"),
            ("Auto kV Min", TagText, "AutokVVoltageMin"),
            ("Auto kV Max", TagText, "AutokVVoltageMax"),
            ("Max recon FOV for TF (mm)", TagText, "FoVMaxFlashTotal"),
        ]);

        Self {
            localizer: LookupTable::from_pairs(
                "localizer",
                &[
                    ("Range", TagText, "RangeName"),
                    ("Tube Position (Angle)", TagText, "AngleType"),
                    ("kVp", TagText, "Voltage"),
                    ("mA", TagText, "Current"),
                    ("Kernel", TagText, "Kernel"),
                    ("Series Description", TagText, "SeriesDescription"),
                ],
            ),
            scan: LookupTable::from_pairs("scan", scan_common),
            scan_ab: Some(LookupTable::from_pairs("scan_ab", &scan_ab)),
            monitoring: LookupTable::from_pairs(
                "monitoring",
                &[
                    ("Range", TagText, "RangeName"),
                    ("Reference kVp", TagText, "QualityReferenceVoltage"),
                    ("kVp", TagText, "Voltage"),
                    ("Qref mAs", TagText, "QualityReferencemAs"),
                    ("mAs", TagText, "CustomMAs"),
                    ("Auto kV Mode", TagText, "AutokVMode"),
                    ("Dose Modulation On/Off", TagText, "Care"),
                    ("Rotation Time (s)", TagText, "ExposureTimePerRotation"),
                    ("Delay Time (s)", TagText, "StartDelay"),
                    ("Pitch", TagText, "PitchFactor"),
                    ("Slice No (Actual)", TagText, "NoOfSlicesActual"),
                    ("Slice Width (mm)", TagText, "SliceWidthCollimated"),
                    ("Scan FOV (mm)", TagText, "FOVLimitForThreshold"),
                    ("No of Scans", TagText, "NoOfScans"),
                ],
            ),
            recon: LookupTable::from_pairs(
                "recon",
                &[
                    ("Series Description", TagText, "SeriesDescription"),
                    ("Slice Thickness (mm)", TagText, "SliceEffective"),
                    ("Slice Increment (mm)", TagText, "SliceEffectiveTiltCorrected"),
                    ("Kernel", TagText, "Kernel"),
                    ("Window Name", TagText, "WindowName"),
                    ("Iter.Recon Type", TagText, "ReconMode"),
                    ("Iter.Recon Strength", TagText, "ImageReconType"),
                    ("Hor FOV for Recon (mm)", TagText, "FoVHorLength"),
                    ("Vert FOV for Recon (mm)", TagText, "FoVVertLength"),
                ],
            ),
        }
    }

    /// Built-in tables for Siemens SPECT-CT semi-structured text files.
    pub fn siemens_spect_ct() -> Self {
        use MatchRule::{LineContains, LinePrefix};
        let scan = LookupTable::from_pairs(
            "scan",
            &[
                ("Range", LineContains, "RangeName["),
                ("Reference kVp", LineContains, "AutokVVoltage:"),
                ("kVp", LinePrefix, "Voltage:"),
                ("Qref mAs", LinePrefix, "AECReferenceMAs:"),
                ("Eff. mAs", LinePrefix, "EffectiveMAs:"),
                ("Auto kV Mode", LinePrefix, "AutokV:"),
                ("Dose Modulation On/Off", LinePrefix, "DoseModulationType:"),
                ("Dose Modulation", LinePrefix, "AECDoseModulationType:"),
                ("Rotation Time (s)", LinePrefix, "RotTime:"),
                ("Delay Time (s)", LinePrefix, "StartDelay:"),
                ("Pitch", LinePrefix, "PitchFactor:"),
                ("Slice No (Nominal)", LinePrefix, "SlicesPerScan:"),
                ("Slice No (Actual)", LinePrefix, "NoOfSlicesAfterFusing:"),
                ("Slice Width (mm)", LinePrefix, "SliceDetector:"),
                ("Table Feed/Rotation (mm)", LinePrefix, "SpiralFeedRot:"),
                ("Scan FOV (mm)", LinePrefix, "FOV:"),
            ],
        );
        Self {
            localizer: LookupTable::from_pairs(
                "localizer",
                &[
                    ("Range", LineContains, "RangeName["),
                    ("Tube Position (Angle)", LineContains, "AngleType"),
                    ("kVp", LinePrefix, "Voltage:"),
                    ("mA", LinePrefix, "Current:"),
                    ("Kernel", LineContains, "Kernel"),
                    ("Series Description", LineContains, "SeriesDescription"),
                ],
            ),
            // SPECT-CT monitoring blocks carry the same line vocabulary as
            // main scans.
            monitoring: scan.clone(),
            scan,
            scan_ab: None,
            recon: LookupTable::from_pairs(
                "recon",
                &[
                    ("Series Description", LineContains, "SeriesDescription"),
                    ("Slice Thickness (mm)", LinePrefix, "SliceEffective:"),
                    (
                        "Slice Increment (mm)",
                        LinePrefix,
                        "SliceEffectiveTiltCorrected:",
                    ),
                    ("Kernel", LineContains, "Kernel"),
                    ("Window Name", LineContains, "Window["),
                    ("Iter.Recon Type", LinePrefix, "ReconMode"),
                    ("Iter.Recon Strength", LinePrefix, "ImageReconType:"),
                    ("Hor FOV for Recon (mm)", LinePrefix, "FoVHorLength:"),
                    ("Vert FOV for Recon (mm)", LinePrefix, "FoVVertLength:"),
                    ("Transfer1", LinePrefix, "Transfer1:"),
                    ("Transfer2", LinePrefix, "Transfer2:"),
                    ("Transfer3", LinePrefix, "Transfer3:"),
                ],
            ),
        }
    }

    /// Built-in tables for GE Optima brace-delimited text files.
    pub fn ge_optima() -> Self {
        use MatchRule::KeyEquals;
        Self {
            localizer: LookupTable::from_pairs(
                "localizer",
                &[
                    ("Series Description", KeyEquals, "seriesDescription"),
                    ("Group Type", KeyEquals, "groupType"),
                    ("kVp", KeyEquals, "kv"),
                    ("mA", KeyEquals, "ma"),
                    ("Scan Type", KeyEquals, "scanType"),
                ],
            ),
            scan: LookupTable::from_pairs(
                "scan",
                &[
                    ("Series Description", KeyEquals, "seriesDescription"),
                    ("Scan Type", KeyEquals, "scanType"),
                    ("kVp", KeyEquals, "kv"),
                    ("mA", KeyEquals, "ma"),
                    ("Rotation Time (s)", KeyEquals, "rotationTime"),
                    ("Pitch", KeyEquals, "pitch"),
                    ("Slice Thickness (mm)", KeyEquals, "sliceThickness"),
                    ("Scan FOV", KeyEquals, "scanFov"),
                ],
            ),
            scan_ab: None,
            monitoring: LookupTable::from_pairs(
                "monitoring",
                &[
                    ("Series Description", KeyEquals, "seriesDescription"),
                    ("kVp", KeyEquals, "kv"),
                    ("mA", KeyEquals, "ma"),
                    ("Rotation Time (s)", KeyEquals, "rotationTime"),
                ],
            ),
            recon: LookupTable::from_pairs(
                "recon",
                &[
                    ("Series Description", KeyEquals, "seriesDescription"),
                    ("Iter.Recon Type", KeyEquals, "iterReconType"),
                    ("Iter.Recon Strength", KeyEquals, "iterReconStrength"),
                    ("Recon Kernel", KeyEquals, "reconKernel"),
                    ("Recon FOV", KeyEquals, "reconFov"),
                ],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_follows_the_json_object() {
        let json = r#"{
            "kVp": ["line_prefix", {"pattern": "Voltage:"}],
            "Range": ["line_contains", {"pattern": "RangeName["}],
            "mA": ["line_prefix", {"pattern": "Current:"}]
        }"#;
        let table = LookupTable::from_json("scan", json).unwrap();
        let order: Vec<&str> = table.rules.iter().map(|r| r.display.as_str()).collect();
        assert_eq!(order, vec!["kVp", "Range", "mA"]);
        assert_eq!(table.rules[0].rule, MatchRule::LinePrefix);
    }

    #[test]
    fn unknown_rule_fails_the_load() {
        let json = r#"{"kVp": ["xpath_lookup", {"pattern": "Voltage"}]}"#;
        let err = LookupTable::from_json("scan", json).unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnknownRule { table, rule } if table == "scan" && rule == "xpath_lookup"
        ));
    }

    #[test]
    fn missing_pattern_fails_the_load() {
        let json = r#"{"kVp": ["line_prefix", {}]}"#;
        let err = LookupTable::from_json("scan", json).unwrap_err();
        assert!(matches!(err, IngestError::MissingPattern { name, .. } if name == "kVp"));
    }

    #[test]
    fn builtin_sets_resolve() {
        assert!(LookupSet::siemens_force().scan_ab.is_some());
        assert!(LookupSet::siemens_spect_ct().scan_ab.is_none());
        let ge = LookupSet::ge_optima();
        assert!(
            ge.recon
                .rules
                .iter()
                .any(|r| r.display == "Iter.Recon Type")
        );
    }
}
