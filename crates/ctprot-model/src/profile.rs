//! Vendor profiles and entry-kind classification.
//!
//! Each supported scanner family duplicates the same comparison algorithm
//! with a different keyword/marker vocabulary. The vocabulary lives here as
//! data so the analyzer and merge engine stay vendor-agnostic.

use std::collections::BTreeSet;

use crate::entry::Entry;
use crate::render::SectionStyle;

/// Kind of a protocol entry, derived from keywords and marker fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Localizer,
    PreMonitoring,
    Monitoring,
    MainScan,
    ReconJob,
    Bolus,
}

/// A basic (count-driven) section of the report, processed before the
/// main-scan/recon phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicSection {
    Localizer,
    PreMonitoring,
    Contrast,
    Monitoring,
}

impl BasicSection {
    pub fn banner(self) -> &'static str {
        match self {
            Self::Localizer => "Localizer",
            Self::PreMonitoring => "PreMonitoring Scan",
            Self::Contrast => "Contrast",
            Self::Monitoring => "Monitoring Scan",
        }
    }

    pub fn kind(self) -> EntryKind {
        match self {
            Self::Localizer => EntryKind::Localizer,
            Self::PreMonitoring => EntryKind::PreMonitoring,
            Self::Contrast => EntryKind::Bolus,
            Self::Monitoring => EntryKind::Monitoring,
        }
    }

    pub fn style(self) -> SectionStyle {
        match self {
            Self::Localizer => SectionStyle::Localizer,
            Self::PreMonitoring | Self::Monitoring => SectionStyle::Monitoring,
            Self::Contrast => SectionStyle::Contrast,
        }
    }
}

/// Keyword and marker vocabulary for one scanner family.
#[derive(Debug, Clone)]
pub struct VendorProfile {
    /// Short identifier used in logs and the CLI.
    pub name: &'static str,
    /// Substrings of field values marking a localizer entry.
    pub localizer_keywords: Vec<&'static str>,
    pub premonitoring_keywords: Vec<&'static str>,
    pub monitoring_keywords: Vec<&'static str>,
    /// Field key marking a reconstruction-job entry.
    pub recon_marker: &'static str,
    /// Field key marking a contrast-bolus entry, when the family has one.
    pub bolus_marker: Option<&'static str>,
    /// Substrings of field values marking a bolus entry (e.g. test-bolus
    /// ranges that carry no marker key).
    pub bolus_keywords: Vec<&'static str>,
    /// Whether bolus entries get their own Contrast section. When false,
    /// bolus entries are only skipped inside main-scan windows.
    pub contrast_section: bool,
    /// Field key holding the recon index for banner numbering. When absent
    /// the banner uses a per-scan ordinal.
    pub recon_index_field: Option<&'static str>,
    /// Bookkeeping and windowing fields hidden from the report.
    pub excluded_fields: BTreeSet<&'static str>,
}

impl VendorProfile {
    /// Siemens Force family: hierarchical XML protocol definitions.
    pub fn siemens_force() -> Self {
        Self {
            name: "siemens-force",
            localizer_keywords: vec!["Topogram", "TopograM"],
            premonitoring_keywords: vec!["PreMonitoring"],
            monitoring_keywords: vec!["Monitoring"],
            recon_marker: "ReconJob",
            bolus_marker: Some("Bolus Trigger Level"),
            bolus_keywords: vec!["Test Bolus"],
            contrast_section: false,
            recon_index_field: Some("ReconJob"),
            excluded_fields: siemens_exclusions("ReconJob"),
        }
    }

    /// Siemens SPECT-CT family: semi-structured key/value text blocks,
    /// with a dedicated Contrast section for bolus entries.
    pub fn siemens_spect_ct() -> Self {
        Self {
            name: "siemens-spect-ct",
            localizer_keywords: vec!["Topogram"],
            premonitoring_keywords: vec!["PreMonitoring"],
            monitoring_keywords: vec!["Monitoring"],
            recon_marker: "ReconJob",
            bolus_marker: Some("Bolus Trigger Level"),
            bolus_keywords: vec![],
            contrast_section: true,
            recon_index_field: Some("ReconJob"),
            excluded_fields: siemens_exclusions("ReconJob"),
        }
    }

    /// GE Optima family: brace-delimited key=value text blocks.
    pub fn ge_optima() -> Self {
        Self {
            name: "ge-optima",
            localizer_keywords: vec!["Scout"],
            premonitoring_keywords: vec!["PreMonitoring"],
            monitoring_keywords: vec!["Monitoring"],
            recon_marker: "Iter.Recon Type",
            bolus_marker: Some("Bolus Trigger Level"),
            bolus_keywords: vec![],
            contrast_section: false,
            recon_index_field: None,
            excluded_fields: siemens_exclusions("Iter.Recon Type"),
        }
    }

    /// Basic sections in report order, ahead of the main-scan phase.
    pub fn basic_sections(&self) -> Vec<BasicSection> {
        let mut sections = vec![BasicSection::Localizer, BasicSection::PreMonitoring];
        if self.contrast_section {
            sections.push(BasicSection::Contrast);
        }
        sections.push(BasicSection::Monitoring);
        sections
    }

    /// Classify one entry.
    ///
    /// Precedence when several signals could match: localizer keywords,
    /// then premonitoring, then monitoring keywords, then the recon marker
    /// key, then bolus signals. An entry matching nothing is a main scan;
    /// that fallback is deliberate and mirrors the extraction sources.
    pub fn classify(&self, entry: &Entry) -> EntryKind {
        let any_keyword = |keywords: &[&str]| {
            keywords
                .iter()
                .any(|keyword| entry.any_value_contains(keyword))
        };
        if any_keyword(&self.localizer_keywords) {
            EntryKind::Localizer
        } else if any_keyword(&self.premonitoring_keywords) {
            EntryKind::PreMonitoring
        } else if any_keyword(&self.monitoring_keywords) {
            EntryKind::Monitoring
        } else if entry.contains_key(self.recon_marker) {
            EntryKind::ReconJob
        } else if self.bolus_marker.is_some_and(|key| entry.contains_key(key))
            || any_keyword(&self.bolus_keywords)
        {
            EntryKind::Bolus
        } else {
            EntryKind::MainScan
        }
    }

    /// Banner label for a recon entry. `ordinal` is 1-based within the
    /// current main scan and used when the family has no index field.
    pub fn recon_banner(&self, entry: &Entry, ordinal: usize) -> String {
        match self.recon_index_field.and_then(|field| entry.get(field)) {
            Some(index) => format!("Recon No.{index}"),
            None => format!("Recon No. {ordinal}"),
        }
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_fields.contains(field)
    }
}

fn siemens_exclusions(recon_marker: &'static str) -> BTreeSet<&'static str> {
    BTreeSet::from([
        "EntryNo",
        recon_marker,
        "Window-1 Center",
        "Window-1 Width",
        "Window-2 Center",
        "Window-2 Width",
        "Syngo TaskflowIdCode",
        "Syngo TaskflowProcessingIdCode",
        "Syngo TaskflowProcessingIdMeaning",
        "Comment1",
        "Comment2",
    ])
}
