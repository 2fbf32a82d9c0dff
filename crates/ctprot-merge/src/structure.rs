//! Structure analysis: per-protocol section counts and recon pairing.

use ctprot_model::profile::{BasicSection, EntryKind};
use ctprot_model::{Entry, VendorProfile};

/// Section counts for one protocol sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionCounts {
    pub localizer: usize,
    pub premonitoring: usize,
    pub bolus: usize,
    pub monitoring: usize,
    pub main_scan: usize,
    /// One element per main scan in sequence order: the number of recon
    /// jobs immediately following that scan. Always the same length as
    /// `main_scan`.
    pub recon_per_scan: Vec<usize>,
}

impl SectionCounts {
    pub fn basic(&self, section: BasicSection) -> usize {
        match section {
            BasicSection::Localizer => self.localizer,
            BasicSection::PreMonitoring => self.premonitoring,
            BasicSection::Contrast => self.bolus,
            BasicSection::Monitoring => self.monitoring,
        }
    }
}

/// Classify one protocol sequence in a single forward pass.
///
/// The running recon accumulator is flushed each time a main scan beyond
/// the first is seen, and once more at the end when at least one main scan
/// exists. A protocol with a single main scan and three recons therefore
/// still reports `recon_per_scan == [3]`, and one with no main scans
/// reports `[]`.
pub fn classify(profile: &VendorProfile, entries: &[Entry]) -> SectionCounts {
    let mut counts = SectionCounts::default();
    let mut recon_count = 0usize;

    for entry in entries {
        match profile.classify(entry) {
            EntryKind::Localizer => counts.localizer += 1,
            EntryKind::PreMonitoring => counts.premonitoring += 1,
            EntryKind::Monitoring => counts.monitoring += 1,
            EntryKind::Bolus => counts.bolus += 1,
            EntryKind::ReconJob => recon_count += 1,
            EntryKind::MainScan => {
                counts.main_scan += 1;
                if counts.main_scan > 1 {
                    counts.recon_per_scan.push(recon_count);
                    recon_count = 0;
                }
            }
        }
    }
    if counts.main_scan > 0 {
        counts.recon_per_scan.push(recon_count);
    }
    counts
}

/// Recon counts for one main-scan position across both protocols.
///
/// `None` means the protocol has no main scan at this position at all,
/// which is distinct from a main scan with zero recons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconPair(pub [Option<usize>; 2]);

/// Positionally pair the two protocols' recon counts, padding the shorter
/// side's tail with `None`.
pub fn pair_recon_counts(first: &[usize], second: &[usize]) -> Vec<ReconPair> {
    let len = first.len().max(second.len());
    (0..len)
        .map(|i| ReconPair([first.get(i).copied(), second.get(i).copied()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pairs: &[(&str, &str)]) -> Entry {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    fn localizer() -> Entry {
        entry(&[("Range", "\"Topogram\"")])
    }

    fn main_scan(range: &str) -> Entry {
        entry(&[("Range", range), ("kVp", "120")])
    }

    fn recon(job: &str) -> Entry {
        entry(&[("ReconJob", job), ("Kernel", "\"Br40\"")])
    }

    #[test]
    fn single_main_scan_still_flushes_recons() {
        let profile = VendorProfile::siemens_force();
        let entries = vec![
            main_scan("\"Abdomen\""),
            recon("1"),
            recon("2"),
            recon("3"),
        ];
        let counts = classify(&profile, &entries);
        assert_eq!(counts.main_scan, 1);
        assert_eq!(counts.recon_per_scan, vec![3]);
    }

    #[test]
    fn recons_attach_to_preceding_scan() {
        let profile = VendorProfile::siemens_force();
        let entries = vec![
            localizer(),
            main_scan("\"Abdomen\""),
            recon("1"),
            main_scan("\"Pelvis\""),
            recon("1"),
            recon("2"),
        ];
        let counts = classify(&profile, &entries);
        assert_eq!(counts.localizer, 1);
        assert_eq!(counts.main_scan, 2);
        assert_eq!(counts.recon_per_scan, vec![1, 2]);
    }

    #[test]
    fn no_main_scans_means_empty_recon_list() {
        let profile = VendorProfile::siemens_force();
        let entries = vec![localizer(), localizer()];
        let counts = classify(&profile, &entries);
        assert_eq!(counts.main_scan, 0);
        assert_eq!(counts.recon_per_scan, Vec::<usize>::new());
    }

    #[test]
    fn bolus_counted_separately() {
        let profile = VendorProfile::siemens_spect_ct();
        let entries = vec![
            localizer(),
            entry(&[("Bolus Trigger Level", "100")]),
            main_scan("\"Abdomen\""),
        ];
        let counts = classify(&profile, &entries);
        assert_eq!(counts.bolus, 1);
        assert_eq!(counts.main_scan, 1);
    }

    #[test]
    fn pairing_equal_lengths() {
        let pairs = pair_recon_counts(&[2, 0], &[1, 3]);
        assert_eq!(
            pairs,
            vec![ReconPair([Some(2), Some(1)]), ReconPair([Some(0), Some(3)])]
        );
    }

    #[test]
    fn pairing_pads_shorter_side_with_none() {
        let pairs = pair_recon_counts(&[2, 0, 1], &[1]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], ReconPair([Some(2), Some(1)]));
        assert_eq!(pairs[1], ReconPair([Some(0), None]));
        assert_eq!(pairs[2], ReconPair([Some(1), None]));

        let pairs = pair_recon_counts(&[], &[4]);
        assert_eq!(pairs, vec![ReconPair([None, Some(4)])]);
    }
}
