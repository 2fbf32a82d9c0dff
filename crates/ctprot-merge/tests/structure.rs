//! Property tests for the structure analyzer and recon pairing.

use ctprot_merge::{classify, pair_recon_counts};
use ctprot_model::{Entry, VendorProfile};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Localizer,
    PreMonitoring,
    Monitoring,
    Recon,
    MainScan,
    Bolus,
}

fn tag_strategy() -> impl Strategy<Value = Tag> {
    prop_oneof![
        Just(Tag::Localizer),
        Just(Tag::PreMonitoring),
        Just(Tag::Monitoring),
        Just(Tag::Recon),
        Just(Tag::MainScan),
        Just(Tag::Bolus),
    ]
}

fn entry_for(tag: Tag) -> Entry {
    let pairs: &[(&str, &str)] = match tag {
        Tag::Localizer => &[("Range", "\"Topogram\"")],
        Tag::PreMonitoring => &[("Range", "\"PreMonitoring\"")],
        Tag::Monitoring => &[("Range", "\"Monitoring\"")],
        Tag::Recon => &[("ReconJob", "1"), ("Kernel", "\"Br40\"")],
        Tag::MainScan => &[("Range", "\"Abdomen\""), ("kVp", "120")],
        Tag::Bolus => &[("Bolus Trigger Level", "100")],
    };
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}

proptest! {
    #[test]
    fn recon_list_length_matches_main_scan_count(tags in prop::collection::vec(tag_strategy(), 0..40)) {
        let profile = VendorProfile::siemens_force();
        let entries: Vec<Entry> = tags.iter().map(|tag| entry_for(*tag)).collect();
        let counts = classify(&profile, &entries);
        prop_assert_eq!(counts.recon_per_scan.len(), counts.main_scan);
    }

    #[test]
    fn kind_counts_cover_every_entry(tags in prop::collection::vec(tag_strategy(), 0..40)) {
        let profile = VendorProfile::siemens_spect_ct();
        let entries: Vec<Entry> = tags.iter().map(|tag| entry_for(*tag)).collect();
        let counts = classify(&profile, &entries);

        let tag_count = |wanted: Tag| tags.iter().filter(|tag| **tag == wanted).count();
        prop_assert_eq!(counts.localizer, tag_count(Tag::Localizer));
        prop_assert_eq!(counts.premonitoring, tag_count(Tag::PreMonitoring));
        prop_assert_eq!(counts.monitoring, tag_count(Tag::Monitoring));
        prop_assert_eq!(counts.bolus, tag_count(Tag::Bolus));
        prop_assert_eq!(counts.main_scan, tag_count(Tag::MainScan));

        // With at least one main scan the end flush attributes every recon
        // somewhere; with none the recon list stays empty.
        if counts.main_scan > 0 {
            let attributed: usize = counts.recon_per_scan.iter().sum();
            prop_assert_eq!(attributed, tag_count(Tag::Recon));
        } else {
            prop_assert!(counts.recon_per_scan.is_empty());
        }
    }

    #[test]
    fn recons_after_a_scan_are_fully_attributed(
        per_scan in prop::collection::vec(0usize..4, 1..5),
    ) {
        // A well-formed sequence: each main scan directly followed by its
        // recon jobs.
        let profile = VendorProfile::siemens_force();
        let mut entries = Vec::new();
        for recons in &per_scan {
            entries.push(entry_for(Tag::MainScan));
            for _ in 0..*recons {
                entries.push(entry_for(Tag::Recon));
            }
        }
        let counts = classify(&profile, &entries);
        prop_assert_eq!(counts.main_scan, per_scan.len());
        prop_assert_eq!(&counts.recon_per_scan, &per_scan);
    }

    #[test]
    fn pairing_pads_only_the_tail(
        first in prop::collection::vec(0usize..6, 0..8),
        second in prop::collection::vec(0usize..6, 0..8),
    ) {
        let pairs = pair_recon_counts(&first, &second);
        prop_assert_eq!(pairs.len(), first.len().max(second.len()));

        for (i, pair) in pairs.iter().enumerate() {
            prop_assert_eq!(pair.0[0], first.get(i).copied());
            prop_assert_eq!(pair.0[1], second.get(i).copied());
        }
        // None never precedes Some within one slot.
        for slot in 0..2 {
            let mut seen_none = false;
            for pair in &pairs {
                if pair.0[slot].is_none() {
                    seen_none = true;
                } else {
                    prop_assert!(!seen_none, "gap before a present count");
                }
            }
        }
    }
}
