//! The section merge engine.
//!
//! Walks two classified protocol sequences exactly once each, section by
//! section, and emits a flat render-instruction stream. Each section picks
//! a winner protocol that is written first and owns the section banners and
//! field labels; the follower is then written into the same row range with
//! its own cursor, and the next section starts below whichever column
//! reached further down.

use ctprot_model::profile::{BasicSection, EntryKind};
use ctprot_model::render::{RenderOp, SectionStyle};
use ctprot_model::{CellValue, Entry, ProtocolPair, VendorProfile};

use crate::error::{MergeError, Result};
use crate::structure::{ReconPair, SectionCounts, classify, pair_recon_counts};

/// Cursor state for one merge run. Always fresh per call; the engine keeps
/// no state between runs.
#[derive(Debug)]
struct MergeState {
    /// Per-protocol index below which entries are already rendered.
    consumed: [usize; 2],
    /// Row floor for the next section; both columns start here.
    current_row: u32,
    /// Winner of the previous basic section, kept as the default when the
    /// next section's counts tie.
    winner: Option<usize>,
}

/// Merge two protocol sequences into a render-instruction stream.
///
/// Deterministic: the same pair always yields an identical stream.
pub fn merge(profile: &VendorProfile, pair: &ProtocolPair) -> Result<Vec<RenderOp>> {
    let counts = [
        classify(profile, pair.entries(0)),
        classify(profile, pair.entries(1)),
    ];
    let recon_pairs = pair_recon_counts(&counts[0].recon_per_scan, &counts[1].recon_per_scan);

    let mut ops = Vec::new();
    // Row 0 holds the protocol-name header written by the sink.
    let mut state = MergeState {
        consumed: [0, 0],
        current_row: 0,
        winner: None,
    };

    if !profile.contrast_section {
        for (slot, count) in counts.iter().map(|c| c.bolus).enumerate() {
            if count > 0 {
                tracing::debug!(
                    protocol = pair.protocols[slot].name,
                    count,
                    "bolus entries present but profile has no contrast section, not rendered"
                );
            }
        }
    }

    for section in profile.basic_sections() {
        basic_section(profile, pair, &counts, section, &mut state, &mut ops);
    }

    if counts[0].main_scan == 0 && counts[1].main_scan == 0 {
        tracing::warn!(
            protocol1 = pair.protocols[0].name,
            protocol2 = pair.protocols[1].name,
            "no main scans in either protocol"
        );
    }
    for (index, recon_pair) in recon_pairs.iter().enumerate() {
        main_scan_section(profile, pair, index, *recon_pair, &mut state, &mut ops)?;
    }

    Ok(ops)
}

/// Process one count-driven section (localizer, premonitoring, contrast,
/// monitoring).
fn basic_section(
    profile: &VendorProfile,
    pair: &ProtocolPair,
    counts: &[SectionCounts; 2],
    section: BasicSection,
    state: &mut MergeState,
    ops: &mut Vec<RenderOp>,
) {
    let section_counts = [counts[0].basic(section), counts[1].basic(section)];

    // Sticky tie-break: the winner is re-derived only when the counts
    // differ (or nothing has been decided yet); on a tie the previous
    // section's winner carries over. The very first section has no carry,
    // so a tie there resolves to protocol 0.
    if state.winner.is_none() || section_counts[0] != section_counts[1] {
        state.winner = Some(if section_counts[1] > section_counts[0] { 1 } else { 0 });
    }
    let winner = state.winner.unwrap_or(0);
    let follower = 1 - winner;

    if section_counts[0].max(section_counts[1]) == 0 {
        tracing::info!(
            section = section.banner(),
            "section empty in both protocols, skipping"
        );
        return;
    }
    tracing::debug!(
        section = section.banner(),
        winner = pair.protocols[winner].name,
        count = section_counts[winner],
        "processing section"
    );

    let kind = section.kind();
    let style = section.style();
    let mut row_winner = state.current_row;
    let mut row_follower = state.current_row;

    for (i, entry) in pair.entries(winner).iter().enumerate() {
        if i < state.consumed[winner] || profile.classify(entry) != kind {
            continue;
        }
        row_winner += 1;
        ops.push(RenderOp::Banner {
            row: row_winner,
            label: section.banner().to_string(),
            style,
        });
        state.consumed[winner] += 1;
        emit_fields(profile, entry, winner, true, style, &mut row_winner, ops);
    }

    for (j, entry) in pair.entries(follower).iter().enumerate() {
        if j < state.consumed[follower] || profile.classify(entry) != kind {
            continue;
        }
        row_follower += 1;
        state.consumed[follower] += 1;
        emit_fields(profile, entry, follower, false, style, &mut row_follower, ops);
    }

    state.current_row = row_winner.max(row_follower);
}

/// Process one paired main scan plus its recon jobs.
///
/// The protocol with fewer recons for this scan is the follower: the
/// richer column drives the sheet further down, so it is written first and
/// owns the banners and labels. An absent side (`None`) is a follower with
/// an empty window; the present side does all the work. That asymmetry
/// matches every vendor variant of the original tool and is deliberate.
fn main_scan_section(
    profile: &VendorProfile,
    pair: &ProtocolPair,
    index: usize,
    recon_pair: ReconPair,
    state: &mut MergeState,
    ops: &mut Vec<RenderOp>,
) -> Result<()> {
    let ReconPair(counts) = recon_pair;

    let follower = match counts {
        [None, None] => return Err(MergeError::PairingInvariant { index }),
        [None, Some(_)] => 0,
        [Some(_), None] => 1,
        [Some(a), Some(b)] => {
            if a <= b {
                0
            } else {
                1
            }
        }
    };
    let winner = 1 - follower;
    let winner_recons = counts[winner].ok_or(MergeError::PairingInvariant { index })?;
    // One main-scan entry plus its recons; zero when the side is absent.
    let winner_window = winner_recons + 1;
    let follower_window = counts[follower].map_or(0, |n| n + 1);

    let mut row_winner = state.current_row;
    let mut row_follower = state.current_row;

    scan_window(profile, pair, winner, winner_window, true, &mut row_winner, state, ops);
    scan_window(
        profile,
        pair,
        follower,
        follower_window,
        false,
        &mut row_follower,
        state,
        ops,
    );

    state.current_row = row_winner.max(row_follower);
    Ok(())
}

/// Walk one protocol's main-scan window: a fixed span of entry indices
/// starting at the consumed floor. Basic-kind entries inside the window
/// (a monitoring scan interleaved near a main scan, a bolus trigger) are
/// skipped without consuming a row, but still use up window indices.
#[allow(clippy::too_many_arguments)]
fn scan_window(
    profile: &VendorProfile,
    pair: &ProtocolPair,
    slot: usize,
    window: usize,
    with_labels: bool,
    row: &mut u32,
    state: &mut MergeState,
    ops: &mut Vec<RenderOp>,
) {
    let entries = pair.entries(slot);
    let start = state.consumed[slot];
    let end = start + window;
    if end > entries.len() {
        tracing::warn!(
            protocol = pair.protocols[slot].name,
            start,
            window,
            len = entries.len(),
            "main-scan window overruns the entry list, truncating"
        );
    }
    let end = end.min(entries.len());

    let mut recon_ordinal = 0usize;
    for entry in &entries[start..end] {
        match profile.classify(entry) {
            EntryKind::MainScan => {
                *row += 1;
                if with_labels {
                    ops.push(RenderOp::Banner {
                        row: *row,
                        label: "Main Scan".to_string(),
                        style: SectionStyle::Scan,
                    });
                }
                state.consumed[slot] += 1;
                emit_fields(profile, entry, slot, with_labels, SectionStyle::Scan, row, ops);
            }
            EntryKind::ReconJob => {
                recon_ordinal += 1;
                *row += 1;
                if with_labels {
                    ops.push(RenderOp::Banner {
                        row: *row,
                        label: profile.recon_banner(entry, recon_ordinal),
                        style: SectionStyle::Recon,
                    });
                }
                state.consumed[slot] += 1;
                emit_fields(profile, entry, slot, with_labels, SectionStyle::Recon, row, ops);
            }
            // Localizer / monitoring / bolus entries interleaved near a
            // main scan: seen for window bounds, never consumed here.
            _ => {}
        }
    }
}

/// Emit the visible fields of one entry. The winner pass writes labels in
/// the label column; the follower only writes its own values.
fn emit_fields(
    profile: &VendorProfile,
    entry: &Entry,
    slot: usize,
    with_labels: bool,
    style: SectionStyle,
    row: &mut u32,
    ops: &mut Vec<RenderOp>,
) {
    for (name, value) in entry.fields() {
        if profile.is_excluded(name) {
            continue;
        }
        *row += 1;
        if with_labels {
            ops.push(RenderOp::FieldLabel {
                row: *row,
                text: name.to_string(),
                style,
            });
        }
        ops.push(RenderOp::FieldValue {
            row: *row,
            slot,
            value: CellValue::coerce(value),
            style,
        });
    }
}
