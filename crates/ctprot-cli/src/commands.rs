use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, info_span, warn};

use ctprot_ingest::{
    LookupSet, SnapshotPair, ge_optima, pair_snapshots, read_interchange, siemens_force,
    siemens_spect, write_interchange,
};
use ctprot_merge::merge;
use ctprot_model::{Protocol, ProtocolPair, VendorProfile};
use ctprot_report::write_workbook;

use crate::cli::{BatchArgs, CompareArgs, ExtractArgs, VendorArg};
use crate::summary::apply_table_style;
use crate::types::{BatchOutcome, PairOutcome};

pub fn run_compare(args: &CompareArgs) -> Result<()> {
    let profile = vendor_profile(args.vendor);
    let span = info_span!("compare", vendor = profile.name);
    let _guard = span.enter();

    let pair = if args.interchange {
        read_interchange(&args.first)
            .with_context(|| format!("read interchange {}", args.first.display()))?
    } else {
        let tables = lookup_tables(args.vendor, args.tables.as_deref())?;
        let first = extract_protocol(args.vendor, &tables, &args.first)?;
        match &args.second {
            Some(path) => ProtocolPair::new(first, extract_protocol(args.vendor, &tables, path)?),
            None => ProtocolPair::single(first),
        }
    };

    if let Some(path) = &args.json_out {
        let kept = if pair.single {
            &pair.protocols[..1]
        } else {
            &pair.protocols[..]
        };
        write_interchange(path, kept)
            .with_context(|| format!("write interchange {}", path.display()))?;
        info!(path = %path.display(), "wrote interchange");
    }

    let ops = merge(&profile, &pair)?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| args.first.with_extension("xlsx"));
    write_workbook(&out, pair.names(), &ops, pair.single)?;
    println!("Workbook: {}", out.display());
    Ok(())
}

pub fn run_extract(args: &ExtractArgs) -> Result<()> {
    let profile = vendor_profile(args.vendor);
    let span = info_span!("extract", vendor = profile.name);
    let _guard = span.enter();

    let tables = lookup_tables(args.vendor, args.tables.as_deref())?;
    let mut protocols = Vec::with_capacity(args.files.len());
    for path in &args.files {
        protocols.push(extract_protocol(args.vendor, &tables, path)?);
    }
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| args.files[0].with_extension("json"));
    write_interchange(&out, &protocols)
        .with_context(|| format!("write interchange {}", out.display()))?;
    info!(path = %out.display(), protocols = protocols.len(), "wrote interchange");
    println!("Interchange: {}", out.display());
    Ok(())
}

pub fn run_batch(args: &BatchArgs) -> Result<BatchOutcome> {
    let profile = vendor_profile(args.vendor);
    let span = info_span!("batch", vendor = profile.name);
    let _guard = span.enter();

    let tables = lookup_tables(args.vendor, args.tables.as_deref())?;
    let snapshot = pair_snapshots(&args.first_dir, &args.second_dir)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("comparison"));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;

    let bar = ProgressBar::new(snapshot.common.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("progress bar template")?,
    );

    let mut pairs = Vec::with_capacity(snapshot.common.len());
    for pair in &snapshot.common {
        bar.set_message(pair.relative.display().to_string());
        // One failed protocol must not abort the rest of the run.
        let outcome = match compare_pair(&profile, &tables, args.vendor, pair, &output_dir) {
            Ok(output) => PairOutcome {
                relative: pair.relative.clone(),
                output: Some(output),
                error: None,
            },
            Err(error) => {
                warn!(protocol = %pair.relative.display(), "comparison failed: {error:#}");
                PairOutcome {
                    relative: pair.relative.clone(),
                    output: None,
                    error: Some(format!("{error:#}")),
                }
            }
        };
        pairs.push(outcome);
        bar.inc(1);
    }
    bar.finish_and_clear();

    for path in &snapshot.only_first {
        warn!(path = %path.display(), "only in first snapshot");
    }
    for path in &snapshot.only_second {
        warn!(path = %path.display(), "only in second snapshot");
    }
    info!(
        compared = pairs.len(),
        failed = pairs.iter().filter(|pair| pair.error.is_some()).count(),
        "batch finished"
    );

    Ok(BatchOutcome {
        output_dir,
        pairs,
        only_first: snapshot.only_first,
        only_second: snapshot.only_second,
    })
}

pub fn run_profiles() {
    let mut table = Table::new();
    table.set_header(vec![
        "Profile",
        "Source format",
        "Localizer keywords",
        "Recon marker",
        "Contrast section",
    ]);
    apply_table_style(&mut table);
    let profiles = [
        (VendorProfile::siemens_force(), "Siemens Force XML export"),
        (VendorProfile::siemens_spect_ct(), "Siemens SPECT-CT text dump"),
        (VendorProfile::ge_optima(), "GE text dump"),
    ];
    for (profile, format) in profiles {
        table.add_row(vec![
            profile.name.to_string(),
            format.to_string(),
            profile.localizer_keywords.join(", "),
            profile.recon_marker.to_string(),
            if profile.contrast_section { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{table}");
}

fn compare_pair(
    profile: &VendorProfile,
    tables: &LookupSet,
    vendor: VendorArg,
    pair: &SnapshotPair,
    output_dir: &Path,
) -> Result<PathBuf> {
    let first = extract_protocol(vendor, tables, &pair.first)?;
    let second = extract_protocol(vendor, tables, &pair.second)?;
    let merged = ProtocolPair::new(first, second);
    let ops = merge(profile, &merged)?;

    // Mirror the snapshot layout under the output directory.
    let mut out = output_dir.join(&pair.relative);
    out.set_extension("xlsx");
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    write_workbook(&out, merged.names(), &ops, false)?;
    Ok(out)
}

fn vendor_profile(vendor: VendorArg) -> VendorProfile {
    match vendor {
        VendorArg::SiemensForce => VendorProfile::siemens_force(),
        VendorArg::SiemensSpectCt => VendorProfile::siemens_spect_ct(),
        VendorArg::GeOptima => VendorProfile::ge_optima(),
    }
}

fn lookup_tables(vendor: VendorArg, dir: Option<&Path>) -> Result<LookupSet> {
    match dir {
        Some(dir) => LookupSet::load_dir(dir)
            .with_context(|| format!("load lookup tables from {}", dir.display())),
        None => Ok(match vendor {
            VendorArg::SiemensForce => LookupSet::siemens_force(),
            VendorArg::SiemensSpectCt => LookupSet::siemens_spect_ct(),
            VendorArg::GeOptima => LookupSet::ge_optima(),
        }),
    }
}

fn extract_protocol(vendor: VendorArg, tables: &LookupSet, path: &Path) -> Result<Protocol> {
    let protocol = match vendor {
        VendorArg::SiemensForce => siemens_force::extract(path, tables),
        VendorArg::SiemensSpectCt => siemens_spect::extract(path, tables),
        VendorArg::GeOptima => ge_optima::extract(path, tables),
    }
    .with_context(|| format!("extract {}", path.display()))?;
    info!(
        path = %path.display(),
        protocol = %protocol.name,
        entries = protocol.entries.len(),
        "extracted protocol"
    );
    Ok(protocol)
}
