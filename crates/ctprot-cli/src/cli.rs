//! CLI argument definitions for the protocol comparator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ctprot",
    version,
    about = "CT protocol comparator - extract and diff scanner protocol snapshots",
    long_about = "Extract scan parameters from vendor CT protocol files and\n\
                  render side-by-side comparison workbooks.\n\n\
                  Supports Siemens Force XML exports, Siemens SPECT-CT text\n\
                  dumps, and GE text dumps."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare one or two protocol files and write a comparison workbook.
    Compare(CompareArgs),

    /// Extract protocol parameters into an interchange JSON file.
    Extract(ExtractArgs),

    /// Compare every matching protocol file across two snapshot folders.
    Batch(BatchArgs),

    /// List the built-in vendor profiles.
    Profiles,
}

#[derive(Parser)]
pub struct CompareArgs {
    /// First protocol file, or an interchange JSON with --interchange.
    #[arg(value_name = "FIRST")]
    pub first: PathBuf,

    /// Second protocol file. When omitted, FIRST is rendered on its own.
    #[arg(value_name = "SECOND")]
    pub second: Option<PathBuf>,

    /// Scanner family the protocol files come from.
    #[arg(long = "vendor", value_enum)]
    pub vendor: VendorArg,

    /// Treat FIRST as an interchange JSON instead of a vendor file.
    #[arg(long = "interchange", conflicts_with = "second")]
    pub interchange: bool,

    /// Output workbook path (default: FIRST with an .xlsx extension).
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Also write the extracted parameters as interchange JSON.
    #[arg(long = "json-out", value_name = "PATH")]
    pub json_out: Option<PathBuf>,

    /// Directory of lookup-table JSON files overriding the built-in set.
    #[arg(long = "tables", value_name = "DIR")]
    pub tables: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// One or two protocol files to extract.
    #[arg(value_name = "FILE", num_args = 1..=2, required = true)]
    pub files: Vec<PathBuf>,

    /// Scanner family the protocol files come from.
    #[arg(long = "vendor", value_enum)]
    pub vendor: VendorArg,

    /// Output JSON path (default: first file with a .json extension).
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Directory of lookup-table JSON files overriding the built-in set.
    #[arg(long = "tables", value_name = "DIR")]
    pub tables: Option<PathBuf>,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Folder holding the first protocol snapshot.
    #[arg(value_name = "FIRST_DIR")]
    pub first_dir: PathBuf,

    /// Folder holding the second protocol snapshot.
    #[arg(value_name = "SECOND_DIR")]
    pub second_dir: PathBuf,

    /// Scanner family the protocol files come from.
    #[arg(long = "vendor", value_enum)]
    pub vendor: VendorArg,

    /// Directory for the generated workbooks (default: ./comparison).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory of lookup-table JSON files overriding the built-in set.
    #[arg(long = "tables", value_name = "DIR")]
    pub tables: Option<PathBuf>,
}

/// Supported scanner families.
#[derive(Clone, Copy, ValueEnum)]
pub enum VendorArg {
    /// Siemens Force hierarchical XML export.
    SiemensForce,
    /// Siemens SPECT-CT semi-structured text dump.
    SiemensSpectCt,
    /// GE brace-delimited text dump.
    GeOptima,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
