use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile two spreadsheet sheets or CSV files against a join key",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the sheet names of a workbook
    Sheets(SheetsArgs),
    /// List join column candidates shared by both inputs
    Columns(ColumnsArgs),
    /// Match rows of both inputs and write matched rows and anomalies
    Reconcile(ReconcileArgs),
}

#[derive(Debug, Args)]
pub struct SheetsArgs {
    /// Workbook to inspect (.xlsx, .xlsm, .xls, .xlsb, .ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

/// Where the left and right datasets come from.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Workbook holding both sheets (shorthand for --left and --right)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Left workbook or CSV file
    #[arg(long = "left")]
    pub left: Option<PathBuf>,
    /// Right workbook or CSV file
    #[arg(long = "right")]
    pub right: Option<PathBuf>,
    /// Sheet to read from the left workbook
    #[arg(long = "left-sheet")]
    pub left_sheet: Option<String>,
    /// Sheet to read from the right workbook
    #[arg(long = "right-sheet")]
    pub right_sheet: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Offer the composite key of these two columns, e.g. `Company,NPP`
    #[arg(long, value_parser = parse_column_pair)]
    pub composite: Option<(String, String)>,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Join column, or two columns joined by '|' for a composite key
    #[arg(short = 'c', long = "column")]
    pub column: Option<String>,
    /// Matching strategy: exact or fuzzy (default exact)
    #[arg(long)]
    pub mode: Option<String>,
    /// Minimum fuzzy similarity score, 0-100 (default 80)
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Pair repeated key values by order of appearance in exact mode
    #[arg(long = "duplicate-aware")]
    pub duplicate_aware: bool,
    /// Maximum matched rows per output sheet (default 1000000)
    #[arg(long = "max-rows-per-sheet")]
    pub max_rows_per_sheet: Option<usize>,
    /// Output workbook (.xlsx) or directory for CSV output
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Also write the summary as JSON to this path
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
    /// YAML job file supplying defaults for the input, matching and output options
    #[arg(long)]
    pub job: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_column_pair(value: &str) -> Result<(String, String), String> {
    let parts = value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    match parts.as_slice() {
        [first, second] => Ok((first.to_string(), second.to_string())),
        _ => Err("Composite key must name exactly two columns, e.g. `Company,NPP`".to_string()),
    }
}
