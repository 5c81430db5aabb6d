//! YAML reconciliation jobs.
//!
//! A job file names the inputs and matching options once so a reconciliation
//! can be re-run with `sheet-recon reconcile --job job.yaml`. Any option given
//! on the command line wins over the job file.
//!
//! ```yaml
//! input: ledger.xlsx
//! left_sheet: Bank
//! right_sheet: Books
//! column: Company|NPP
//! mode: exact
//! duplicate_aware: true
//! summary_json: summary.json
//! ```
//!
//! CSV inputs may also set `delimiter` (same spellings as `--delimiter`) and
//! `input_encoding`.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    chunk::DEFAULT_MAX_ROWS_PER_UNIT,
    cli::{self, InputArgs, ReconcileArgs},
    engine::{MatchMode, ReconcileOptions},
    fuzzy::DEFAULT_THRESHOLD,
    normalize::KeySpec,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub input: Option<PathBuf>,
    pub left: Option<PathBuf>,
    pub right: Option<PathBuf>,
    pub left_sheet: Option<String>,
    pub right_sheet: Option<String>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub column: Option<String>,
    pub mode: Option<String>,
    pub threshold: Option<f64>,
    pub duplicate_aware: Option<bool>,
    pub max_rows_per_sheet: Option<usize>,
    pub output: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening job file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing job file {path:?}"))
    }
}

/// Fully resolved reconciliation request.
#[derive(Debug, Clone)]
pub struct ReconcileJob {
    pub inputs: InputArgs,
    pub options: ReconcileOptions,
    pub max_rows_per_sheet: usize,
    pub output: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

impl ReconcileJob {
    pub fn resolve(args: &ReconcileArgs) -> Result<Self> {
        let job = match &args.job {
            Some(path) => JobConfig::load(path)?,
            None => JobConfig::default(),
        };
        Self::merge(args, job)
    }

    /// Command-line values first, then the job file, then defaults.
    pub fn merge(args: &ReconcileArgs, job: JobConfig) -> Result<Self> {
        let given = &args.inputs;
        let job_delimiter = job
            .delimiter
            .as_deref()
            .map(cli::parse_delimiter)
            .transpose()
            .map_err(|err| anyhow!("Invalid delimiter in job file: {err}"))?;
        let inputs = InputArgs {
            input: given.input.clone().or(job.input),
            left: given.left.clone().or(job.left),
            right: given.right.clone().or(job.right),
            left_sheet: given.left_sheet.clone().or(job.left_sheet),
            right_sheet: given.right_sheet.clone().or(job.right_sheet),
            delimiter: given.delimiter.or(job_delimiter),
            input_encoding: given.input_encoding.clone().or(job.input_encoding),
        };
        let column = args
            .column
            .clone()
            .or(job.column)
            .ok_or_else(|| anyhow!("A join column is required (--column or `column:` in the job file)"))?;
        let key = KeySpec::parse(&column)?;
        let mode = match args.mode.as_deref().or(job.mode.as_deref()) {
            Some(value) => value.parse::<MatchMode>()?,
            None => MatchMode::Exact,
        };
        let options = ReconcileOptions::new(key, mode)
            .with_threshold(args.threshold.or(job.threshold).unwrap_or(DEFAULT_THRESHOLD))
            .with_duplicate_aware(args.duplicate_aware || job.duplicate_aware.unwrap_or(false));
        Ok(Self {
            inputs,
            options,
            max_rows_per_sheet: args
                .max_rows_per_sheet
                .or(job.max_rows_per_sheet)
                .unwrap_or(DEFAULT_MAX_ROWS_PER_UNIT),
            output: args.output.clone().or(job.output),
            summary_json: args.summary_json.clone().or(job.summary_json),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    fn args() -> ReconcileArgs {
        ReconcileArgs {
            inputs: InputArgs::default(),
            column: None,
            mode: None,
            threshold: None,
            duplicate_aware: false,
            max_rows_per_sheet: None,
            output: None,
            summary_json: None,
            job: None,
        }
    }

    #[test]
    fn job_yaml_supplies_defaults() {
        let job: JobConfig = serde_yaml::from_str(
            "input: book.xlsx\nleft_sheet: A\nright_sheet: B\ncolumn: Company|NPP\nmode: fuzzy\nthreshold: 90\n",
        )
        .unwrap();
        let resolved = ReconcileJob::merge(&args(), job).unwrap();
        assert_eq!(resolved.inputs.input, Some(PathBuf::from("book.xlsx")));
        assert_eq!(resolved.options.key, KeySpec::composite("Company", "NPP"));
        assert_eq!(resolved.options.mode, MatchMode::Fuzzy);
        assert_eq!(resolved.options.threshold, 90.0);
        assert_eq!(resolved.max_rows_per_sheet, DEFAULT_MAX_ROWS_PER_UNIT);
    }

    #[test]
    fn command_line_overrides_job() {
        let mut cli = args();
        cli.column = Some("Invoice".into());
        cli.mode = Some("exact".into());
        cli.inputs.left_sheet = Some("Override".into());
        let job = JobConfig {
            column: Some("Company".into()),
            mode: Some("fuzzy".into()),
            left_sheet: Some("A".into()),
            ..JobConfig::default()
        };
        let resolved = ReconcileJob::merge(&cli, job).unwrap();
        assert_eq!(resolved.options.key, KeySpec::Column("Invoice".into()));
        assert_eq!(resolved.options.mode, MatchMode::Exact);
        assert_eq!(resolved.inputs.left_sheet.as_deref(), Some("Override"));
        assert_eq!(resolved.options.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn unknown_mode_surfaces_engine_error() {
        let mut cli = args();
        cli.column = Some("Company".into());
        cli.mode = Some("approx".into());
        let err = ReconcileJob::merge(&cli, JobConfig::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ReconcileError>(),
            Some(&ReconcileError::InvalidMode {
                mode: "approx".into()
            })
        );
    }

    #[test]
    fn job_supplies_csv_and_summary_options() {
        let mut cli = args();
        cli.column = Some("Invoice".into());
        let job: JobConfig = serde_yaml::from_str(
            "delimiter: tab\ninput_encoding: windows-1252\nsummary_json: out/summary.json\n",
        )
        .unwrap();
        let resolved = ReconcileJob::merge(&cli, job.clone()).unwrap();
        assert_eq!(resolved.inputs.delimiter, Some(b'\t'));
        assert_eq!(resolved.inputs.input_encoding.as_deref(), Some("windows-1252"));
        assert_eq!(resolved.summary_json, Some(PathBuf::from("out/summary.json")));

        cli.inputs.delimiter = Some(b';');
        cli.summary_json = Some(PathBuf::from("cli.json"));
        let resolved = ReconcileJob::merge(&cli, job).unwrap();
        assert_eq!(resolved.inputs.delimiter, Some(b';'));
        assert_eq!(resolved.summary_json, Some(PathBuf::from("cli.json")));
    }

    #[test]
    fn bad_job_delimiter_is_rejected() {
        let mut cli = args();
        cli.column = Some("Invoice".into());
        let job = JobConfig {
            delimiter: Some("::".into()),
            ..JobConfig::default()
        };
        let err = ReconcileJob::merge(&cli, job).unwrap_err();
        assert!(err.to_string().contains("Invalid delimiter in job file"));
    }

    #[test]
    fn unknown_job_fields_are_rejected() {
        assert!(serde_yaml::from_str::<JobConfig>("colum: Company\n").is_err());
    }
}
