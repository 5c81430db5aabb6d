use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::{
    chunk,
    cli::ReconcileArgs,
    dataset::{CellValue, Dataset},
    engine::{self, Reconciliation},
    error::Side,
    job::ReconcileJob,
    layout,
    summary::Summary,
    table,
    workbook::{self, ReportSink, SHEET_ROW_LIMIT},
};

pub fn execute(args: &ReconcileArgs) -> Result<()> {
    let job = ReconcileJob::resolve(args)?;
    let options = &job.options;
    let output = job
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(layout::default_output_name(&options.key, options.mode)));
    if job.max_rows_per_sheet >= SHEET_ROW_LIMIT {
        bail!(
            "--max-rows-per-sheet must leave room for a header row (at most {})",
            SHEET_ROW_LIMIT - 1
        );
    }

    let (left, right) = workbook::load_pair(&job.inputs)?;
    options
        .key
        .validate(&left, Side::Left)
        .with_context(|| format!("Validating join column against '{}'", left.name))?;
    options
        .key
        .validate(&right, Side::Right)
        .with_context(|| format!("Validating join column against '{}'", right.name))?;

    info!(
        "Reconciling '{}' against '{}' on '{}' ({} mode)",
        left.name, right.name, options.key, options.mode
    );
    let result = engine::reconcile(&left, &right, options)?;
    let summary = Summary::from_reconciliation(&left, &right, &result);
    info!(
        "Matched {} row(s); {} left and {} right anomaly row(s)",
        summary.matched, summary.left_anomalies, summary.right_anomalies
    );

    let sink = workbook::open_sink(&output)?;
    write_report(sink, &left, &right, &result, &summary, job.max_rows_per_sheet)
        .with_context(|| format!("Writing report to {output:?}"))?;
    info!("Report written to {output:?}");

    if let Some(path) = &job.summary_json {
        let json = serde_json::to_string_pretty(&summary).context("Serializing summary")?;
        fs::write(path, json).with_context(|| format!("Writing summary to {path:?}"))?;
        debug!("Summary JSON written to {path:?}");
    }

    print_summary(&summary);
    Ok(())
}

/// Writes `Summary`, the `Data_Matched_<n>` units, `AnomalyLeft` and
/// `AnomalyRight`, in that order.
pub fn write_report(
    mut sink: Box<dyn ReportSink>,
    left: &Dataset,
    right: &Dataset,
    result: &Reconciliation,
    summary: &Summary,
    max_rows_per_sheet: usize,
) -> Result<()> {
    let summary_headers = vec!["Metric".to_string(), "Value".to_string()];
    let mut summary_rows = summary
        .metrics()
        .into_iter()
        .map(|(label, value)| vec![CellValue::Text(label.to_string()), CellValue::Number(value)]);
    sink.write_table(layout::SUMMARY_SHEET, &summary_headers, &mut summary_rows)?;

    let matched_headers = layout::matched_headers(left, right, result.mode);
    let units = chunk::chunk_units(
        &result.matched,
        max_rows_per_sheet,
        layout::MATCHED_SHEET_BASE,
    )?;
    for unit in &units {
        let mut rows = unit
            .rows
            .iter()
            .map(|pair| layout::matched_row(left, right, result, pair));
        let written = sink.write_table(&unit.name, &matched_headers, &mut rows)?;
        debug!("Wrote {written} matched row(s) to '{}'", unit.name);
    }

    let mut left_rows = result
        .left_only
        .iter()
        .map(|row| layout::side_row(left, &result.left_keys, *row));
    sink.write_table(
        layout::LEFT_ANOMALY_SHEET,
        &layout::side_headers(left),
        &mut left_rows,
    )?;
    let mut right_rows = result
        .right_only
        .iter()
        .map(|row| layout::side_row(right, &result.right_keys, *row));
    sink.write_table(
        layout::RIGHT_ANOMALY_SHEET,
        &layout::side_headers(right),
        &mut right_rows,
    )?;
    sink.finish()
}

fn print_summary(summary: &Summary) {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = summary
        .metrics()
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), CellValue::Number(value).as_display()])
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}
