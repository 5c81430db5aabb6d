//! Loading input datasets and writing reconciliation reports.
//!
//! Inputs are either spreadsheet workbooks (read with `calamine`, one named
//! sheet per side) or CSV/TSV files. Reports are written as a single `.xlsx`
//! workbook via `rust_xlsxwriter`, or as one CSV file per output unit inside a
//! directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Reader, open_workbook_auto};
use itertools::Itertools;
use log::{debug, info, warn};
use rust_xlsxwriter::{Format, Workbook};

use crate::{
    cli::InputArgs,
    dataset::{self, CellValue, Dataset},
    io_utils,
};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Last row index a worksheet can hold, header row included.
pub const SHEET_ROW_LIMIT: usize = 1_048_576;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Spreadsheet,
    Delimited,
}

pub fn input_kind(path: &Path) -> Result<InputKind> {
    if io_utils::is_dash(path) {
        return Ok(InputKind::Delimited);
    }
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        Ok(InputKind::Spreadsheet)
    } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(InputKind::Delimited)
    } else {
        Err(anyhow!(
            "Unsupported input {path:?}: expected one of {}",
            SPREADSHEET_EXTENSIONS
                .iter()
                .chain(DELIMITED_EXTENSIONS)
                .map(|ext| format!(".{ext}"))
                .join(", ")
        ))
    }
}

pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Reads one sheet; its first used row supplies the headers.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let available = workbook.sheet_names().to_vec();
    if !available.iter().any(|name| name == sheet) {
        bail!(
            "Sheet '{sheet}' not found in {path:?}; available sheets: {}",
            available.join(", ")
        );
    }
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Reading sheet '{sheet}' from {path:?}"))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell_value(cell) {
                CellValue::Empty => format!("Unnamed: {idx}"),
                other => other.as_display(),
            })
            .collect(),
        None => Vec::new(),
    };
    let mut dataset = Dataset::new(sheet, headers);
    for row in rows {
        dataset.push_row(row.iter().map(cell_value).collect());
    }
    debug!(
        "Sheet '{}' holds {} column(s) and {} row(s)",
        sheet,
        dataset.headers.len(),
        dataset.len()
    );
    Ok(dataset)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_datetime() => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => dataset::parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
    }
}

/// Loads one side from a workbook sheet or a CSV file.
pub fn load_dataset(
    path: &Path,
    sheet: Option<&str>,
    label: &str,
    inputs: &InputArgs,
) -> Result<Dataset> {
    match input_kind(path)? {
        InputKind::Spreadsheet => {
            let sheet = sheet.ok_or_else(|| {
                anyhow!("--{label}-sheet is required when reading workbook {path:?}")
            })?;
            read_sheet(path, sheet)
        }
        InputKind::Delimited => {
            if let Some(sheet) = sheet {
                warn!("Ignoring sheet '{sheet}' for delimited input {path:?}");
            }
            let delimiter = io_utils::resolve_input_delimiter(path, inputs.delimiter);
            let encoding = io_utils::resolve_encoding(inputs.input_encoding.as_deref())?;
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(label);
            io_utils::read_dataset(path, name, delimiter, encoding)
                .with_context(|| format!("Reading {path:?}"))
        }
    }
}

/// Resolves and loads the left and right datasets.
pub fn load_pair(inputs: &InputArgs) -> Result<(Dataset, Dataset)> {
    let left_path = side_path(inputs.left.as_ref(), inputs.input.as_ref(), "left")?;
    let right_path = side_path(inputs.right.as_ref(), inputs.input.as_ref(), "right")?;
    if io_utils::is_dash(&left_path) && io_utils::is_dash(&right_path) {
        bail!("Only one input can be read from stdin");
    }
    let left = load_dataset(&left_path, inputs.left_sheet.as_deref(), "left", inputs)?;
    let right = load_dataset(&right_path, inputs.right_sheet.as_deref(), "right", inputs)?;
    info!(
        "Loaded '{}' ({} row(s)) and '{}' ({} row(s))",
        left.name,
        left.len(),
        right.name,
        right.len()
    );
    Ok((left, right))
}

fn side_path(side: Option<&PathBuf>, shared: Option<&PathBuf>, label: &str) -> Result<PathBuf> {
    side.or(shared)
        .cloned()
        .ok_or_else(|| anyhow!("No {label} input given; use --{label} or --input"))
}

/// Destination for the tables of a reconciliation report.
pub trait ReportSink {
    fn write_table(
        &mut self,
        name: &str,
        headers: &[String],
        rows: &mut dyn Iterator<Item = Vec<CellValue>>,
    ) -> Result<usize>;

    fn finish(self: Box<Self>) -> Result<()>;
}

/// Opens the sink matching `path`: `.xlsx` writes a workbook, anything else
/// is treated as a directory of CSV files.
pub fn open_sink(path: &Path) -> Result<Box<dyn ReportSink>> {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        Ok(Box::new(XlsxSink::new(path)))
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Creating output directory {path:?}"))?;
        Ok(Box::new(CsvDirSink {
            dir: path.to_path_buf(),
        }))
    }
}

pub struct XlsxSink {
    path: PathBuf,
    workbook: Workbook,
    header_format: Format,
    date_format: Format,
    datetime_format: Format,
}

impl XlsxSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            workbook: Workbook::new(),
            header_format: Format::new().set_bold(),
            date_format: Format::new().set_num_format("yyyy-mm-dd"),
            datetime_format: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        }
    }
}

impl ReportSink for XlsxSink {
    fn write_table(
        &mut self,
        name: &str,
        headers: &[String],
        rows: &mut dyn Iterator<Item = Vec<CellValue>>,
    ) -> Result<usize> {
        let worksheet = self
            .workbook
            .add_worksheet()
            .set_name(name)
            .with_context(|| format!("Creating sheet '{name}'"))?;
        for (col, header) in headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, header, &self.header_format)
                .with_context(|| format!("Writing header '{header}' to sheet '{name}'"))?;
        }
        let mut written = 0usize;
        for row in rows {
            if written + 1 >= SHEET_ROW_LIMIT {
                bail!("Sheet '{name}' exceeds {SHEET_ROW_LIMIT} rows");
            }
            let row_idx = (written + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                let outcome = match cell {
                    CellValue::Text(s) => worksheet.write_string(row_idx, col, s).map(|_| ()),
                    CellValue::Number(n) => worksheet.write_number(row_idx, col, *n).map(|_| ()),
                    CellValue::Bool(b) => worksheet.write_boolean(row_idx, col, *b).map(|_| ()),
                    CellValue::DateTime(dt) => {
                        let format = if cell.has_time() {
                            &self.datetime_format
                        } else {
                            &self.date_format
                        };
                        worksheet
                            .write_datetime_with_format(row_idx, col, dt, format)
                            .map(|_| ())
                    }
                    CellValue::Empty => Ok(()),
                };
                outcome.with_context(|| format!("Writing row {} of sheet '{name}'", row_idx + 1))?;
            }
            written += 1;
        }
        Ok(written)
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.workbook
            .save(&self.path)
            .with_context(|| format!("Saving workbook {:?}", self.path))
    }
}

pub struct CsvDirSink {
    dir: PathBuf,
}

impl ReportSink for CsvDirSink {
    fn write_table(
        &mut self,
        name: &str,
        headers: &[String],
        rows: &mut dyn Iterator<Item = Vec<CellValue>>,
    ) -> Result<usize> {
        let path = self.dir.join(format!("{name}.csv"));
        io_utils::write_rows(&path, headers, rows)
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
