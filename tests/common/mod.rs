#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Writes a workbook with one sheet per `(name, rows)`; the first row of
    /// each sheet is its header. Data cells that look like plain numbers
    /// (no leading zero) are stored as numbers.
    pub fn write_workbook(&self, name: &str, sheets: &[(&str, &[&[&str]])]) -> PathBuf {
        let path = self.join(name);
        let mut workbook = Workbook::new();
        for (sheet_name, rows) in sheets {
            let worksheet = workbook
                .add_worksheet()
                .set_name(*sheet_name)
                .expect("sheet name");
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    let numeric = r > 0 && !value.starts_with('0');
                    match value.parse::<f64>() {
                        Ok(number) if numeric => {
                            worksheet
                                .write_number(r as u32, c as u16, number)
                                .expect("write number");
                        }
                        _ => {
                            worksheet
                                .write_string(r as u32, c as u16, *value)
                                .expect("write string");
                        }
                    }
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

/// Reads a CSV output unit into header + rows of plain strings.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .expect("open csv");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| record.expect("record").iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}
