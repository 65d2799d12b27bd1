//! xlsx export backed by `rust_xlsxwriter`.

use crate::error::Result;
use crate::{ExportOutcome, Exporter};
use maplead_core::Record;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};

const SHEET_NAME: &str = "Leads";
const COLUMN_WIDTH: f64 = 28.0;

/// Column headers, in output order.
///
/// Website is only present when `include_website` is set.
pub fn columns(include_website: bool) -> Vec<&'static str> {
    let mut cols = vec!["Business Name", "Phone Number", "Address"];
    if include_website {
        cols.push("Website");
    }
    cols.extend(["Rating", "Location", "Google Maps URL"]);
    cols
}

#[derive(Debug, PartialEq)]
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

impl<'a> Cell<'a> {
    fn from_opt(value: Option<&'a str>) -> Self {
        value.map_or(Cell::Empty, Cell::Text)
    }
}

fn row_cells(record: &Record, include_website: bool) -> Vec<Cell<'_>> {
    let mut cells = vec![
        Cell::from_opt(record.name.as_deref()),
        Cell::from_opt(record.phone.as_deref()),
        Cell::from_opt(record.address.as_deref()),
    ];
    if include_website {
        cells.push(Cell::from_opt(record.website.as_deref()));
    }
    cells.push(record.rating.map_or(Cell::Empty, Cell::Number));
    cells.push(Cell::Text(&record.location));
    cells.push(Cell::Text(&record.maps_url));
    cells
}

/// Writes records to a single xlsx file, overwriting it each time.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    path: PathBuf,
}

impl XlsxExporter {
    /// Create an exporter writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_sheet(
        sheet: &mut Worksheet,
        records: &[Record],
        include_website: bool,
    ) -> Result<()> {
        sheet.set_name(SHEET_NAME)?;

        let header = Format::new().set_bold();
        for (col, title) in columns(include_website).into_iter().enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, title, &header)?;
            sheet.set_column_width(col, COLUMN_WIDTH)?;
        }

        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;
            for (col, cell) in row_cells(record, include_website).into_iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(text) => {
                        sheet.write_string(row, col, text)?;
                    }
                    Cell::Number(value) => {
                        sheet.write_number(row, col, value)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
        Ok(())
    }
}

impl Exporter for XlsxExporter {
    fn export(&self, records: &[Record], include_website: bool) -> Result<ExportOutcome> {
        if records.is_empty() {
            tracing::info!("No records to export, leaving {} untouched", self.path.display());
            return Ok(ExportOutcome::Skipped);
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut workbook = Workbook::new();
        Self::write_sheet(workbook.add_worksheet(), records, include_website)?;
        workbook.save(&self.path)?;

        tracing::info!(
            rows = records.len(),
            include_website,
            "Exported leads to {}",
            self.path.display()
        );

        Ok(ExportOutcome::Written {
            path: self.path.clone(),
            rows: records.len(),
        })
    }

    fn output_path(&self) -> &Path {
        &self.path
    }
}
