use calamine::{open_workbook_auto, Data, DataType, Reader};
use std::path::Path;
use tracing::{debug, warn};

use super::table::Table;
use crate::error::Error;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read a spreadsheet export (or a plain CSV) into a [`Table`] named `name`.
/// The first row supplies column names. `sheet` defaults to the first sheet.
pub fn read_table(path: &Path, name: &str, sheet: Option<&str>) -> Result<Table, Error> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let table = if extension == "csv" {
        read_csv(path, name)?
    } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path, name, sheet)?
    } else {
        return Err(Error::UnsupportedInput(path.display().to_string()));
    };

    if table.is_empty() {
        warn!("{} has a header but no data rows", path.display());
    }
    debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

fn read_csv(path: &Path, name: &str) -> Result<Table, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut table = Table::new(name, columns);

    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter());
    }
    Ok(table)
}

fn read_workbook(path: &Path, name: &str, sheet: Option<&str>) -> Result<Table, Error> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = match sheet {
        Some(sheet) => sheet.to_string(),
        None => workbook.sheet_names().into_iter().next().ok_or_else(|| {
            Error::Other(format!("Workbook {} has no sheets", path.display()))
        })?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header.iter().map(|cell| cell_text(cell).trim().to_string()).collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(name, columns);
    for row in rows {
        table.push_row(row.iter().map(cell_text));
    }
    Ok(table)
}

/// Render a cell the way it reads in the spreadsheet: whole numbers without
/// a trailing `.0`, dates as ISO days.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}
