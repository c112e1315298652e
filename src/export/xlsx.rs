use std::path::Path;

use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use tracing::debug;

use crate::errors::{FinancingError, Result};
use crate::export::table::{Cell, ScheduleTable};

const SHEET_PREFIX: &str = "Financ-";
const MAX_SHEET_NAME_CHARS: usize = 31;

const DATE_FORMAT: &str = "dd/mm/yyyy";
const CURRENCY_FORMAT: &str = "\"R$\" #,##0.00";
const PERCENT_FORMAT: &str = "0.00%";
const INTEGER_FORMAT: &str = "0";

struct CellFormats {
    date: Format,
    currency: Format,
    percent: Format,
    integer: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            date: Format::new().set_num_format(DATE_FORMAT),
            currency: Format::new().set_num_format(CURRENCY_FORMAT),
            percent: Format::new().set_num_format(PERCENT_FORMAT),
            integer: Format::new().set_num_format(INTEGER_FORMAT),
        }
    }
}

/// worksheet name for a client: `Financ-<client>`, without the characters
/// Excel rejects and cut to 31 characters
pub fn sheet_name(client_name: &str) -> String {
    let name: String = format!("{}{}", SHEET_PREFIX, client_name.trim())
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    name.trim_end_matches('\'').to_string()
}

/// write the table as a single-sheet workbook at `path`
pub fn write_xlsx(table: &ScheduleTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = build_workbook(table)?;
    workbook.save(path)?;
    debug!(path = %path.display(), lines = table.line_count(), "xlsx written");
    Ok(())
}

/// the workbook file as bytes
pub fn xlsx_bytes(table: &ScheduleTable) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(table: &ScheduleTable) -> Result<Workbook> {
    let formats = CellFormats::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(table.client_name()))?;

    for (col, title) in table.header().iter().enumerate() {
        worksheet.write_string(0, column(col)?, title)?;
    }

    for (idx, line) in table.rows().iter().enumerate() {
        let row = u32::try_from(idx + 1)
            .map_err(|_| FinancingError::Export { message: format!("row {} out of range", idx + 1) })?;
        for (col, cell) in line.iter().enumerate() {
            write_cell(worksheet, row, column(col)?, cell, &formats)?;
        }
    }

    Ok(workbook)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &CellFormats,
) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Cell::Date(date) => {
            let year = u16::try_from(date.year()).map_err(|_| FinancingError::Export {
                message: format!("date {} cannot be written to a workbook", date),
            })?;
            // month and day always fit in u8
            let datetime = ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)?;
            worksheet.write_datetime_with_format(row, col, &datetime, &formats.date)?;
        }
        Cell::Integer(n) => {
            worksheet.write_number_with_format(row, col, *n as f64, &formats.integer)?;
        }
        Cell::Money(amount) => {
            worksheet.write_number_with_format(row, col, amount.to_f64(), &formats.currency)?;
        }
        Cell::Rate(rate) => {
            worksheet.write_number_with_format(row, col, rate.to_f64(), &formats.percent)?;
        }
    }
    Ok(())
}

fn column(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| FinancingError::Export {
        message: format!("column {} out of range", idx),
    })
}
