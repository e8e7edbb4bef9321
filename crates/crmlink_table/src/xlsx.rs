//! Spreadsheet table format.

use crate::error::{TableError, TableResult};
use crate::format::TableFormat;
use crate::table::TabularData;
use calamine::{Data, Reader, Xlsx};
use chrono::{DateTime, NaiveDate, Utc};
use crmlink_codec::{to_json_string, Map, Value};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::io::Cursor;

/// Display format applied to date cells.
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Sheet name used when the table has none.
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Longest sheet name a workbook accepts.
const MAX_SHEET_NAME_LEN: usize = 31;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// First sheet of a workbook; the first row holds the column headers.
///
/// Cells with a blank header or a blank value are skipped on load. Numbers
/// come back as integers when whole. Dates are stored as serial numbers
/// with a date display format. Tags are not kept: a tagged value is
/// written as its inner value.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxFormat;

impl TableFormat for XlsxFormat {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn serialize(&self, table: &TabularData) -> TableResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name(table.name()))
            .map_err(TableError::spreadsheet)?;

        let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);
        let columns = table.columns();

        for (col, header) in columns.iter().enumerate() {
            worksheet
                .write_string(0, column_index(col)?, header)
                .map_err(TableError::spreadsheet)?;
        }

        for (index, row) in table.rows().iter().enumerate() {
            let row_num = u32::try_from(index + 1)
                .map_err(|_| TableError::spreadsheet("too many rows"))?;
            for (key, value) in row {
                let Some(col) = columns.iter().position(|c| c == key) else {
                    continue;
                };
                write_cell(worksheet, row_num, column_index(col)?, value, &date_format)?;
            }
        }

        workbook.save_to_buffer().map_err(TableError::spreadsheet)
    }

    fn deserialize(&self, bytes: &[u8]) -> TableResult<TabularData> {
        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes.to_vec())).map_err(TableError::spreadsheet)?;
        let Some(sheet) = workbook.sheet_names().first().cloned() else {
            return Err(TableError::invalid_document("workbook has no sheets"));
        };
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(TableError::spreadsheet)?;

        let mut table = TabularData::named(sheet);
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(table);
        };
        let headers: Vec<Option<String>> = header_row.iter().map(header_text).collect();

        for cells in rows {
            let mut row = Map::new();
            for (header, cell) in headers.iter().zip(cells) {
                if let (Some(header), Some(value)) = (header, cell_value(cell)) {
                    row.insert(header.as_str(), value);
                }
            }
            table.push(row);
        }
        Ok(table)
    }
}

fn column_index(col: usize) -> TableResult<u16> {
    u16::try_from(col).map_err(|_| TableError::spreadsheet("too many columns"))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: &Format,
) -> TableResult<()> {
    let value = value.as_tagged().map_or(value, |(_, inner)| inner);
    let written = match value {
        Value::Null => return Ok(()),
        Value::Bool(b) => worksheet.write_boolean(row, col, *b),
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(n) => worksheet.write_number(row, col, *n as f64),
        Value::Double(d) => worksheet.write_number(row, col, *d),
        Value::Text(s) => worksheet.write_string(row, col, s),
        Value::DateTime(d) => {
            worksheet.write_number_with_format(row, col, to_serial(d), date_format)
        }
        Value::Array(_) | Value::Map(_) => {
            let text = to_json_string(value)?;
            worksheet.write_string(row, col, &text)
        }
    };
    written.map(|_| ()).map_err(TableError::spreadsheet)
}

fn header_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => return None,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Int(n) => Some(Value::Integer(*n)),
        Data::Float(f) => Some(number_value(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(d) => from_serial(d.as_f64()).map(Value::DateTime),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::Text(s.clone())),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::Integer(f as i64)
    } else {
        Value::Double(f)
    }
}

fn serial_epoch() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[allow(clippy::cast_precision_loss)]
fn to_serial(date: &DateTime<Utc>) -> f64 {
    let millis = date.signed_duration_since(serial_epoch()).num_milliseconds();
    millis as f64 / MILLIS_PER_DAY
}

#[allow(clippy::cast_possible_truncation)]
fn from_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    serial_epoch().checked_add_signed(chrono::Duration::milliseconds(millis))
}

fn sheet_name(name: Option<&str>) -> String {
    let cleaned: String = name
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.trim().is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
