//! Tabular series ingestion from CSV and XLSX files.
//!
//! Each file needs a time column and a numeric value column; their names and
//! the encoding of the time column come from [`SeriesConfig`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use tracing::debug;

use super::{Observation, SeriesError, SeriesKind, TimeSeries};
use crate::config::{SeriesConfig, TimeFormat};

/// Accepted layouts for textual timestamps, tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
];

/// Day zero of the Excel 1900 date system (serial 0, leap-year bug included).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// A cell as read from either file format, before time/value interpretation.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    /// Excel date cell, as a serial day number.
    Serial(f64),
    Text(String),
}

/// Reads one series from `path` using the column layout in `config`.
///
/// The format is chosen by file extension (`.csv` or `.xlsx`). Rows whose
/// value cell is empty are skipped.
///
/// # Errors
///
/// Returns a [`SeriesError`] when the file cannot be read, a configured
/// column is missing, a cell cannot be interpreted, or the resulting series
/// is empty or out of order.
pub fn load_series(
    kind: SeriesKind,
    path: &Path,
    config: &SeriesConfig,
) -> Result<TimeSeries, SeriesError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match extension.as_deref() {
        Some("csv") => read_csv(path, config)?,
        Some("xlsx") => read_xlsx(path, config)?,
        _ => {
            return Err(SeriesError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let mut observations = Vec::with_capacity(rows.len());
    for (row, time_cell, value_cell) in rows {
        let Some(value) = parse_value(&value_cell, row)? else {
            continue;
        };
        let timestamp = parse_time(&time_cell, config.time_format, config.origin, row)?;
        observations.push(Observation::new(timestamp, value));
    }

    debug!(
        series = %kind,
        path = %path.display(),
        rows = observations.len(),
        "series file parsed"
    );
    TimeSeries::new(kind, observations)
}

/// Returns `(row_number, time_cell, value_cell)` triples; row numbers are
/// 1-based and count the header row.
fn read_csv(path: &Path, config: &SeriesConfig) -> Result<Vec<(usize, Cell, Cell)>, SeriesError> {
    let csv_err = |source: csv::Error| SeriesError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let time_idx = column_index(headers.iter(), &config.time_column, path)?;
    let value_idx = column_index(headers.iter(), &config.value_column, path)?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let text_cell = |idx: usize| match record.get(idx) {
            Some("") | None => Cell::Empty,
            Some(s) => Cell::Text(s.to_string()),
        };
        rows.push((i + 2, text_cell(time_idx), text_cell(value_idx)));
    }
    Ok(rows)
}

fn read_xlsx(path: &Path, config: &SeriesConfig) -> Result<Vec<(usize, Cell, Cell)>, SeriesError> {
    let xlsx_err = |message: String| SeriesError::Xlsx {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook: Xlsx<BufReader<File>> =
        open_workbook(path).map_err(|e: calamine::XlsxError| xlsx_err(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first_sheet) = sheet_names.first() else {
        return Err(xlsx_err("no sheets found".to_string()));
    };
    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| xlsx_err(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Err(xlsx_err("worksheet is empty".to_string()));
    };
    let header_names: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();
    let time_idx = column_index(header_names.iter().map(String::as_str), &config.time_column, path)?;
    let value_idx = column_index(header_names.iter().map(String::as_str), &config.value_column, path)?;

    let rows = sheet_rows
        .enumerate()
        .map(|(i, row)| {
            let cell = |idx: usize| row.get(idx).map_or(Cell::Empty, xlsx_cell);
            (i + 2, cell(time_idx), cell(value_idx))
        })
        .collect();
    Ok(rows)
}

fn xlsx_cell(data: &Data) -> Cell {
    match data {
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(x) => Cell::Number(*x),
        Data::DateTime(dt) => Cell::Serial(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.trim().to_string())
            }
        }
        Data::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

fn column_index<'a>(
    mut headers: impl Iterator<Item = &'a str>,
    column: &str,
    path: &Path,
) -> Result<usize, SeriesError> {
    headers
        .position(|h| h == column)
        .ok_or_else(|| SeriesError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

fn parse_value(cell: &Cell, row: usize) -> Result<Option<f64>, SeriesError> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(x) | Cell::Serial(x) => Ok(Some(*x)),
        Cell::Text(s) => s.parse::<f64>().map(Some).map_err(|_| SeriesError::Parse {
            row,
            message: format!("value \"{s}\" is not a number"),
        }),
    }
}

fn parse_time(
    cell: &Cell,
    format: TimeFormat,
    origin: NaiveDateTime,
    row: usize,
) -> Result<NaiveDateTime, SeriesError> {
    let parse_err = |message: String| SeriesError::Parse { row, message };

    let offset = |unit_seconds: f64| -> Result<NaiveDateTime, SeriesError> {
        let amount = match cell {
            Cell::Number(x) | Cell::Serial(x) => *x,
            Cell::Text(s) => s
                .parse::<f64>()
                .map_err(|_| parse_err(format!("time offset \"{s}\" is not a number")))?,
            Cell::Empty => return Err(parse_err("missing time".to_string())),
        };
        if !amount.is_finite() {
            return Err(parse_err(format!("time offset {amount} is not finite")));
        }
        let millis = (amount * unit_seconds * 1000.0).round() as i64;
        TimeDelta::try_milliseconds(millis)
            .and_then(|delta| origin.checked_add_signed(delta))
            .ok_or_else(|| parse_err(format!("time offset {amount} out of range")))
    };

    match format {
        TimeFormat::SecondsOffset => offset(1.0),
        TimeFormat::HoursOffset => offset(3600.0),
        TimeFormat::Datetime => match cell {
            Cell::Number(x) | Cell::Serial(x) => excel_serial_to_datetime(*x)
                .ok_or_else(|| parse_err(format!("date serial {x} out of range"))),
            Cell::Text(s) => parse_datetime_text(s)
                .ok_or_else(|| parse_err(format!("cannot parse timestamp \"{s}\""))),
            Cell::Empty => Err(parse_err("missing time".to_string())),
        },
    }
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}
