//! CSV export of a weekly plan.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::optimize::DayRecord;

/// Column header for the day-record CSV export.
const HEADER: &str = "date,load_forecast,solar_forecast,v2g_available_forecast,\
                       net_deficit,v2g_energy,diesel_energy,v2g_cost,diesel_cost,\
                       total_cost,decision";

/// Exports day records to a CSV file at the given path.
///
/// Writes a header row followed by one row per day. Produces byte-identical
/// output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(days: &[DayRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(days, buf)
}

/// Writes day records as CSV to any writer.
///
/// # Arguments
///
/// * `days` - Day records in calendar order
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(days: &[DayRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for d in days {
        wtr.write_record(&[
            d.date.format("%Y-%m-%d").to_string(),
            format!("{:.4}", d.load_forecast),
            format!("{:.4}", d.solar_forecast),
            format!("{:.4}", d.v2g_available_forecast),
            format!("{:.4}", d.net_deficit),
            format!("{:.4}", d.v2g_energy),
            format!("{:.4}", d.diesel_energy),
            format!("{:.2}", d.v2g_cost),
            format!("{:.2}", d.diesel_cost),
            format!("{:.2}", d.total_cost),
            d.decision.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::optimize::{PriceParameters, day_record};

    fn week() -> Vec<DayRecord> {
        let prices = PriceParameters::new(2.0, 1.0).expect("valid prices");
        let start = NaiveDate::from_ymd_opt(2022, 6, 8).unwrap_or_default();
        [50.0, 0.0, 80.0, 20.0, 100.0, 0.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, &v2g)| day_record(start + TimeDelta::days(i as i64), 100.0, 30.0, v2g, &prices))
            .collect()
    }

    fn render(days: &[DayRecord]) -> String {
        let mut buf = Vec::new();
        write_csv(days, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_lists_day_record_columns() {
        let output = render(&week());
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "date,load_forecast,solar_forecast,v2g_available_forecast,\
             net_deficit,v2g_energy,diesel_energy,v2g_cost,diesel_cost,\
             total_cost,decision"
        );
    }

    #[test]
    fn one_row_per_day() {
        let output = render(&week());
        // 1 header + 7 days
        assert_eq!(output.lines().count(), 8);
    }

    #[test]
    fn first_row_values() {
        let output = render(&week());
        let row = output.lines().nth(1).unwrap_or("");
        assert_eq!(
            row,
            "2022-06-08,100.0000,30.0000,50.0000,70.0000,50.0000,20.0000,50.00,40.00,90.00,use_v2g"
        );
    }

    #[test]
    fn deterministic_output() {
        assert_eq!(render(&week()), render(&week()));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("plan.csv");
        export_csv(&week(), &path).expect("export");
        let written = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(written, render(&week()));
    }
}
