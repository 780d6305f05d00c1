//! CSV ingestion of MOER data.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::SimError;
use crate::forecast::{EmissionsRow, EmissionsSeries};

#[derive(Debug, Deserialize)]
struct MoerRecord {
    #[serde(alias = "Timestamp", alias = "point_time")]
    timestamp: String,
    #[serde(rename = "MOER", alias = "moer")]
    moer: f64,
}

/// Parses a timestamp in RFC 3339, `YYYY-MM-DD HH:MM:SS+HH:MM`, or naive
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC) form.
///
/// # Errors
///
/// Returns [`SimError::MalformedInput`] if none of the formats match.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SimError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| SimError::malformed(format!("unrecognized timestamp \"{raw}\"")))
}

/// Reads a MOER series from CSV.
///
/// The header must contain a `timestamp` column and a `MOER` (or `moer`)
/// column; other columns are ignored. Rows are sorted by timestamp before
/// the series is built.
///
/// # Errors
///
/// Returns [`SimError::Csv`] for unreadable CSV and
/// [`SimError::MalformedInput`] for bad timestamps or duplicate rows.
pub fn read_moer_csv(reader: impl Read) -> Result<EmissionsSeries, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize::<MoerRecord>() {
        let record = record?;
        rows.push(EmissionsRow {
            timestamp: parse_timestamp(&record.timestamp)?,
            moer: record.moer,
        });
    }
    rows.sort_by_key(|r| r.timestamp);
    EmissionsSeries::from_rows(rows)
}

/// Reads a MOER series from a CSV file.
///
/// # Errors
///
/// Returns [`SimError::Io`] if the file cannot be opened, otherwise as
/// [`read_moer_csv`].
pub fn read_moer_csv_path(path: &Path) -> Result<EmissionsSeries, SimError> {
    let file = File::open(path)?;
    read_moer_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_all_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2019, 3, 1, 0, 5, 0).unwrap();
        assert_eq!(parse_timestamp("2019-03-01T00:05:00Z").ok(), Some(expected));
        assert_eq!(parse_timestamp("2019-03-01 00:05:00+00:00").ok(), Some(expected));
        assert_eq!(parse_timestamp("2019-03-01 00:05:00").ok(), Some(expected));
        assert_eq!(parse_timestamp("2019-03-01 01:05:00+01:00").ok(), Some(expected));
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(SimError::MalformedInput(_))
        ));
    }

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let csv = "\
timestamp,MOER,version
2019-03-01 00:05:00+00:00,950.5,3.0
2019-03-01 00:00:00+00:00,1000.0,3.0
";
        let series = read_moer_csv(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.rows()[0].moer, 1000.0);
        assert_eq!(series.rows()[1].moer, 950.5);
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let csv = "\
timestamp,moer
2019-03-01T00:00:00Z,1.0
2019-03-01T00:00:00Z,2.0
";
        assert!(matches!(
            read_moer_csv(csv.as_bytes()),
            Err(SimError::MalformedInput(_))
        ));
    }

    #[test]
    fn non_numeric_rate_is_a_csv_error() {
        let csv = "timestamp,MOER\n2019-03-01T00:00:00Z,lots\n";
        assert!(matches!(read_moer_csv(csv.as_bytes()), Err(SimError::Csv(_))));
    }
}
