//! Lead export loading.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

use demand_facade::{Dimension, ObservationRecord};

use crate::error::{CliError, CliResult};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One row of the lead export. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct LeadRow {
    enquiry_date: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    dealer: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    kva_range: String,
    #[serde(default)]
    segment: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    order_value: Option<f64>,
}

impl LeadRow {
    fn into_record(self) -> Option<ObservationRecord> {
        let date = parse_date(&self.enquiry_date)?;
        Some(
            ObservationRecord::new(date)
                .with(Dimension::State, self.state)
                .with(Dimension::Dealer, self.dealer)
                .with(Dimension::Location, self.location)
                .with(Dimension::CapacityRange, self.kva_range)
                .with(Dimension::Sector, self.segment)
                .with_order_value(self.order_value.unwrap_or(0.0)),
        )
    }
}

/// Records read from an export plus the number of rows dropped.
#[derive(Debug, Default)]
pub struct LoadedLeads {
    pub records: Vec<ObservationRecord>,
    pub skipped: usize,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.date())
        })
}

/// Read lead rows from any CSV source with a header line.
pub fn read_leads<R: Read>(reader: R) -> CliResult<LoadedLeads> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let mut loaded = LoadedLeads::default();
    for row in csv_reader.deserialize::<LeadRow>() {
        match row?.into_record() {
            Some(record) => loaded.records.push(record),
            None => loaded.skipped += 1,
        }
    }
    Ok(loaded)
}

/// Load a lead export, failing when no row has a usable date.
pub fn load_leads(path: &Path) -> CliResult<Vec<ObservationRecord>> {
    let file = File::open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_leads(BufReader::new(file))?;

    if loaded.skipped > 0 {
        warn!(
            skipped = loaded.skipped,
            path = %path.display(),
            "Skipped rows without a parsable enquiry_date"
        );
    }
    if loaded.records.is_empty() {
        return Err(CliError::EmptyInput(path.to_path_buf()));
    }

    info!(records = loaded.records.len(), path = %path.display(), "Loaded lead export");
    Ok(loaded.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXPORT: &str = "\
enquiry_date,state,dealer,location,kva_range,segment,order_value,owner
2026-03-02,Maharashtra,D1,Pune,15-62.5,Retail,125000,ops
2026-03-03,Maharashtra,D1,,62.5-125,,,
not a date,Maharashtra,D2,Nashik,,Retail,10,
04/03/2026,Gujarat,D9,Surat,,Industrial,-5,
";

    fn export_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(parse_date("2026-03-04"), Some(expected));
        assert_eq!(parse_date("04-03-2026"), Some(expected));
        assert_eq!(parse_date("04/03/2026"), Some(expected));
        assert_eq!(parse_date(" 2026-03-04 10:15:00 "), Some(expected));
        assert_eq!(parse_date("2026-03-04T10:15:00"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_read_leads_skips_bad_dates() {
        let loaded = read_leads(EXPORT.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.skipped, 1);

        let first = &loaded.records[0];
        assert_eq!(first.state, "Maharashtra");
        assert_eq!(first.capacity_range, "15-62.5");
        assert_eq!(first.sector, "Retail");
        assert_eq!(first.order_value, 125_000.0);

        // Blank cells stay blank and label as Unknown
        let second = &loaded.records[1];
        assert_eq!(second.order_value, 0.0);
        assert_eq!(second.label(Dimension::Location), "Unknown");

        // Negative order values are clamped
        assert_eq!(loaded.records[2].order_value, 0.0);
        assert_eq!(loaded.records[2].state, "Gujarat");
    }

    #[test]
    fn test_load_leads_from_file() {
        let file = export_file(EXPORT);
        let records = load_leads(file.path()).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_load_leads_without_usable_rows() {
        let file = export_file("enquiry_date,state\nsoon,Goa\n");
        let err = load_leads(file.path()).unwrap_err();
        assert!(matches!(err, CliError::EmptyInput(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_leads(Path::new("/nonexistent/leads.csv")).unwrap_err();
        assert!(matches!(err, CliError::Open { .. }));
        assert!(err.to_string().contains("leads.csv"));
    }
}
