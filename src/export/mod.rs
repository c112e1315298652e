//! Schedule exporters.
//!
//! A [`Schedule`] is first laid out as a [`ScheduleTable`] and then written as
//! an XLSX workbook or CSV text. JSON output goes through
//! [`ScheduleView`](crate::serialization::ScheduleView) instead.

pub mod csv;
pub mod table;
pub mod xlsx;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::amortization::Schedule;
use crate::errors::{FinancingError, Result};
use crate::serialization::ScheduleView;

pub use self::csv::{write_csv, write_csv_path};
pub use table::{Cell, ScheduleTable};
pub use xlsx::{sheet_name, write_xlsx, xlsx_bytes};

/// output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = FinancingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(FinancingError::Export {
                message: format!("unsupported export format: {}", other),
            }),
        }
    }
}

/// write `schedule` to `path` in the given format
pub fn write_schedule(schedule: &Schedule, format: ExportFormat, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match format {
        ExportFormat::Xlsx => write_xlsx(&ScheduleTable::from_schedule(schedule), path)?,
        ExportFormat::Csv => write_csv_path(&ScheduleTable::from_schedule(schedule), path)?,
        ExportFormat::Json => {
            let json = ScheduleView::from_schedule(schedule).to_json_pretty()?;
            std::fs::write(path, json)?;
        }
    }

    info!(
        contract_id = %schedule.contract_id,
        %format,
        path = %path.display(),
        "schedule exported"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::table::tests::sample_schedule;

    #[test]
    fn test_format_parsing() {
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(
            ExportFormat::from_path(Path::new("out/schedule.json")),
            Some(ExportFormat::Json)
        );
        assert_eq!(ExportFormat::from_path(Path::new("schedule")), None);
    }

    #[test]
    fn test_write_schedule_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = sample_schedule();

        for format in [ExportFormat::Xlsx, ExportFormat::Csv, ExportFormat::Json] {
            let path = dir.path().join(format!("schedule.{}", format));
            write_schedule(&schedule, format, &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }

        let json = std::fs::read_to_string(dir.path().join("schedule.json")).unwrap();
        assert!(json.contains("Joana Souza"));
    }
}
