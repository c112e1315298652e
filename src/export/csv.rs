use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::export::table::{Cell, ScheduleTable};

/// write the table as comma-separated text
pub fn write_csv<W: Write>(table: &ScheduleTable, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);

    writer.write_record(table.header())?;
    for line in table.rows() {
        writer.write_record(line.iter().map(Cell::display))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_csv_path(table: &ScheduleTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_csv(table, file)?;
    debug!(path = %path.display(), lines = table.line_count(), "csv written");
    Ok(())
}
