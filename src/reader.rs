use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::classify::LogRecord;
use crate::error::StatsError;

/// Minimum number of fields a row needs: timestamp, client address, message.
pub const MIN_FIELDS: usize = 3;

/// Opens the activity log and yields its rows lazily.
///
/// Rows with fewer than [`MIN_FIELDS`] fields are skipped. Quoted fields may
/// span lines. Invalid UTF-8 is replaced with U+FFFD instead of failing the
/// run. A read error part way through ends the sequence.
pub fn read_rows(path: &Path) -> Result<impl Iterator<Item = Vec<String>>, StatsError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StatsError::MissingInput(path.to_path_buf()),
        _ => StatsError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    info!(action = "open", component = "log_reader", file_path = ?path, "Reading activity log");

    let rows = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file)
        .into_byte_records()
        .map_while(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(action = "read", component = "log_reader", error = %e, "Stopped reading log early");
                None
            }
        })
        .map(|record| {
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect::<Vec<String>>()
        })
        .filter(|fields| fields.len() >= MIN_FIELDS);

    Ok(rows)
}

/// Builds a classified record from a raw row. Fields past the third are ignored.
pub fn parse_record(row: &[String]) -> Option<LogRecord> {
    match row {
        [timestamp, address, message, ..] => {
            Some(LogRecord::new(timestamp, address.trim(), message))
        }
        _ => None,
    }
}

pub fn read_records(path: &Path) -> Result<Vec<LogRecord>, StatsError> {
    let start_time = Instant::now();
    let records: Vec<LogRecord> = read_rows(path)?
        .filter_map(|row| parse_record(&row))
        .collect();

    info!(
        action = "complete",
        component = "log_reader",
        record_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Parsed activity log"
    );
    Ok(records)
}
