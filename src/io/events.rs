use crate::types::{FireEvent, PyroResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read fire event records from a headered CSV file.
///
/// Rows must expose `longitude`, `latitude` and `acq_date` (YYYY-MM-DD)
/// columns; any other columns are ignored. A malformed row is an error:
/// unlike per-event imagery fetches, the input table is a single unit and
/// a bad row means a bad export.
pub fn read_events_csv<P: AsRef<Path>>(path: P) -> PyroResult<Vec<FireEvent>> {
    log::info!("Reading fire events from: {}", path.as_ref().display());
    let file = File::open(path)?;
    read_events(file)
}

/// Read fire event records from any CSV source
pub fn read_events<R: Read>(source: R) -> PyroResult<Vec<FireEvent>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut events = Vec::new();

    for record in reader.deserialize() {
        let event: FireEvent = record?;
        events.push(event);
    }

    log::info!("Loaded {} fire events", events.len());
    Ok(events)
}
