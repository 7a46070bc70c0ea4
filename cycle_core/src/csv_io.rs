//! CSV import and export of cycle events.
//!
//! Columns are `date,phase,pain_level,energy_level,notes`. Dates are
//! `YYYY-MM-DD`; phases accept the same tags as [`TraditionalPhase`]'s
//! `FromStr`. Only `date` and `phase` are required.

use crate::{CycleEvent, Error, Result, TraditionalPhase, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row in the CSV file
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date: String,
    phase: String,
    #[serde(default)]
    pain_level: Option<u8>,
    #[serde(default)]
    energy_level: Option<u8>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<&CycleEvent> for CsvRow {
    fn from(event: &CycleEvent) -> Self {
        CsvRow {
            date: event.date.format(DATE_FORMAT).to_string(),
            phase: event.phase.as_str().to_string(),
            pain_level: event.pain_level.map(u8::from),
            energy_level: event.energy_level.map(u8::from),
            notes: event.notes.clone(),
        }
    }
}

impl CsvRow {
    fn into_event(self, user: &UserId) -> Result<CycleEvent> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| Error::InvalidEvent(format!("bad date '{}': {}", self.date, e)))?;
        let phase: TraditionalPhase = self.phase.parse()?;

        let mut event = CycleEvent::new(user.clone(), date, phase);
        if let Some(pain) = self.pain_level {
            event = event.with_pain(pain)?;
        }
        if let Some(energy) = self.energy_level {
            event = event.with_energy(energy)?;
        }
        if let Some(notes) = self.notes {
            event = event.with_note(notes);
        }
        Ok(event)
    }
}

/// Outcome of a CSV import
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Parsed events in file order
    pub events: Vec<CycleEvent>,
    /// Rows that could not be parsed
    pub skipped: usize,
}

/// Parse events for `user` from a CSV file
///
/// Invalid rows are skipped with a warning and counted in the report; only an
/// unreadable file or a missing header is an error.
pub fn import_csv(path: &Path, user: &UserId) -> Result<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut report = ImportReport::default();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Row 1 is the header
        let line = index + 2;
        match row.map_err(Error::from).and_then(|r| r.into_event(user)) {
            Ok(event) => report.events.push(event),
            Err(e) => {
                tracing::warn!("Skipping row {} of {}: {}", line, path.display(), e);
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Imported {} events from {} ({} skipped)",
        report.events.len(),
        path.display(),
        report.skipped
    );
    Ok(report)
}

/// Write events to a CSV file, replacing any existing file
///
/// The rows are written to a sibling temporary file that is synced and then
/// renamed over `path`, so a failed export never leaves a half-written file.
pub fn export_csv(events: &[CycleEvent], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for event in events {
        writer.serialize(CsvRow::from(event))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;

    tracing::info!("Exported {} events to {}", events.len(), path.display());
    Ok(events.len())
}
