//! Event persistence.
//!
//! Each user's events are appended to their own JSONL (JSON Lines) file with
//! file locking so that concurrent CLI invocations do not interleave writes.

use crate::{CycleEvent, Result, UserId};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Source and sink of a user's cycle events
pub trait EventStore {
    /// All events for `user`, ascending by date
    fn events_for(&self, user: &UserId) -> Result<Vec<CycleEvent>>;

    fn append(&mut self, event: &CycleEvent) -> Result<()>;

    /// Append several events, stopping at the first failure
    fn append_all(&mut self, events: &[CycleEvent]) -> Result<()> {
        for event in events {
            self.append(event)?;
        }
        Ok(())
    }
}

/// JSONL-backed store, one file per user under `<data_dir>/events/`
pub struct JsonlEventStore {
    root: PathBuf,
}

impl JsonlEventStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("events"),
        }
    }

    /// Path of the event log for `user`
    pub fn path_for(&self, user: &UserId) -> PathBuf {
        // UserId is restricted to [A-Za-z0-9_-], safe as a file name
        self.root.join(format!("{}.jsonl", user.as_str()))
    }
}

impl EventStore for JsonlEventStore {
    fn events_for(&self, user: &UserId) -> Result<Vec<CycleEvent>> {
        let mut events = read_events(&self.path_for(user))?;
        events.retain(|e| &e.user_id == user);
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    fn append(&mut self, event: &CycleEvent) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(&event.user_id))?;

        file.lock_exclusive()?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended event {} for {}", event.id, event.user_id);
        Ok(())
    }
}

/// Read every event in a JSONL log
///
/// A missing file is an empty history. Lines that fail to parse are skipped
/// with a warning rather than failing the whole read.
pub fn read_events(path: &Path) -> Result<Vec<CycleEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<CycleEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!(
                    "Skipping malformed event at {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    e
                );
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} events from {}", events.len(), path.display());
    Ok(events)
}

/// In-memory store for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: HashMap<UserId, Vec<CycleEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryEventStore {
    fn events_for(&self, user: &UserId) -> Result<Vec<CycleEvent>> {
        let mut events = self.events.get(user).cloned().unwrap_or_default();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    fn append(&mut self, event: &CycleEvent) -> Result<()> {
        self.events
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }
}
