// Append-only event log - the only diagnostic surface of an unattended kiosk
use chrono::Local;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Serialize)]
struct EventEntry<'a> {
    timestamp: String,
    event: &'a str,
    detail: &'a str,
}

/// JSON-lines journal of state transitions, recovery attempts and health
/// verdicts. Entries are mirrored to `tracing` for interactive runs.
pub struct EventLog {
    file: Mutex<File>,
}

impl EventLog {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// A failed append must never take the rotation loop down; it is
    /// reported on the tracing side and dropped.
    pub fn record(&self, event: &str, detail: &str) {
        tracing::info!(event, detail, "kiosk event");

        let entry = EventEntry {
            timestamp: Local::now().to_rfc3339(),
            event,
            detail,
        };
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize event entry");
                return;
            }
        };
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(error = %e, "could not append event entry");
        }
    }
}
