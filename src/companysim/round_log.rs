//! Append-only persistence of role memory after each round.
//!
//! After every round the scheduler hands the [`RoundLogger`] one
//! [`MemoryLogRecord`] per role, carrying that role's *full* memory. Records are
//! never replaced or deleted, so the sink doubles as an audit trail from which
//! a run can be replayed.
//!
//! # Disk Format
//!
//! [`JsonlRoundLogger`] writes one JSON record per line:
//!
//! ```text
//! {"round":1,"timestamp":"2025-07-01T12:00:00Z","memories":{"CTO":[{"round":1,"content":"...","timestamp":"...","metadata":{}}]}}
//! ```

use crate::companysim::role::MemoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Role name → that role's full memory, stamped with the round it was taken after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLogRecord {
    pub round: usize,
    pub timestamp: DateTime<Utc>,
    pub memories: BTreeMap<String, Vec<MemoryEntry>>,
}

impl MemoryLogRecord {
    /// Record for a single role.
    pub fn for_role(round: usize, role_name: &str, memory: Vec<MemoryEntry>) -> Self {
        let mut memories = BTreeMap::new();
        memories.insert(role_name.to_string(), memory);
        Self {
            round,
            timestamp: Utc::now(),
            memories,
        }
    }
}

/// Append-only sink for memory records.
pub trait RoundLogger: Send + Sync {
    fn log(&self, record: &MemoryLogRecord) -> io::Result<()>;
}

/// Discards every record.
pub struct NoopRoundLogger;

impl RoundLogger for NoopRoundLogger {
    fn log(&self, _record: &MemoryLogRecord) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps records in memory; handy for tests and for embedding applications that
/// want to inspect a run afterwards.
#[derive(Default)]
pub struct InMemoryRoundLogger {
    records: Mutex<Vec<MemoryLogRecord>>,
}

impl InMemoryRoundLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MemoryLogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl RoundLogger for InMemoryRoundLogger {
    fn log(&self, record: &MemoryLogRecord) -> io::Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "round log lock poisoned"))?;
        records.push(record.clone());
        Ok(())
    }
}

/// Appends records as newline-delimited JSON to a file.
///
/// ```rust,no_run
/// use companysim::round_log::{JsonlRoundLogger, MemoryLogRecord, RoundLogger};
/// use companysim::role::MemoryEntry;
///
/// # fn main() -> std::io::Result<()> {
/// let logger = JsonlRoundLogger::new("logs/run.jsonl")?;
/// logger.log(&MemoryLogRecord::for_role(1, "CTO", vec![MemoryEntry::new(1, "Drafted design")]))?;
///
/// let records = JsonlRoundLogger::read_all(logger.path())?;
/// assert_eq!(records.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct JsonlRoundLogger {
    path: PathBuf,
    // Serializes appends so concurrent callers never interleave lines.
    write_lock: Mutex<()>,
}

impl JsonlRoundLogger {
    /// Create the logger, making the parent directory if needed. An existing
    /// file is appended to, never truncated.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record from a JSONL log, skipping blank lines.
    pub fn read_all(path: &Path) -> io::Result<Vec<MemoryLogRecord>> {
        let reader = BufReader::new(fs::File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Failed to parse memory record: {}", e),
                )
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl RoundLogger for JsonlRoundLogger {
    fn log(&self, record: &MemoryLogRecord) -> io::Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "round log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }
}
