//! Logging capability consumed by the generator.
//!
//! The engine never owns a sink. Callers inject an `Arc<dyn GenerationLog>`;
//! two implementations are provided:
//!
//! - [`StandardLog`] forwards to the `log` facade under a target name
//! - [`MemoryLog`] keeps entries in memory for tests and inspection

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of a log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Verbose => "VERBOSE",
        };
        f.write_str(name)
    }
}

/// Structured "game-style" record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLogRecord {
    pub level: LogLevel,
    /// What the record is about (e.g. a series label).
    pub id: String,
    /// Monotonic counter chosen by the emitter.
    pub sequence: u64,
    /// Machine-readable payload.
    pub payload: String,
    pub message: String,
}

impl std::fmt::Display for GameLogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}#{}] {} ({})",
            self.id, self.sequence, self.message, self.payload
        )
    }
}

/// Leveled logging capability.
///
/// Implementations must be shareable with the generation worker.
pub trait GenerationLog: Send + Sync {
    /// Emit a message at the given level.
    fn log(&self, level: LogLevel, message: &str);

    /// Emit a structured record. Defaults to a formatted [`log`](Self::log).
    fn game(&self, record: &GameLogRecord) {
        self.log(record.level, &record.to_string());
    }

    fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message);
    }
}

/// Forwards to the `log` crate.
#[derive(Clone, Debug)]
pub struct StandardLog {
    target: String,
}

impl StandardLog {
    /// Create a logger emitting under `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Default for StandardLog {
    fn default() -> Self {
        Self::new("tombola_series")
    }
}

impl GenerationLog for StandardLog {
    fn log(&self, level: LogLevel, message: &str) {
        let target = self.target.as_str();
        match level {
            LogLevel::Fatal => log::error!(target: target, "FATAL: {}", message),
            LogLevel::Error => log::error!(target: target, "{}", message),
            LogLevel::Warning => log::warn!(target: target, "{}", message),
            LogLevel::Info => log::info!(target: target, "{}", message),
            LogLevel::Verbose => log::debug!(target: target, "{}", message),
        }
    }
}

/// Records every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(LogLevel, String)>>,
    records: Mutex<Vec<GameLogRecord>>,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all leveled entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Copy of all structured records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<GameLogRecord> {
        self.records.lock().clone()
    }

    /// Messages logged at exactly `level`.
    #[must_use]
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.records.lock().clear();
    }
}

impl GenerationLog for MemoryLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }

    fn game(&self, record: &GameLogRecord) {
        self.records.lock().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_levels() {
        let log = MemoryLog::new();
        log.info("started");
        log.error("guard tripped");
        log.verbose("detail");

        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.messages_at(LogLevel::Error), vec!["guard tripped"]);

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_memory_log_records() {
        let log = MemoryLog::new();
        log.game(&GameLogRecord {
            level: LogLevel::Verbose,
            id: "series".into(),
            sequence: 3,
            payload: "checksum=12".into(),
            message: "accepted".into(),
        });

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, 3);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_record_display() {
        let record = GameLogRecord {
            level: LogLevel::Info,
            id: "S001".into(),
            sequence: 1,
            payload: "x".into(),
            message: "accepted".into(),
        };
        assert_eq!(record.to_string(), "[S001#1] accepted (x)");
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Fatal < LogLevel::Error);
        assert!(LogLevel::Info < LogLevel::Verbose);
        assert_eq!(LogLevel::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_standard_log_does_not_panic_without_logger() {
        let log = StandardLog::default();
        log.fatal("no logger installed");
        log.game(&GameLogRecord {
            level: LogLevel::Verbose,
            id: "x".into(),
            sequence: 0,
            payload: String::new(),
            message: String::new(),
        });
    }
}
