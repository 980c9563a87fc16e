//! Structured logging
//!
//! Lightweight structured log entries written to stderr with a UTC
//! timestamp. Debug entries are gated behind a global flag so RPC payload
//! dumps stay out of normal runs. Oversized payload fields are truncated
//! before they hit the log.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable debug logging.
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Disable debug logging.
pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One structured log entry.
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the entry.
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Add a field that may carry an arbitrarily large payload (call data,
    /// bytecode). Long values are truncated to their head.
    pub fn payload_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, truncate_payload(&value.to_string())));
        self
    }

    /// Write the entry to stderr.
    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        if fields.is_empty() {
            eprintln!("[{}] {} [{}] {}", timestamp, self.level, self.module, self.message);
        } else {
            eprintln!(
                "[{}] {} [{}] {} | {}",
                timestamp, self.level, self.module, self.message, fields
            );
        }
    }
}

/// Keep the first 18 bytes of a long payload, noting the full length.
fn truncate_payload(value: &str) -> String {
    const KEEP: usize = 18;
    match value.get(..KEEP) {
        Some(head) if value.len() > KEEP => format!("{}..({} chars)", head, value.len()),
        _ => value.to_string(),
    }
}

/// Shorthand constructors.
pub fn debug(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Debug, module, message)
}

pub fn info(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Info, module, message)
}

pub fn warn(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Warn, module, message)
}

pub fn error(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Error, module, message)
}
