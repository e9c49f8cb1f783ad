use std::fmt;

/// Entries kept in the console before the oldest are dropped.
pub const MAX_LOG_ENTRIES: usize = 200;

/// Severity tag shown next to a user-visible log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
    Detail,
    Action,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Detail => "DETAIL",
            LogLevel::Action => "ACTION",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Monotonic per-state sequence number; lets a renderer print only new lines.
    pub seq: u64,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}
