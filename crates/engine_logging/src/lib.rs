#![deny(missing_docs)]
//! Shared logging utilities for the bitrans workspace.
//!
//! This crate provides the `engine_*` logging macros used by the core, the
//! engine and the shell, and a minimal test initializer for the global logger.

/// Log target used for messages about translation jobs.
pub const JOB_TARGET: &str = "bitrans::job";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs a message about a specific job at the given level.
///
/// The job id is prefixed so interleaved output from a superseded job can be
/// told apart from the current one.
#[macro_export]
macro_rules! engine_job {
    ($level:expr, $job_id:expr, $($arg:tt)*) => {{
        log::log!(
            target: $crate::JOB_TARGET,
            $level,
            "[job {}] {}",
            $job_id,
            format_args!($($arg)*)
        );
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
