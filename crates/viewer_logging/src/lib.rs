#![deny(missing_docs)]
//! Shared logging utilities for the viewer workspace.
//!
//! This crate provides the `viewer_*` logging macros used across the codebase,
//! the level selection shared by the binary, and a minimal test initializer
//! for the global logger.

use log::LevelFilter;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! viewer_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! viewer_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! viewer_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! viewer_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! viewer_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Picks the log level for the process.
///
/// `verbose` forces debug output; otherwise debug builds log at debug level
/// and release builds at info level.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose || cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level_for(false),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
