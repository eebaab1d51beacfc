//! Debug logging utilities
//!
//! Provides debug logging that respects the global `--debug` flag (or the
//! `SPLVKIT_DEBUG` environment variable). When debug mode is disabled, all
//! debug logging has zero cost.

use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Initialize debug mode from command-line flag
pub fn init_debug(enabled: bool) {
    if DEBUG_ENABLED.set(enabled).is_err() {
        debug_log("debug mode was already initialized");
    }
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Print a debug message if debug mode is enabled
pub fn debug_log(message: &str) {
    if is_debug_enabled() {
        eprintln!("[DEBUG] {message}");
    }
}

/// Print a one-line warning for a recoverable problem
///
/// Warnings are always shown; they mark work that was skipped rather than
/// aborted.
pub fn warn(args: std::fmt::Arguments<'_>) {
    eprintln!("warning: {args}");
}

/// Macro for convenient debug logging
///
/// Usage: `debug!("message with {}", variable)`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[DEBUG] {}", format_args!($($arg)*));
        }
    };
}

/// Macro for one-line warnings
///
/// Usage: `warning!("skipping {}", path.display())`
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::debug::warn(format_args!($($arg)*))
    };
}
