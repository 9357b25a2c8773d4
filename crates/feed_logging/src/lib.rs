#![deny(missing_docs)]
//! Shared logging utilities for the feed filter workspace.
//!
//! This crate provides the `feed_*` logging macros used across the codebase,
//! a thread-local batch context that tags engine log lines with the mutation
//! batch being processed, and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Sequence number of the mutation batch being handled on this thread.
    static BATCH_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Sets the mutation batch sequence number for the current thread.
/// The live filter calls this once per delivered batch; 0 means "initial pass".
pub fn set_batch_seq(seq: u64) {
    BATCH_SEQ.with(|v| v.set(seq));
}

/// Retrieves the mutation batch sequence number for the current thread.
/// Returns 0 if no batch is being handled.
pub fn batch_seq() -> u64 {
    BATCH_SEQ.with(|v| v.get())
}

/// Runs `f` with the batch sequence set to `seq`, restoring the previous value afterwards.
pub fn with_batch_seq<R>(seq: u64, f: impl FnOnce() -> R) -> R {
    let previous = batch_seq();
    set_batch_seq(seq);
    let result = f();
    set_batch_seq(previous);
    result
}

/// Logs a trace-level message tagged with the current batch sequence.
#[macro_export]
macro_rules! feed_trace {
    ($($arg:tt)*) => {{
        log::trace!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current batch sequence.
#[macro_export]
macro_rules! feed_debug {
    ($($arg:tt)*) => {{
        log::debug!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! feed_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! feed_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! feed_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logger configuration shared by the binary and the test logger.
///
/// RFC 3339 timestamps, no thread ids, and the HTML parser crates
/// (`html5ever`, `selectors`) silenced: they log every token at debug level.
pub fn logger_config() -> simplelog::Config {
    simplelog::ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(log::LevelFilter::Off)
        .add_filter_ignore_str("html5ever")
        .add_filter_ignore_str("selectors")
        .build()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode};

    // Trace in debug builds so hide decisions show up in failing test output.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        logger_config(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
