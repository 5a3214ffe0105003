// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on error types, see:
//!
//! 1. [Article](https://developerlife.com/2024/06/10/rust-miette-error-handling/)
//! 2. [Video](https://youtu.be/TmLF7vI8lKk)

use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// Type alias to make it easy to work with [`core::result::Result`] when the error type
/// is something other than [`miette::Report`].
pub type CommonResultWithError<T, E> = core::result::Result<T, E>;

/// Type alias for results returned by the terminal session.
pub type ReadlineResult<T> = CommonResultWithError<T, ReadlineError>;

/// Errors returned by [`crate::TerminalSession`] and friends.
///
/// Malformed escape sequences, transient read errors, and "no candidates" from a
/// completion provider are never reported through this type. They are absorbed where
/// they happen.
#[derive(Debug, Error, Diagnostic)]
pub enum ReadlineError {
    /// An internal I/O error occurred.
    #[error(transparent)]
    #[diagnostic(code(r3bl_readline::io))]
    IO(#[from] io::Error),

    /// Entering or leaving raw mode failed.
    #[error("raw mode transition failed: {0}")]
    #[diagnostic(
        code(r3bl_readline::raw_mode),
        help("Is stdin (or /dev/tty) attached to an interactive terminal?")
    )]
    RawMode(String),

    /// The session was already closed when the operation was requested.
    #[error("terminal session closed")]
    #[diagnostic(code(r3bl_readline::closed))]
    SessionClosed,

    /// Registering the exit signal handlers failed.
    #[error("failed to subscribe to exit signals")]
    #[diagnostic(code(r3bl_readline::signal))]
    SignalSubscription(#[source] io::Error),
}

/// Convert a [`miette::Report`] (which is what the raw mode functions return) into a
/// [`ReadlineError::RawMode`].
impl From<miette::Report> for ReadlineError {
    fn from(report: miette::Report) -> Self { ReadlineError::RawMode(format!("{report}")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_converts_to_raw_mode_error() {
        let report = miette::miette!("failed to set terminal attributes");
        let error = ReadlineError::from(report);
        assert!(matches!(error, ReadlineError::RawMode(ref msg) if msg.contains("terminal attributes")));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let error = ReadlineError::from(io::Error::other("boom"));
        assert_eq!(error.to_string(), "boom");
    }
}
