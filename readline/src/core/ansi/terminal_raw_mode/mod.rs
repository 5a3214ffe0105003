// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Terminal raw mode for the session's input stream.
//!
//! **Cooked mode** (the default) buffers input line by line, interprets special keys
//! like `Ctrl+C`, and echoes typed characters. **Raw mode** bypasses the kernel line
//! discipline so that every byte, including every byte of an escape sequence, reaches
//! the reader task as soon as it is typed.
//!
//! The original terminal settings are saved on the first [`enable_raw_mode()`] call and
//! restored by [`disable_raw_mode()`]. Prefer [`RawModeGuard`] so that the terminal is
//! restored even on an early return.
//!
//! On Unix this talks to termios directly via `rustix`. On Windows it delegates to
//! `crossterm`.

// Private modules (hide internal structure).
mod raw_mode_core;

#[cfg(unix)]
mod raw_mode_unix;

#[cfg(windows)]
mod raw_mode_windows;

// Re-export the public API (flat, ergonomic surface).
pub use raw_mode_core::*;
