// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words readline SIGTSTP

//! # Introduction
//!
//! `r3bl_readline` is the input side of an interactive line editor. It turns the raw,
//! unbuffered byte stream that a terminal produces in raw mode into a stream of
//! [`LogicalKey`]s, and it layers a modal tab completion engine on top of that.
//!
//! There are two halves to this crate:
//!
//! 1. [`TerminalSession`] owns the raw input stream. A dedicated reader task decodes
//!    multi-byte ANSI/VT escape sequences (CSI `ESC [` and SS3 `ESC O`) into single
//!    logical keys using the [`EscapeDecoder`]. Keys are handed to the caller one at a
//!    time, and the reader only resumes blocking reads when the caller "kicks" it via
//!    [`TerminalSession::kick_read()`]. The session also handles process suspend and
//!    resume ([`TerminalSession::sleep_to_resume()`]) and idempotent shutdown.
//! 2. [`OpCompleter`] is the modal completion engine. It queries an [`AutoComplete`]
//!    provider, auto-accepts singletons, auto-expands unambiguous prefixes, and
//!    otherwise renders a multi-column candidate grid that can be navigated with the
//!    arrow keys. [`PrefixCompleter`] is a tree based provider that supports static
//!    and dynamically generated candidates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  kick (cap 1)   ┌──────────────────────────┐
//! │ caller task  │ ──────────────▶ │ reader task              │
//! │ (dispatcher) │                 │  InputDevice → decoder   │
//! │              │ ◀────────────── │                          │
//! └──────┬───────┘  key rendezvous └──────────────────────────┘
//!        │ trigger key
//!        ▼
//! ┌──────────────┐   do(line, pos)  ┌──────────────────────────┐
//! │ OpCompleter  │ ───────────────▶ │ AutoComplete provider    │
//! │  (modal)     │                  │ (PrefixCompleter, ...)   │
//! └──────────────┘                  └──────────────────────────┘
//! ```
//!
//! The line buffer that stores the text being edited is not part of this crate; the
//! completion engine talks to it through the [`LineBuffer`] trait. [`RuneLineBuffer`]
//! is a minimal in-memory implementation.
//!
//! # Logging
//!
//! All diagnostics go through [`tracing`]. Use [`TracingConfig`] and
//! [`try_initialize_logging_global()`] to route them to a file, to stdout / stderr, or
//! to any [`OutputDevice`].

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod completion;
pub mod core;
pub mod terminal;

// Re-export.
pub use completion::*;
pub use core::*;
pub use terminal::*;
