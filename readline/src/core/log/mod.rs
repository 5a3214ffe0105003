// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Diagnostics for the readline engine go through [`tracing`]. Nothing in this crate
//! installs a subscriber on its own; the application picks a sink with
//! [`TracingConfig`] and then calls [`try_initialize_logging_global()`] (or
//! [`TracingConfig::install_thread_local()`] in tests).

// Attach sources.
pub mod rolling_file_appender_impl;
pub mod tracing_config;
pub mod tracing_init;

// Re-export.
pub use rolling_file_appender_impl::*;
pub use tracing_config::*;
pub use tracing_init::*;

/// Gate for the chatty, per-key trace output of the reader task and the completion
/// engine.
pub const DEBUG_READLINE: bool = false;
