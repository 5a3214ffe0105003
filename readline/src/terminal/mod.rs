// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod escape_decoder;
pub mod exit_signal;
pub mod logical_key;
pub mod reader_task;
pub mod resume_detector;
pub mod terminal_config;
pub mod terminal_mode;
pub mod terminal_session;

// Re-export.
pub use escape_decoder::*;
pub use exit_signal::*;
pub use logical_key::*;
pub use reader_task::*;
pub use resume_detector::*;
pub use terminal_config::*;
pub use terminal_mode::*;
pub use terminal_session::*;
